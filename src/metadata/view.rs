//! The assembly reader facade.
//!
//! [`AssemblyView`] owns a loaded image and every structure derived from it. Loading runs all
//! stages eagerly: PE container, metadata root and streams, tables stream, row validation. Once
//! constructed, every accessor is infallible except for heap lookups of individual rows.
//!
//! # Examples
//!
//! ```rust,no_run
//! use nsscope::AssemblyView;
//! use std::path::Path;
//!
//! let view = AssemblyView::from_file(Path::new("assembly.dll"))?;
//! println!("module {} on runtime {}", view.module_name()?, view.root().version);
//!
//! for decoded in view.types() {
//!     let decoded = decoded?;
//!     println!("{}", decoded.full_name());
//! }
//! # Ok::<(), nsscope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`AssemblyView`] is [`Send`] and [`Sync`]; all data is immutable after loading, so one view
//! can serve concurrent readers without locking.

use std::{path::Path, sync::Arc};

use ouroboros::self_referencing;

use crate::{
    file::File,
    metadata::{
        cor20header::Cor20Header,
        metadataroot::MetadataRoot,
        root::Root,
        streams::{Blob, Guid, Strings, TablesHeader, UserStrings},
        tables::{ModuleRaw, TableId},
        types::{TypeIterator, TypeRefIterator, TypeSource},
    },
    Result,
};

/// The structures derived from one image, borrowing from it
pub struct AssemblyViewData<'a> {
    /// The CLI header, metadata root and heap views
    pub metadata: MetadataRoot<'a>,
    /// The decoded tables stream
    pub tables: TablesHeader<'a>,
}

impl<'a> AssemblyViewData<'a> {
    /// Run every loading stage over `file`.
    ///
    /// # Errors
    /// Returns the error of the first stage that fails.
    pub fn from_file(file: &'a File) -> Result<Self> {
        let metadata = MetadataRoot::read(file)?;
        let tables = TablesHeader::from(metadata.tables_data())?;
        tables.validate_rows(&metadata.strings(), metadata.guids().as_ref())?;

        log::debug!(
            "Loaded metadata: {} tables, {} TypeDef rows",
            tables.table_count(),
            tables.table_rows(TableId::TypeDef)
        );

        Ok(AssemblyViewData { metadata, tables })
    }
}

#[self_referencing]
/// A loaded, validated .NET assembly.
///
/// Holds the image (memory-mapped or owned) together with the views into it. Types are decoded
/// lazily on every call to [`AssemblyView::types`].
pub struct AssemblyView {
    /// Holds the input data, either as memory buffer or memory-mapped file
    file: Arc<File>,

    #[borrows(file)]
    #[not_covariant]
    /// Holds direct references to metadata structures in the file
    data: AssemblyViewData<'this>,
}

impl AssemblyView {
    /// Load and validate the assembly at `path`. The file is memory-mapped.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened,
    /// [`crate::Error::Empty`] for an empty file, and the malformed kinds of
    /// [`crate::Error`] for invalid content.
    pub fn from_file(path: &Path) -> Result<Self> {
        let input = Arc::new(File::from_file(path)?);
        Self::load(input)
    }

    /// Load and validate an assembly from a memory buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer and the malformed kinds of
    /// [`crate::Error`] for invalid content.
    pub fn from_mem(data: Vec<u8>) -> Result<Self> {
        let input = Arc::new(File::from_mem(data)?);
        Self::load(input)
    }

    fn load(file: Arc<File>) -> Result<Self> {
        AssemblyView::try_new(file, |file| AssemblyViewData::from_file(file))
    }

    /// The underlying PE image
    #[must_use]
    pub fn file(&self) -> &Arc<File> {
        self.borrow_file()
    }

    /// The CLI header
    #[must_use]
    pub fn cor20header(&self) -> &Cor20Header {
        self.with_data(|data| &data.metadata.cor20header)
    }

    /// The metadata root header with its stream directory
    #[must_use]
    pub fn root(&self) -> &Root {
        self.with_data(|data| &data.metadata.root)
    }

    /// The metadata root with its bound streams
    #[must_use]
    pub fn metadata(&self) -> &MetadataRoot<'_> {
        self.with_data(|data| &data.metadata)
    }

    /// The tables stream
    #[must_use]
    pub fn tables(&self) -> &TablesHeader<'_> {
        self.with_data(|data| &data.tables)
    }

    /// The `#Strings` heap
    #[must_use]
    pub fn strings(&self) -> Strings<'_> {
        self.with_data(|data| data.metadata.strings())
    }

    /// The `#US` heap, if present
    #[must_use]
    pub fn userstrings(&self) -> Option<UserStrings<'_>> {
        self.with_data(|data| data.metadata.userstrings())
    }

    /// The `#GUID` heap, if present
    #[must_use]
    pub fn guids(&self) -> Option<Guid<'_>> {
        self.with_data(|data| data.metadata.guids())
    }

    /// The `#Blob` heap, if present
    #[must_use]
    pub fn blobs(&self) -> Option<Blob<'_>> {
        self.with_data(|data| data.metadata.blobs())
    }

    /// Iterate over the defined types, without `<Module>`, in table order
    #[must_use]
    pub fn types(&self) -> TypeIterator<'_> {
        self.with_data(|data| TypeIterator::new(&data.tables, data.metadata.strings()))
    }

    /// Iterate over the type references in table order
    #[must_use]
    pub fn type_refs(&self) -> TypeRefIterator<'_> {
        self.with_data(|data| TypeRefIterator::new(&data.tables, data.metadata.strings()))
    }

    /// The name of the module, from the single Module row.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedMetadata`] if the Module table is empty or the name
    /// cannot be decoded.
    pub fn module_name(&self) -> Result<&str> {
        self.with_data(|data| {
            let Some(module) = module_row(&data.tables) else {
                return Err(malformed_error!("Metadata has no Module row"));
            };

            data.metadata.strings().get(module.name as usize)
        })
    }
}

fn module_row<'a>(tables: &'a TablesHeader<'a>) -> Option<ModuleRaw> {
    tables.table::<ModuleRaw>().and_then(|table| table.get(1))
}

impl TypeSource for AssemblyView {
    type Types<'a> = TypeIterator<'a>;

    fn types(&self) -> Self::Types<'_> {
        AssemblyView::types(self)
    }
}
