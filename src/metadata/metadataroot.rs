//! Locating and binding the metadata streams of a loaded image.
//!
//! [`MetadataRoot::read`] follows the CLR runtime directory of a [`File`] to the CLI header,
//! from there to the metadata block, parses the [`Root`] header and binds every known stream to
//! its view type. The result borrows from the image and is immutable.
//!
//! # Example
//!
//! ```rust,no_run
//! use nsscope::{metadata::metadataroot::MetadataRoot, File};
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("assembly.dll"))?;
//! let metadata = MetadataRoot::read(&file)?;
//! println!("runtime {}", metadata.version());
//! println!("module name: {}", metadata.strings().get(1)?);
//! # Ok::<(), nsscope::Error>(())
//! ```

use crate::{
    file::File,
    metadata::{
        cor20header::{Cor20Header, COR20_HEADER_SIZE},
        root::Root,
        streams::{Blob, Guid, StreamHeader, Strings, UserStrings},
    },
    Error::OutOfBounds,
    Result,
};

/// The metadata root of an image with its streams bound to views
#[derive(Debug)]
pub struct MetadataRoot<'a> {
    /// The CLI header
    pub cor20header: Cor20Header,
    /// The metadata root header and stream directory
    pub root: Root,
    /// The metadata block, as declared by the CLI header
    data: &'a [u8],
    tables: &'a [u8],
    tables_uncompressed: bool,
    strings: Strings<'a>,
    userstrings: Option<UserStrings<'a>>,
    guids: Option<Guid<'a>>,
    blobs: Option<Blob<'a>>,
}

impl<'a> MetadataRoot<'a> {
    /// Locate the metadata of `file` and bind its streams.
    ///
    /// The first stream of each name wins; later duplicates and unknown names are logged and
    /// ignored. `#~` and `#-` both count as the tables stream. `#US`, `#GUID` and `#Blob` are
    /// optional, and a heap of those kinds that fails its basic checks is dropped with a warning.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedImage`] if the CLI header is invalid or an RVA is not
    /// mapped by any section, and [`crate::Error::MalformedMetadata`] if the image ends before
    /// the declared metadata, the root header is invalid, or the tables stream or `#Strings`
    /// heap is missing.
    pub fn read(file: &'a File) -> Result<MetadataRoot<'a>> {
        let (clr_rva, _) = file.clr();
        let clr_offset = file.rva_to_offset(clr_rva)?;
        let clr_slice = file
            .data_slice(clr_offset, COR20_HEADER_SIZE)
            .map_err(|_| {
                malformed_error!("Image ends inside the CLI header at offset {}", clr_offset)
            })?;
        let cor20header = Cor20Header::read(clr_slice)?;

        let metadata_offset = file.rva_to_offset(cor20header.meta_data_rva as usize)?;
        let data = file
            .data_slice(metadata_offset, cor20header.meta_data_size as usize)
            .map_err(|_| {
                malformed_error!(
                    "Image of {} bytes ends before the metadata at {} with {} bytes",
                    file.len(),
                    metadata_offset,
                    cor20header.meta_data_size
                )
            })?;

        let root = Root::read(data).map_err(|error| match error {
            OutOfBounds => malformed_error!("Metadata root is truncated"),
            other => other,
        })?;

        log::debug!(
            "Metadata root '{}' at offset {} with {} streams",
            root.version,
            metadata_offset,
            root.stream_headers.len()
        );

        let mut tables = None;
        let mut strings = None;
        let mut userstrings = None;
        let mut guids = None;
        let mut blobs = None;

        for stream in &root.stream_headers {
            // Root::read verified the range
            let start = stream.offset as usize;
            let stream_data = &data[start..start + stream.size as usize];

            log::debug!(
                "Stream '{}' at {} with {} bytes",
                stream.name,
                stream.offset,
                stream.size
            );

            let slot = match stream.name.as_str() {
                "#~" | "#-" => bind(&mut tables, stream, (stream_data, stream.name == "#-")),
                "#Strings" => bind(&mut strings, stream, stream_data),
                "#US" => bind(&mut userstrings, stream, stream_data),
                "#GUID" => bind(&mut guids, stream, stream_data),
                "#Blob" => bind(&mut blobs, stream, stream_data),
                _ => {
                    log::warn!("Ignoring unknown stream '{}'", stream.name);
                    continue;
                }
            };

            if !slot {
                log::warn!("Ignoring duplicate stream '{}'", stream.name);
            }
        }

        let Some((tables, tables_uncompressed)) = tables else {
            return Err(malformed_error!("Metadata has no tables stream"));
        };
        let Some(strings) = strings else {
            return Err(malformed_error!("Metadata has no #Strings heap"));
        };

        Ok(MetadataRoot {
            cor20header,
            root,
            data,
            tables,
            tables_uncompressed,
            strings: Strings::from(strings)?,
            userstrings: optional_heap(userstrings, "#US", UserStrings::from),
            guids: optional_heap(guids, "#GUID", Guid::from),
            blobs: optional_heap(blobs, "#Blob", Blob::from),
        })
    }

    /// The complete metadata block
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The bytes of the tables stream
    #[must_use]
    pub fn tables_data(&self) -> &'a [u8] {
        self.tables
    }

    /// Returns `true` if the tables stream is the uncompressed `#-` kind
    #[must_use]
    pub fn is_uncompressed(&self) -> bool {
        self.tables_uncompressed
    }

    /// The runtime version string of the metadata root
    #[must_use]
    pub fn version(&self) -> &str {
        &self.root.version
    }

    /// The `#Strings` heap
    #[must_use]
    pub fn strings(&self) -> Strings<'a> {
        self.strings
    }

    /// The `#US` heap, if present
    #[must_use]
    pub fn userstrings(&self) -> Option<UserStrings<'a>> {
        self.userstrings
    }

    /// The `#GUID` heap, if present
    #[must_use]
    pub fn guids(&self) -> Option<Guid<'a>> {
        self.guids
    }

    /// The `#Blob` heap, if present
    #[must_use]
    pub fn blobs(&self) -> Option<Blob<'a>> {
        self.blobs
    }

    /// The first stream header called `name`
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader> {
        self.root
            .stream_headers
            .iter()
            .find(|stream| stream.name == name)
    }
}

/// Fill `slot` unless an earlier stream already did; `false` for a duplicate
fn bind<T>(slot: &mut Option<T>, stream: &StreamHeader, value: T) -> bool {
    if slot.is_some() {
        log::debug!("Stream '{}' at {} is a duplicate", stream.name, stream.offset);
        return false;
    }

    *slot = Some(value);
    true
}

fn optional_heap<'a, T>(
    data: Option<&'a [u8]>,
    name: &str,
    create: impl FnOnce(&'a [u8]) -> Result<T>,
) -> Option<T> {
    match create(data?) {
        Ok(heap) => Some(heap),
        Err(error) => {
            log::warn!("Ignoring invalid {} heap - {}", name, error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test::factories::image::{ImageBuilder, METADATA_OFFSET},
        Error,
    };

    fn load(image: Vec<u8>) -> File {
        File::from_mem(image).unwrap()
    }

    #[test]
    fn crafted() {
        let file = load(ImageBuilder::new().with_type("Foo.Bar", "MyClass").build());
        let metadata = MetadataRoot::read(&file).unwrap();

        assert_eq!(metadata.cor20header.cb, 72);
        assert_eq!(metadata.version(), "v4.0.30319");
        assert_eq!(metadata.root.stream_headers.len(), 5);
        assert!(!metadata.is_uncompressed());
        assert_eq!(metadata.strings().get(0).unwrap(), "");
        assert_eq!(metadata.strings().get(1).unwrap(), "Sample.dll");
        assert!(metadata.userstrings().is_some());
        assert!(metadata.blobs().is_some());
        assert_eq!(metadata.guids().unwrap().count(), 1);
        assert_eq!(metadata.tables_data()[4], 2);
        assert_eq!(
            metadata.stream("#Strings").map(|stream| stream.name.as_str()),
            Some("#Strings")
        );
        assert!(metadata.stream("#Pdb").is_none());
    }

    #[test]
    fn uncompressed_tables() {
        let file = load(ImageBuilder::new().with_uncompressed_tables().build());
        let metadata = MetadataRoot::read(&file).unwrap();

        assert!(metadata.is_uncompressed());
    }

    #[test]
    fn missing_streams() {
        let file = load(ImageBuilder::new().without_tables_stream().build());
        assert!(matches!(
            MetadataRoot::read(&file),
            Err(Error::MalformedMetadata { .. })
        ));

        let file = load(ImageBuilder::new().without_strings_heap().build());
        assert!(matches!(
            MetadataRoot::read(&file),
            Err(Error::MalformedMetadata { .. })
        ));
    }

    #[test]
    fn bad_signature() {
        let file = load(ImageBuilder::new().with_metadata_signature(0x4A42_5342).build());
        assert!(matches!(
            MetadataRoot::read(&file),
            Err(Error::MalformedMetadata { .. })
        ));
    }

    #[test]
    fn bad_cli_header() {
        let mut image = ImageBuilder::new().build();
        image[METADATA_OFFSET - 72] = 0x40;

        let file = load(image);
        assert!(matches!(
            MetadataRoot::read(&file),
            Err(Error::MalformedImage { .. })
        ));
    }

    #[test]
    fn duplicate_stream_first_wins() {
        let image = ImageBuilder::new().with_type("A", "B").build();
        let file = load(image.clone());
        let metadata = MetadataRoot::read(&file).unwrap();
        let first = metadata.root.stream_headers[0].clone();
        let second = metadata.root.stream_headers[1].clone();
        assert_eq!(first.name, "#~");
        assert_eq!(second.name, "#Strings");

        // rename '#US' (third header) to '#~', pointing at the user string heap
        let mut image = image;
        let mut header_offset = METADATA_OFFSET + 32;
        for stream in &metadata.root.stream_headers[..2] {
            header_offset += stream.entry_size();
        }
        assert_eq!(&image[header_offset + 8..header_offset + 11], b"#US");
        image[header_offset + 8..header_offset + 12].copy_from_slice(b"#~\0\0");

        let file = load(image);
        let metadata = MetadataRoot::read(&file).unwrap();
        assert_eq!(metadata.tables_data().len(), first.size as usize);
        assert!(metadata.userstrings().is_none());
    }
}
