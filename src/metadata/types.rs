//! Enumeration of the types defined in, and referenced by, a module.
//!
//! [`TypeIterator`] walks the TypeDef table in on-disk order and resolves each row's name and
//! namespace through the `#Strings` heap. Row 1 is the `<Module>` pseudo-type that holds global
//! members; it is never yielded. [`TypeRefIterator`] does the same for the TypeRef table.
//!
//! Both iterators are lazy and borrow the loaded metadata; asking the view for a new iterator
//! starts over from the first row, so repeated walks yield identical sequences.
//!
//! # Example
//!
//! ```rust,no_run
//! use nsscope::AssemblyView;
//! use std::path::Path;
//!
//! let view = AssemblyView::from_file(Path::new("assembly.dll"))?;
//! for decoded in view.types() {
//!     let decoded = decoded?;
//!     println!("{} ({})", decoded.full_name(), decoded.token);
//! }
//! # Ok::<(), nsscope::Error>(())
//! ```

use std::iter::FusedIterator;

use crate::{
    metadata::{
        streams::{Strings, TablesHeader},
        tables::{CodedIndex, MetadataTable, TypeAttributes, TypeDefRaw, TypeRefRaw},
        token::Token,
    },
    Result,
};

/// A type definition with its name and namespace resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedType {
    /// Simple name, e.g. `MyClass`
    pub name: String,
    /// Namespace, empty for global and nested types
    pub namespace: String,
    /// Token of the TypeDef row
    pub token: Token,
    /// The [`TypeAttributes`] of the row
    pub flags: u32,
}

impl DecodedType {
    /// A public, non-nested type without a backing row, for sources other than a TypeDef table
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        DecodedType {
            name: name.into(),
            namespace: namespace.into(),
            token: Token::new(0),
            flags: TypeAttributes::PUBLIC,
        }
    }

    fn from_row(row: &TypeDefRaw, strings: &Strings<'_>) -> Result<Self> {
        Ok(DecodedType {
            name: strings.get(row.type_name as usize)?.to_string(),
            namespace: strings.get(row.type_namespace as usize)?.to_string(),
            token: row.token,
            flags: row.flags,
        })
    }

    /// `namespace.name`, or just the name for an empty namespace
    #[must_use]
    pub fn full_name(&self) -> String {
        full_name(&self.namespace, &self.name)
    }

    /// Returns `true` if the visibility flags mark a nested type
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.flags & TypeAttributes::VISIBILITY_MASK >= TypeAttributes::NESTED_PUBLIC
    }
}

/// A type reference with its name and namespace resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTypeRef {
    /// Simple name
    pub name: String,
    /// Namespace, may be empty
    pub namespace: String,
    /// Token of the TypeRef row
    pub token: Token,
    /// Where the referenced type lives
    pub resolution_scope: CodedIndex,
}

impl DecodedTypeRef {
    fn from_row(row: &TypeRefRaw, strings: &Strings<'_>) -> Result<Self> {
        Ok(DecodedTypeRef {
            name: strings.get(row.type_name as usize)?.to_string(),
            namespace: strings.get(row.type_namespace as usize)?.to_string(),
            token: row.token,
            resolution_scope: row.resolution_scope.clone(),
        })
    }

    /// `namespace.name`, or just the name for an empty namespace
    #[must_use]
    pub fn full_name(&self) -> String {
        full_name(&self.namespace, &self.name)
    }
}

fn full_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// Anything that can enumerate the types of a module.
///
/// [`crate::AssemblyView`] is the built-in implementation; a slice of [`DecodedType`] is another,
/// which lets filtering and tallying run on data that did not come from a PE image.
pub trait TypeSource {
    /// The iterator returned by [`TypeSource::types`]
    type Types<'a>: Iterator<Item = Result<DecodedType>>
    where
        Self: 'a;

    /// Iterate over the defined types in declaration order, without `<Module>`
    fn types(&self) -> Self::Types<'_>;
}

type CloneType = fn(&DecodedType) -> Result<DecodedType>;

impl TypeSource for [DecodedType] {
    type Types<'a> = std::iter::Map<std::slice::Iter<'a, DecodedType>, CloneType>;

    fn types(&self) -> Self::Types<'_> {
        let clone: CloneType = |decoded| Ok(decoded.clone());
        self.iter().map(clone)
    }
}

/// Lazy iterator over the TypeDef rows after `<Module>`
pub struct TypeIterator<'a> {
    table: Option<&'a MetadataTable<'a, TypeDefRaw>>,
    strings: Strings<'a>,
    next_rid: u32,
}

impl<'a> TypeIterator<'a> {
    /// Start at the first TypeDef row after `<Module>`. A stream without a TypeDef table yields
    /// nothing.
    #[must_use]
    pub fn new(tables: &'a TablesHeader<'a>, strings: Strings<'a>) -> Self {
        TypeIterator {
            table: tables.table::<TypeDefRaw>(),
            strings,
            next_rid: 2,
        }
    }

    fn remaining(&self) -> usize {
        self.table.map_or(0, |table| {
            table.row_count().saturating_add(1).saturating_sub(self.next_rid) as usize
        })
    }
}

impl Iterator for TypeIterator<'_> {
    type Item = Result<DecodedType>;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table?;
        if self.next_rid > table.row_count() {
            return None;
        }

        let rid = self.next_rid;
        self.next_rid += 1;

        let decoded = table
            .try_get(rid)
            .and_then(|row| DecodedType::from_row(&row, &self.strings));
        if let Ok(decoded) = &decoded {
            log::trace!("TypeDef {}: {}", decoded.token, decoded.full_name());
        }

        Some(decoded)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TypeIterator<'_> {}

impl FusedIterator for TypeIterator<'_> {}

/// Lazy iterator over all TypeRef rows
pub struct TypeRefIterator<'a> {
    table: Option<&'a MetadataTable<'a, TypeRefRaw>>,
    strings: Strings<'a>,
    next_rid: u32,
}

impl<'a> TypeRefIterator<'a> {
    /// Start at TypeRef row 1
    #[must_use]
    pub fn new(tables: &'a TablesHeader<'a>, strings: Strings<'a>) -> Self {
        TypeRefIterator {
            table: tables.table::<TypeRefRaw>(),
            strings,
            next_rid: 1,
        }
    }
}

impl Iterator for TypeRefIterator<'_> {
    type Item = Result<DecodedTypeRef>;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table?;
        if self.next_rid > table.row_count() {
            return None;
        }

        let rid = self.next_rid;
        self.next_rid += 1;

        Some(
            table
                .try_get(rid)
                .and_then(|row| DecodedTypeRef::from_row(&row, &self.strings)),
        )
    }
}

impl FusedIterator for TypeRefIterator<'_> {}
