//! Raw TypeDef rows.

use crate::metadata::{
    tables::{typedef::TypeAttributes, CodedIndex},
    token::Token,
};

/// A row of the TypeDef table with unresolved heap and table indices
#[derive(Clone, Debug)]
pub struct TypeDefRaw {
    /// Row ID, 1-based
    pub rid: u32,
    /// Metadata token, `0x02000000 | rid`
    pub token: Token,
    /// Byte offset of the row within the table
    pub offset: usize,
    /// [`TypeAttributes`] bitmask
    pub flags: u32,
    /// `#Strings` index of the simple name
    pub type_name: u32,
    /// `#Strings` index of the namespace, 0 for none
    pub type_namespace: u32,
    /// Base type, a null index for `System.Object`, interfaces and `<Module>`
    pub extends: CodedIndex,
    /// First row of this type's fields in the Field (or FieldPtr) table
    pub field_list: u32,
    /// First row of this type's methods in the MethodDef (or MethodPtr) table
    pub method_list: u32,
}

impl TypeDefRaw {
    /// Returns `true` if the visibility bits mark this as a nested type
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.flags & TypeAttributes::VISIBILITY_MASK >= TypeAttributes::NESTED_PUBLIC
    }

    /// Returns `true` for an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags & TypeAttributes::CLASS_SEMANTICS_MASK == TypeAttributes::INTERFACE
    }
}
