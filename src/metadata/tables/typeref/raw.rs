use crate::metadata::{tables::CodedIndex, token::Token};

/// A row of the TypeRef table with unresolved indices
#[derive(Clone, Debug)]
pub struct TypeRefRaw {
    /// Row ID, 1-based
    pub rid: u32,
    /// Metadata token, `0x01000000 | rid`
    pub token: Token,
    /// Byte offset of the row within the table
    pub offset: usize,
    /// Where the type is defined; a null index means an exported type lookup
    pub resolution_scope: CodedIndex,
    /// `#Strings` index of the simple name
    pub type_name: u32,
    /// `#Strings` index of the namespace
    pub type_namespace: u32,
}
