use crate::metadata::token::Token;

/// The single row of the Module table, with unresolved heap indices
#[derive(Clone, Debug)]
pub struct ModuleRaw {
    /// Row ID, always 1
    pub rid: u32,
    /// Metadata token, `0x00000001`
    pub token: Token,
    /// Byte offset of the row within the table
    pub offset: usize,
    /// Reserved, always 0
    pub generation: u32,
    /// `#Strings` index of the module name
    pub name: u32,
    /// `#GUID` index of the module version identifier
    pub mvid: u32,
    /// `#GUID` index for edit-and-continue, 0 when unused
    pub encid: u32,
    /// `#GUID` index of the edit-and-continue base, 0 when unused
    pub encbaseid: u32,
}
