//! Metadata tokens.
//!
//! A token names one row of one table: the high byte is the [`TableId`], the low 24 bits the
//! 1-based row. Decoded types carry the token of the row they came from, so callers can refer
//! back to it (`0x02000002` is the first type after `<Module>`).

use std::fmt;

use crate::{metadata::tables::TableId, Result};

/// A metadata token, `table << 24 | row`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table number (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The table this token points into.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedMetadata`] if the high byte names no known table.
    pub fn table_id(&self) -> Result<TableId> {
        TableId::try_from(self.table())
    }

    /// The 1-based row (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if the row part is 0, i.e. the token references nothing
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row() == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
