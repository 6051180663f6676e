//! User String Heap (`#US`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#US` heap, which stores the string literals used by `ldstr`
//! in UTF-16 encoding. Each entry carries a compressed length prefix, the UTF-16 code units and a
//! single trailing flag byte.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, Result};

use widestring::U16String;

/// The `#US` heap, indexed by byte offset.
#[derive(Debug, Clone, Copy)]
pub struct UserStrings<'a> {
    data: &'a [u8],
}

impl<'a> UserStrings<'a> {
    /// Create a `UserStrings` view over the heap bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedMetadata`] if the heap is empty or does not start with
    /// the empty entry.
    pub fn from(data: &'a [u8]) -> Result<UserStrings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #US heap"));
        }

        Ok(UserStrings { data })
    }

    /// Get the string literal at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRangeIndex`] if `index` is outside the heap and
    /// [`crate::Error::MalformedMetadata`] if the entry is truncated.
    pub fn get(&self, index: usize) -> Result<U16String> {
        if index >= self.data.len() {
            return Err(out_of_range_error!(
                "#US index {} outside of heap with {} bytes",
                index,
                self.data.len()
            ));
        }

        let mut parser = Parser::new(&self.data[index..]);
        let bytes = parser
            .read_compressed_uint()
            .and_then(|len| parser.read_bytes(len as usize))
            .map_err(|_| malformed_error!("Invalid user string at index - {}", index))?;

        // The odd trailing byte flags strings that need special handling, it is not content
        let units = bytes[..bytes.len() & !1]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect::<Vec<u16>>();

        Ok(U16String::from_vec(units))
    }
}
