//! String Heap (`#Strings`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#Strings` heap, which stores identifier strings in UTF-8
//! encoding. Type names, namespaces and module names of the metadata tables are offsets into it.
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::{ffi::CStr, str};

use crate::Result;

/// '#Strings' holds the identifiers referenced from the metadata tables: type names, namespaces,
/// member names and the module name.
///
/// Offset 0 is always the empty string. Every other offset may point anywhere inside the heap,
/// including into the middle of another string (compilers share suffixes that way).
///
/// # Examples
///
/// ```rust
/// use nsscope::Strings;
/// let data = &[0u8, b'H', b'e', b'l', b'l', b'o', 0u8];
/// let strings = Strings::from(data)?;
/// assert_eq!(strings.get(0)?, "");
/// assert_eq!(strings.get(1)?, "Hello");
/// assert_eq!(strings.get(3)?, "llo");
/// # Ok::<(), nsscope::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Create a `Strings` object from a sequence of bytes
    ///
    /// # Arguments
    /// * 'data'    - The byte slice from which this object shall be created
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedMetadata`] if the heap is empty or does not start with
    /// a NUL byte.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!(
                "#Strings heap must start with an empty string"
            ));
        }

        Ok(Strings { data })
    }

    /// Get the string at `index`
    ///
    /// # Arguments
    /// * 'index'   - The offset within the heap, as found in a table column
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRangeIndex`] if `index` is at or past the end of the heap and
    /// [`crate::Error::MalformedMetadata`] if the string is unterminated or not valid UTF-8.
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(out_of_range_error!(
                "#Strings index {} outside of heap with {} bytes",
                index,
                self.data.len()
            ));
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => match result.to_str() {
                Ok(result) => Ok(result),
                Err(_) => Err(malformed_error!("Invalid UTF-8 string at index - {}", index)),
            },
            Err(_) => Err(malformed_error!("Unterminated string at index - {}", index)),
        }
    }

    /// Returns `true` if `index` lies inside the heap
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index < self.data.len()
    }

    /// Size of the heap in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Never true for a constructed heap, which holds at least the empty string
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[rustfmt::skip]
    const HEAP: [u8; 61] = [
        0x00,
        0x3c, 0x4d, 0x61, 0x69, 0x6e, 0x3e, 0x24, 0x00,
        0x43, 0x5f, 0x53, 0x68, 0x61, 0x72, 0x70, 0x5f, 0x50, 0x4f, 0x43, 0x5f, 0x31, 0x00,
        0x3c, 0x4d, 0x6f, 0x64, 0x75, 0x6c, 0x65, 0x3e, 0x00,
        0x53, 0x79, 0x73, 0x74, 0x65, 0x6d, 0x2e, 0x43, 0x6f, 0x6e, 0x73, 0x6f, 0x6c, 0x65, 0x00,
        0x57, 0x72, 0x69, 0x74, 0x65, 0x4c, 0x69, 0x6e, 0x65, 0x00,
        0x46, 0x6f, 0x6f, 0x00,
    ];

    #[test]
    fn crafted() {
        let str_view = Strings::from(&HEAP).unwrap();

        assert_eq!(str_view.get(0).unwrap(), "");
        assert_eq!(str_view.get(1).unwrap(), "<Main>$");
        assert_eq!(str_view.get(9).unwrap(), "C_Sharp_POC_1");
        assert_eq!(str_view.get(23).unwrap(), "<Module>");
        assert_eq!(str_view.get(32).unwrap(), "System.Console");
        assert_eq!(str_view.get(39).unwrap(), "Console");
        assert_eq!(str_view.get(57).unwrap(), "Foo");
    }

    #[test]
    fn index_limits() {
        let str_view = Strings::from(&HEAP).unwrap();

        assert_eq!(str_view.get(60).unwrap(), "");
        assert!(str_view.contains(60));
        assert!(!str_view.contains(61));
        assert!(matches!(str_view.get(61), Err(Error::OutOfRangeIndex { .. })));
        assert!(matches!(
            str_view.get(usize::MAX),
            Err(Error::OutOfRangeIndex { .. })
        ));
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            Strings::from(&[]),
            Err(Error::MalformedMetadata { .. })
        ));
        assert!(matches!(
            Strings::from(&[b'A', 0x00]),
            Err(Error::MalformedMetadata { .. })
        ));

        let str_view = Strings::from(&[0x00, b'A', b'B']).unwrap();
        assert!(matches!(str_view.get(1), Err(Error::MalformedMetadata { .. })));

        let str_view = Strings::from(&[0x00, 0xFF, 0xFE, 0x00]).unwrap();
        assert!(matches!(str_view.get(1), Err(Error::MalformedMetadata { .. })));
    }
}
