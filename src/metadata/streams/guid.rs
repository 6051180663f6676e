//! GUID Heap (`#GUID`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#GUID` heap, a plain array of 128-bit GUIDs. Table columns
//! index it 1-based; index 0 means "no GUID".
//!
//! # Reference
//! - [ECMA-335 II.24.2.5](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::Result;

const GUID_SIZE: usize = 16;

/// '#GUID' is a heap, which contains a sequence of 128-bit GUIDs
///
/// # Examples
///
/// ```rust
/// use nsscope::Guid;
/// let data = [0xAA_u8; 32];
/// let guids = Guid::from(&data)?;
/// assert_eq!(guids.count(), 2);
/// assert_eq!(guids.get(2)?.to_bytes(), [0xAA; 16]);
/// # Ok::<(), nsscope::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Guid<'a> {
    data: &'a [u8],
}

impl<'a> Guid<'a> {
    /// Create a `Guid` view over the heap bytes. Trailing bytes that do not form a complete GUID
    /// are ignored.
    ///
    /// # Errors
    /// Currently infallible, kept fallible like the other heap constructors.
    pub fn from(data: &'a [u8]) -> Result<Guid<'a>> {
        if data.len() % GUID_SIZE != 0 {
            log::warn!(
                "#GUID heap size {} is not a multiple of {}",
                data.len(),
                GUID_SIZE
            );
        }

        Ok(Guid { data })
    }

    /// Number of complete GUIDs in the heap
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.len() / GUID_SIZE
    }

    /// Returns `true` if `index` is 0 or names a GUID of this heap
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index <= self.count()
    }

    /// Get the GUID at the 1-based `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRangeIndex`] if `index` is 0 or past the last GUID.
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        if index < 1 || index > self.count() {
            return Err(out_of_range_error!(
                "#GUID index {} outside of heap with {} entries",
                index,
                self.count()
            ));
        }

        let offset_start = (index - 1) * GUID_SIZE;

        let mut buffer = [0u8; GUID_SIZE];
        buffer.copy_from_slice(&self.data[offset_start..offset_start + GUID_SIZE]);

        Ok(uguid::Guid::from_bytes(buffer))
    }
}
