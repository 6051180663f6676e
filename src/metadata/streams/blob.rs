//! Blob Heap (`#Blob`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#Blob` heap, which stores binary data such as signatures and
//! custom attribute values. Every entry is prefixed with its length as a compressed unsigned
//! integer.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, Result};

/// The `#Blob` heap, indexed by byte offset.
///
/// # Examples
///
/// ```rust
/// use nsscope::Blob;
/// let data = &[0x00, 0x03, 0x20, 0x00, 0x01];
/// let blob = Blob::from(data)?;
/// assert_eq!(blob.get(1)?, &[0x20, 0x00, 0x01]);
/// # Ok::<(), nsscope::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Create a `Blob` view over the heap bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedMetadata`] if the heap is empty or does not start with the
    /// empty blob.
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Get the blob at `index`, without its length prefix.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRangeIndex`] if `index` is outside the heap and
    /// [`crate::Error::MalformedMetadata`] if the length prefix is invalid or the blob runs past
    /// the end of the heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        let (skip, len) = self.entry_at(index)?;

        // entry_at verified that the blob fits into the heap
        let data_start = index + skip;
        Ok(&self.data[data_start..data_start + len])
    }

    /// Size of the heap in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Never true for a constructed heap
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over every blob in heap order, yielding `(offset, data)`.
    #[must_use]
    pub fn iter(&self) -> BlobIterator<'a> {
        BlobIterator {
            blob: *self,
            position: 1,
        }
    }

    /// Length of the prefix and length of the payload at `index`
    fn entry_at(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.data.len() {
            return Err(out_of_range_error!(
                "#Blob index {} outside of heap with {} bytes",
                index,
                self.data.len()
            ));
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser
            .read_compressed_uint()
            .map_err(|_| malformed_error!("Invalid blob length at index - {}", index))?
            as usize;
        let skip = parser.pos();

        match index.checked_add(skip).and_then(|start| start.checked_add(len)) {
            Some(end) if end <= self.data.len() => Ok((skip, len)),
            _ => Err(malformed_error!(
                "Blob at index {} with length {} exceeds the heap",
                index,
                len
            )),
        }
    }
}

impl<'a> IntoIterator for &Blob<'a> {
    type Item = Result<(usize, &'a [u8])>;
    type IntoIter = BlobIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`Blob`] heap, stops after the first malformed entry
pub struct BlobIterator<'a> {
    blob: Blob<'a>,
    position: usize,
}

impl<'a> Iterator for BlobIterator<'a> {
    type Item = Result<(usize, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.blob.data.len() {
            return None;
        }

        let start = self.position;
        match self.blob.entry_at(start) {
            Ok((skip, len)) => {
                self.position = start + skip + len;
                Some(Ok((start, &self.blob.data[start + skip..start + skip + len])))
            }
            Err(error) => {
                self.position = self.blob.data.len();
                Some(Err(error))
            }
        }
    }
}
