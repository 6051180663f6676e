//! Stream header entries of the metadata root.
//!
//! Each entry names one stream and gives its offset and size relative to the start of the metadata
//! root. The name is a NUL-terminated ASCII string of at most 32 characters, padded to the next
//! 4-byte boundary.

use crate::{file::io::read_le, Error::OutOfBounds, Result};

/// Longest stream name allowed, terminator excluded
pub const MAX_STREAM_NAME: usize = 32;

/// One entry of the stream directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream, relative to the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Name of the stream, e.g. `#~` or `#Strings`
    pub name: String,
}

impl StreamHeader {
    /// Read a stream header from the start of `data`.
    ///
    /// Names are not checked against the known set, [`crate::metadata::metadataroot::MetadataRoot`]
    /// decides which streams it binds.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` ends inside the entry and
    /// [`crate::Error::MalformedMetadata`] if the name is not terminated within 32 characters or
    /// is not ASCII.
    pub fn from(data: &[u8]) -> Result<StreamHeader> {
        if data.len() < 9 {
            return Err(OutOfBounds);
        }

        let name_bytes = &data[8..];
        let Some(name_len) = name_bytes
            .iter()
            .take(MAX_STREAM_NAME + 1)
            .position(|byte| *byte == 0)
        else {
            if name_bytes.len() <= MAX_STREAM_NAME {
                return Err(OutOfBounds);
            }

            return Err(malformed_error!(
                "Stream name exceeds {} characters",
                MAX_STREAM_NAME
            ));
        };

        if !name_bytes[..name_len].is_ascii() {
            return Err(malformed_error!("Stream name is not ASCII"));
        }

        Ok(StreamHeader {
            offset: read_le::<u32>(data)?,
            size: read_le::<u32>(&data[4..])?,
            name: String::from_utf8_lossy(&name_bytes[..name_len]).into_owned(),
        })
    }

    /// Number of bytes this entry occupies in the stream directory, including name padding.
    #[must_use]
    pub fn entry_size(&self) -> usize {
        8 + ((self.name.len() + 1 + 3) & !3)
    }
}
