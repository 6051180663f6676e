//! Metadata root header and stream directory for .NET assemblies.
//!
//! This module defines the [`Root`] struct, the header at the start of the metadata block that the
//! CLI header points at. It carries the version string and the stream directory, which locates the
//! `#~`, `#Strings`, `#Blob`, `#GUID` and `#US` streams relative to the root.
//!
//! # Example
//!
//! ```rust
//! use nsscope::metadata::root::Root;
//! let root = Root::read(&[
//!            0x42, 0x53, 0x4A, 0x42,
//!            0x01, 0x00,
//!            0x01, 0x00,
//!            0x00, 0x00, 0x00, 0x00,
//!            0x04, 0x00, 0x00, 0x00,
//!            b'v', b'4', 0x00, 0x00,
//!            0x00, 0x00,
//!            0x01, 0x00,
//!            0x24, 0x00, 0x00, 0x00, // StreamHeader
//!            0x00, 0x00, 0x00, 0x00,
//!            0x23, 0x7E, 0x00, 0x00,
//!        ])?;
//! assert_eq!(root.version, "v4");
//! for stream in &root.stream_headers {
//!     println!("Stream: {} (offset: {}, size: {})", stream.name, stream.offset, stream.size);
//! }
//! # Ok::<(), nsscope::Error>(())
//! ```
//!
//! # References
//!
//! - [ECMA-335 II.24.2.1: Metadata root](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{
    file::io::{read_le, read_le_at},
    metadata::streams::StreamHeader,
    Error::OutOfBounds,
    Result,
};

/// Signature of the metadata root, `BSJB` in little-endian
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// Longest version string ECMA-335 allows: 255 bytes with the terminator, rounded up to 4
const MAX_VERSION_LENGTH: u32 = 256;

/// The metadata root header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    /// Magic signature, always [`CIL_HEADER_MAGIC`]
    pub signature: u32,
    /// Major version, 1 for all known runtimes
    pub major_version: u16,
    /// Minor version, 1 for all known runtimes
    pub minor_version: u16,
    /// Reserved, always 0
    pub reserved: u32,
    /// Declared length of the version string in bytes, padding included
    pub length: u32,
    /// The version string, e.g. `v4.0.30319`, with its NUL padding removed
    pub version: String,
    /// Reserved, always 0
    pub flags: u16,
    /// Number of stream headers that follow
    pub stream_number: u16,
    /// The stream directory in declaration order
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Read the root header and its stream directory from the start of the metadata block.
    ///
    /// Every stream header must describe a range inside `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` ends inside the header and
    /// [`crate::Error::MalformedMetadata`] for a bad signature, an oversized version string, no
    /// streams, or a stream range outside `data`.
    pub fn read(data: &[u8]) -> Result<Root> {
        if data.len() < 20 {
            return Err(OutOfBounds);
        }

        let signature = read_le::<u32>(data)?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - 0x{:08X}",
                signature
            ));
        }

        let length = read_le_at::<u32>(data, &mut 12)?;
        if length > MAX_VERSION_LENGTH {
            return Err(malformed_error!(
                "Version string length {} exceeds {}",
                length,
                MAX_VERSION_LENGTH
            ));
        }

        let version_end = 16 + length as usize;
        let Some(version_bytes) = data.get(16..version_end) else {
            return Err(OutOfBounds);
        };
        let version_len = version_bytes
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8_lossy(&version_bytes[..version_len]).into_owned();

        let mut offset = version_end;
        let flags = read_le_at::<u16>(data, &mut offset)?;
        let stream_number = read_le_at::<u16>(data, &mut offset)?;
        if stream_number == 0 {
            return Err(malformed_error!("Metadata root declares no streams"));
        }

        let mut stream_headers = Vec::with_capacity(stream_number as usize);
        for _ in 0..stream_number {
            let Some(entry) = data.get(offset..) else {
                return Err(OutOfBounds);
            };

            let header = StreamHeader::from(entry)?;
            match u32::checked_add(header.offset, header.size) {
                Some(end) if end as usize <= data.len() => {}
                Some(_) => {
                    return Err(malformed_error!(
                        "Stream '{}' at {} with {} bytes exceeds the metadata block of {} bytes",
                        header.name,
                        header.offset,
                        header.size,
                        data.len()
                    ))
                }
                None => {
                    return Err(malformed_error!(
                        "Stream offset and size cause integer overflow - {} + {}",
                        header.offset,
                        header.size
                    ))
                }
            }

            offset += header.entry_size();
            stream_headers.push(header);
        }

        Ok(Root {
            signature,
            major_version: read_le::<u16>(&data[4..])?,
            minor_version: read_le::<u16>(&data[6..])?,
            reserved: read_le::<u32>(&data[8..])?,
            length,
            version,
            flags,
            stream_number,
            stream_headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[rustfmt::skip]
    const HEADER: [u8; 56] = [
        0x42, 0x53, 0x4A, 0x42,
        0x01, 0x00,
        0x01, 0x00,
        0x00, 0x00, 0x00, 0x00,
        0x0C, 0x00, 0x00, 0x00,
        b'v', b'4', b'.', b'0', b'.', b'3', b'0', b'3', b'1', b'9', 0x00, 0x00,
        0x00, 0x00,
        0x02, 0x00,

        0x34, 0x00, 0x00, 0x00, // StreamHeader
        0x04, 0x00, 0x00, 0x00,
        0x23, 0x7E, 0x00, 0x00,

        0x38, 0x00, 0x00, 0x00, // StreamHeader
        0x00, 0x00, 0x00, 0x00,
        0x23, 0x55, 0x53, 0x00,
    ];

    #[test]
    fn crafted() {
        let mut data = HEADER.to_vec();
        data.extend_from_slice(&[0x00; 4]);
        let parsed_header = Root::read(&data).unwrap();

        assert_eq!(parsed_header.signature, CIL_HEADER_MAGIC);
        assert_eq!(parsed_header.major_version, 1);
        assert_eq!(parsed_header.minor_version, 1);
        assert_eq!(parsed_header.reserved, 0);
        assert_eq!(parsed_header.length, 12);
        assert_eq!(parsed_header.version, "v4.0.30319");
        assert_eq!(parsed_header.flags, 0);
        assert_eq!(parsed_header.stream_number, 2);
        assert_eq!(parsed_header.stream_headers.len(), 2);
        assert_eq!(parsed_header.stream_headers[0].offset, 0x34);
        assert_eq!(parsed_header.stream_headers[0].size, 0x4);
        assert_eq!(parsed_header.stream_headers[0].name, "#~");
        assert_eq!(parsed_header.stream_headers[1].offset, 0x38);
        assert_eq!(parsed_header.stream_headers[1].name, "#US");
    }

    #[test]
    fn invalid_signature() {
        let mut data = HEADER.to_vec();
        data.extend_from_slice(&[0x00; 4]);
        data[0] = 0x43;

        assert!(matches!(
            Root::read(&data),
            Err(Error::MalformedMetadata { .. })
        ));
    }

    #[test]
    fn stream_outside_metadata() {
        // the '#~' stream declares 4 bytes at 0x34, the block ends at 0x38
        let data = HEADER.to_vec();
        assert!(Root::read(&data).is_ok());

        let mut data = HEADER.to_vec();
        data[36] = 0x05;
        assert!(matches!(
            Root::read(&data),
            Err(Error::MalformedMetadata { .. })
        ));

        let mut data = HEADER.to_vec();
        data[32..36].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            Root::read(&data),
            Err(Error::MalformedMetadata { .. })
        ));
    }

    #[test]
    fn truncated() {
        assert!(matches!(Root::read(&HEADER[..18]), Err(OutOfBounds)));
        assert!(matches!(Root::read(&HEADER[..40]), Err(OutOfBounds)));
    }

    fn with_version_length(length: u32) -> Vec<u8> {
        let mut data = vec![0x42, 0x53, 0x4A, 0x42, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
        data.extend_from_slice(&length.to_le_bytes());
        data.extend_from_slice(b"v4.0.30319");
        data.resize(16 + length as usize, 0x00);
        data.extend_from_slice(&[0x00, 0x00, 0x01, 0x00]);

        let stream_offset = data.len() as u32 + 12;
        data.extend_from_slice(&stream_offset.to_le_bytes());
        data.extend_from_slice(&[0x04, 0x00, 0x00, 0x00, 0x23, 0x7E, 0x00, 0x00]);
        data.extend_from_slice(&[0x00; 4]);
        data
    }

    #[test]
    fn version_length_limit() {
        let parsed_header = Root::read(&with_version_length(256)).unwrap();
        assert_eq!(parsed_header.length, 256);
        assert_eq!(parsed_header.version, "v4.0.30319");
        assert_eq!(parsed_header.stream_headers[0].name, "#~");

        assert!(matches!(
            Root::read(&with_version_length(260)),
            Err(Error::MalformedMetadata { .. })
        ));
    }

    #[test]
    fn no_streams() {
        let mut data = HEADER.to_vec();
        data[30] = 0x00;

        assert!(matches!(
            Root::read(&data),
            Err(Error::MalformedMetadata { .. })
        ));
    }
}
