//! CLI header (COR20) of a managed PE image.
//!
//! Data directory #14 of the optional header points at this 72-byte structure. For namespace
//! extraction only the metadata directory matters, the remaining fields are kept for callers that
//! want to inspect the runtime flags or the entry point token.
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II.25.3.3 - CLI header

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// Size of the CLI header in bytes, also the required value of [`Cor20Header::cb`]
pub const COR20_HEADER_SIZE: usize = 72;

/// The CLI header, as found at the RVA in data directory #14
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cor20Header {
    /// Size of the header in bytes, always 72
    pub cb: u32,
    /// Minimum runtime major version required
    pub major_runtime_version: u16,
    /// Minimum runtime minor version required
    pub minor_runtime_version: u16,
    /// RVA of the metadata root
    pub meta_data_rva: u32,
    /// Size of the metadata block
    pub meta_data_size: u32,
    /// Runtime flags (ILONLY, 32BITREQUIRED, STRONGNAMESIGNED, ...)
    pub flags: u32,
    /// Token of the entry point method, or RVA of a native entry point
    pub entry_point_token: u32,
    /// RVA of the managed resources
    pub resource_rva: u32,
    /// Size of the managed resources
    pub resource_size: u32,
    /// RVA of the strong name signature
    pub strong_name_signature_rva: u32,
    /// Size of the strong name signature
    pub strong_name_signature_size: u32,
    /// Reserved, always 0
    pub code_manager_table_rva: u32,
    /// Reserved, always 0
    pub code_manager_table_size: u32,
    /// RVA of the VTable fixups
    pub vtable_fixups_rva: u32,
    /// Size of the VTable fixups
    pub vtable_fixups_size: u32,
    /// Reserved, always 0
    pub export_address_table_jmp_rva: u32,
    /// Reserved, always 0
    pub export_address_table_jmp_size: u32,
    /// Reserved, always 0
    pub managed_native_header_rva: u32,
    /// Reserved, always 0
    pub managed_native_header_size: u32,
}

impl Cor20Header {
    /// Read a CLI header from the start of `data`.
    ///
    /// Only the fields needed to locate the metadata are validated: `cb` must be 72 and the
    /// metadata directory must be non-empty. Reserved fields are taken as they are.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than 72 bytes and
    /// [`crate::Error::MalformedImage`] if the header is invalid.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < COR20_HEADER_SIZE {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if cb as usize != COR20_HEADER_SIZE {
            return Err(malformed_image!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;

        let meta_data_rva = parser.read_le::<u32>()?;
        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_rva == 0 || meta_data_size == 0 {
            return Err(malformed_image!(
                "CLR header has an empty metadata directory - rva: 0x{:08X}, size: {}",
                meta_data_rva,
                meta_data_size
            ));
        }

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags: parser.read_le::<u32>()?,
            entry_point_token: parser.read_le::<u32>()?,
            resource_rva: parser.read_le::<u32>()?,
            resource_size: parser.read_le::<u32>()?,
            strong_name_signature_rva: parser.read_le::<u32>()?,
            strong_name_signature_size: parser.read_le::<u32>()?,
            code_manager_table_rva: parser.read_le::<u32>()?,
            code_manager_table_size: parser.read_le::<u32>()?,
            vtable_fixups_rva: parser.read_le::<u32>()?,
            vtable_fixups_size: parser.read_le::<u32>()?,
            export_address_table_jmp_rva: parser.read_le::<u32>()?,
            export_address_table_jmp_size: parser.read_le::<u32>()?,
            managed_native_header_rva: parser.read_le::<u32>()?,
            managed_native_header_size: parser.read_le::<u32>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[rustfmt::skip]
    const HEADER: [u8; 72] = [
        0x48, 0x00, 0x00, 0x00, // cb
        0x02, 0x00,             // major_runtime_version
        0x05, 0x00,             // minor_runtime_version
        0x48, 0x20, 0x00, 0x00, // meta_data_rva
        0x10, 0x04, 0x00, 0x00, // meta_data_size
        0x01, 0x00, 0x00, 0x00, // flags
        0x01, 0x00, 0x00, 0x06, // entry_point_token
        0x00, 0x00, 0x00, 0x00, // resource_rva
        0x00, 0x00, 0x00, 0x00, // resource_size
        0x00, 0x00, 0x00, 0x00, // strong_name_signature_rva
        0x00, 0x00, 0x00, 0x00, // strong_name_signature_size
        0x00, 0x00, 0x00, 0x00, // code_manager_table_rva
        0x00, 0x00, 0x00, 0x00, // code_manager_table_size
        0x00, 0x00, 0x00, 0x00, // vtable_fixups_rva
        0x00, 0x00, 0x00, 0x00, // vtable_fixups_size
        0x00, 0x00, 0x00, 0x00, // export_address_table_jmp_rva
        0x00, 0x00, 0x00, 0x00, // export_address_table_jmp_size
        0x00, 0x00, 0x00, 0x00, // managed_native_header_rva
        0x00, 0x00, 0x00, 0x00, // managed_native_header_size
    ];

    #[test]
    fn crafted() {
        let header = Cor20Header::read(&HEADER).unwrap();

        assert_eq!(header.cb, 72);
        assert_eq!(header.major_runtime_version, 2);
        assert_eq!(header.minor_runtime_version, 5);
        assert_eq!(header.meta_data_rva, 0x2048);
        assert_eq!(header.meta_data_size, 0x410);
        assert_eq!(header.flags, 1);
        assert_eq!(header.entry_point_token, 0x0600_0001);
        assert_eq!(header.managed_native_header_size, 0);
    }

    #[test]
    fn invalid_size() {
        let mut data = HEADER;
        data[0] = 0x40;
        assert!(matches!(
            Cor20Header::read(&data),
            Err(Error::MalformedImage { .. })
        ));
    }

    #[test]
    fn empty_metadata_directory() {
        let mut data = HEADER;
        data[8..12].copy_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            Cor20Header::read(&data),
            Err(Error::MalformedImage { .. })
        ));

        let mut data = HEADER;
        data[12..16].copy_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            Cor20Header::read(&data),
            Err(Error::MalformedImage { .. })
        ));
    }

    #[test]
    fn truncated() {
        assert!(matches!(Cor20Header::read(&HEADER[..71]), Err(OutOfBounds)));
    }
}
