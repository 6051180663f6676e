//! PE container access for managed assemblies.
//!
//! This module owns the raw image bytes and the parsed PE/COFF headers. It answers the questions
//! the metadata reader needs before it can look at any CLI structure:
//!
//! - Is this a PE image with an optional header at all?
//! - Does data directory #14 (the CLR runtime header) point somewhere, i.e. is it managed?
//! - Which file offset does a given RVA live at, according to the section table?
//!
//! # Key Components
//!
//! - [`crate::file::File`] - The loaded image: bytes plus parsed headers, immutable after load
//! - [`crate::file::Backend`] - Where the bytes come from (memory map or owned buffer)
//! - [`crate::file::parser::Parser`] - Cursor over byte slices used by the metadata stages
//! - [`crate::file::io`] - Little-endian primitive reads
//!
//! # Examples
//!
//! ```rust,no_run
//! use nsscope::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("MyLibrary.dll"))?;
//! let (clr_rva, clr_size) = file.clr();
//! let clr_offset = file.rva_to_offset(clr_rva)?;
//! let clr_header = file.data_slice(clr_offset, clr_size)?;
//! println!("CLR header: {:02x?}", &clr_header[..8]);
//! # Ok::<(), nsscope::Error>(())
//! ```
//!
//! # References
//!
//! - Microsoft PE/COFF Specification
//! - ECMA-335 6th Edition, Partition II.25 - File format extensions to PE

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error::Empty, Result};
use goblin::pe::{
    header::{Header, SIZEOF_COFF_HEADER, SIZEOF_PE_MAGIC},
    section_table::SectionTable,
};
use memory::Memory;
use ouroboros::self_referencing;
use physical::Physical;

/// Source of the raw image bytes.
///
/// Implementations must hand out stable slices for the lifetime of the backend, the parsed PE
/// headers borrow from them.
pub trait Backend: Send + Sync {
    /// Get a bounds-checked slice of `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range is not fully inside the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// The complete image.
    fn data(&self) -> &[u8];

    /// Length of the image in bytes.
    fn len(&self) -> usize;
}

/// The PE headers and section table of an image.
///
/// Only the container is parsed here. Directories such as the CLI header are left to the
/// metadata stages, which report their own errors.
pub struct Headers<'a> {
    /// DOS, COFF and optional header
    pub header: Header<'a>,
    /// The section table in file order
    pub sections: Vec<SectionTable>,
}

impl<'a> Headers<'a> {
    fn parse(data: &'a [u8]) -> Result<Headers<'a>> {
        let header = Header::parse(data)
            .map_err(|error| malformed_image!("Invalid PE image - {}", error))?;

        let Some(optional_header) = header.optional_header.as_ref() else {
            return Err(malformed_image!("File does not have an OptionalHeader"));
        };

        match optional_header.data_directories.get_clr_runtime_header() {
            Some(clr) if clr.virtual_address != 0 && clr.size != 0 => {}
            _ => {
                return Err(malformed_image!(
                    "File does not have a CLR runtime header directory"
                ))
            }
        }

        let mut offset = header.dos_header.pe_pointer as usize
            + SIZEOF_PE_MAGIC
            + SIZEOF_COFF_HEADER
            + header.coff_header.size_of_optional_header as usize;
        let sections = header
            .coff_header
            .sections(data, &mut offset)
            .map_err(|error| malformed_image!("Invalid section table - {}", error))?;

        for section in &sections {
            if section
                .virtual_address
                .checked_add(section.virtual_size)
                .is_none()
                || section
                    .pointer_to_raw_data
                    .checked_add(section.size_of_raw_data)
                    .is_none()
            {
                return Err(malformed_image!(
                    "Section malformed, causing integer overflow - {:?}",
                    section.name().unwrap_or("<invalid>")
                ));
            }
        }

        Ok(Headers { header, sections })
    }
}

/// A loaded PE image that carries a CLR runtime header.
///
/// Construction validates the MZ/PE signatures, the presence of the optional header and a
/// non-empty CLR data directory, and that the section table does not overflow the 32-bit address
/// space. The image is never modified afterwards. Whether the directories point at valid data is
/// checked by the readers that follow them.
#[self_referencing]
pub struct File {
    data: Box<dyn Backend>,
    #[borrows(data)]
    #[not_covariant]
    pe: Headers<'this>,
}

impl File {
    /// Memory-map and load the assembly at `file`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, [`crate::Error::Empty`]
    /// for a zero-length file and [`crate::Error::MalformedImage`] if it is not a managed PE.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Load an assembly from an in-memory buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer and [`crate::Error::MalformedImage`]
    /// if it is not a managed PE.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let data = Box::new(data);

        let file = File::try_new(data, |data| Headers::parse(data.data()))?;

        log::debug!(
            "Loaded PE image: {} bytes, {} sections, CLR header at RVA 0x{:08X}",
            file.len(),
            file.sections().count(),
            file.clr().0
        );

        Ok(file)
    }

    /// Length of the image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns `true` if the image has no bytes. A loaded [`File`] is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The preferred load address from the optional header.
    #[must_use]
    pub fn imagebase(&self) -> u64 {
        self.with_pe(|pe| {
            pe.header
                .optional_header
                .as_ref()
                .map_or(0, |optional_header| optional_header.windows_fields.image_base)
        })
    }

    /// RVA and size of the CLR runtime header (data directory #14).
    #[must_use]
    pub fn clr(&self) -> (usize, usize) {
        self.with_pe(|pe| {
            // Presence was verified during the initial load.
            let Some(optional_header) = pe.header.optional_header.as_ref() else {
                return (0, 0);
            };

            if let Some(clr_dir) = optional_header.data_directories.get_clr_runtime_header() {
                (clr_dir.virtual_address as usize, clr_dir.size as usize)
            } else {
                (0, 0)
            }
        })
    }

    /// The section table in file order.
    pub fn sections(&self) -> impl Iterator<Item = &SectionTable> {
        self.with_pe(|pe| pe.sections.iter())
    }

    /// The complete image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.with_data(|data| data.data())
    }

    /// A bounds-checked slice of the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range is not fully inside the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.with_data(|data| data.data_slice(offset, len))
    }

    /// Translate a relative virtual address into a file offset using the section table.
    ///
    /// A section covers `[virtual_address, virtual_address + virtual_size)`; linkers that leave
    /// `virtual_size` at zero get their raw size instead. The RVA must also fall into the part of
    /// the section that is backed by raw data.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedImage`] if no section maps `rva`.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        let rva_u32 = u32::try_from(rva)
            .map_err(|_| malformed_image!("RVA too large to fit in u32: {}", rva))?;

        self.with_pe(|pe| {
            for section in &pe.sections {
                let span = if section.virtual_size == 0 {
                    section.size_of_raw_data
                } else {
                    section.virtual_size
                };

                let Some(section_max) = section.virtual_address.checked_add(span) else {
                    return Err(malformed_image!(
                        "Section malformed, causing integer overflow - {} + {}",
                        section.virtual_address,
                        span
                    ));
                };

                if section.virtual_address <= rva_u32 && rva_u32 < section_max {
                    let delta = rva_u32 - section.virtual_address;
                    if delta >= section.size_of_raw_data {
                        return Err(malformed_image!(
                            "RVA 0x{:08X} lies in the uninitialized tail of a section",
                            rva_u32
                        ));
                    }

                    return Ok(delta as usize + section.pointer_to_raw_data as usize);
                }
            }

            Err(malformed_image!(
                "RVA could not be converted to offset - 0x{:08X}",
                rva_u32
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::factories::image::ImageBuilder;
    use crate::Error;

    #[test]
    fn load_buffer() {
        let image = ImageBuilder::new().with_type("Foo.Bar", "MyClass").build();
        let file = File::from_mem(image).unwrap();

        assert_eq!(file.data()[0..2], [0x4D, 0x5A]);
        assert_eq!(file.data_slice(0, 2).unwrap(), [0x4D, 0x5A]);
        assert!(!file.is_empty());
        assert_eq!(file.imagebase(), 0x0040_0000);

        let (clr_rva, clr_size) = file.clr();
        assert_eq!(clr_rva, 0x2000);
        assert_eq!(clr_size, 72);

        assert!(
            file.sections()
                .any(|section| section.name == ".text\0\0\0".as_bytes()),
            "Text section missing!"
        );
    }

    #[test]
    fn rva_mapping() {
        let image = ImageBuilder::new().build();
        let file = File::from_mem(image).unwrap();

        // the first byte of the section is mapped, inclusive start
        assert_eq!(file.rva_to_offset(0x2000).unwrap(), 0x200);
        assert_eq!(file.rva_to_offset(0x2048).unwrap(), 0x248);
        assert!(matches!(
            file.rva_to_offset(0x1FFF),
            Err(Error::MalformedImage { .. })
        ));
        assert!(matches!(
            file.rva_to_offset(0x0100_0000),
            Err(Error::MalformedImage { .. })
        ));
        assert!(matches!(
            file.rva_to_offset(usize::MAX),
            Err(Error::MalformedImage { .. })
        ));
    }

    #[test]
    fn load_empty() {
        assert!(matches!(File::from_mem(Vec::new()), Err(Error::Empty)));
    }

    #[test]
    fn load_invalid_signatures() {
        let mut image = ImageBuilder::new().build();
        image[0] = b'X';
        assert!(matches!(
            File::from_mem(image),
            Err(Error::MalformedImage { .. })
        ));

        let mut image = ImageBuilder::new().build();
        image[0x80] = b'X';
        assert!(matches!(
            File::from_mem(image),
            Err(Error::MalformedImage { .. })
        ));

        assert!(matches!(
            File::from_mem(vec![0xCC; 64]),
            Err(Error::MalformedImage { .. })
        ));
    }

    #[test]
    fn load_truncated_directories() {
        use crate::test::factories::image::METADATA_OFFSET;

        // only the headers and section table belong to the container
        let image = ImageBuilder::new().build();
        for end in [METADATA_OFFSET - 4, METADATA_OFFSET, METADATA_OFFSET + 64] {
            let file = File::from_mem(image[..end].to_vec()).unwrap();
            assert_eq!(file.len(), end);
            assert_eq!(file.clr(), (0x2000, 72));
            assert_eq!(file.rva_to_offset(0x2048).unwrap(), METADATA_OFFSET);
        }

        let mut image = ImageBuilder::new().build();
        image.truncate(0x100);
        assert!(matches!(
            File::from_mem(image),
            Err(Error::MalformedImage { .. })
        ));
    }

    #[test]
    fn load_unmanaged() {
        let image = ImageBuilder::new().without_clr_directory().build();
        assert!(matches!(
            File::from_mem(image),
            Err(Error::MalformedImage { .. })
        ));
    }
}
