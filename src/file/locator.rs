//! Managed-metadata location within a PE/COFF image.
//!
//! Orchestrates the header decoders in [`crate::file::pe`] to compute the
//! absolute offset and length of the embedded ECMA-335 metadata blob:
//!
//! 1. Skip the MS-DOS stub, classifying the image as PE or plain COFF.
//! 2. Read the COFF header and, for PE images, the optional header with its
//!    CLI data directory.
//! 3. Read the section table.
//! 4. For PE images, resolve the CLI directory RVA to a physical offset, read
//!    the COR header there, and resolve its metadata directory the same way.
//!    For COFF object files, find the section literally named `.cormeta`.
//!
//! RVA resolution never crosses a section boundary and the final span is
//! validated against the image length before anything is handed out; a
//! violation rejects the whole image.

use crate::{
    file::{
        parser::Parser,
        pe::{CoffHeader, CorHeader, DirectoryEntry, DosStub, PeHeader, SectionHeader,
            SIZE_OF_COR_HEADER},
    },
    Result,
};

/// Name of the section carrying metadata in plain COFF object files.
const COR_META_SECTION: &str = ".cormeta";

/// Resolved position of the metadata blob within an image.
///
/// Derived, never stored: `size > 0` and `offset + size <= image length` hold
/// for every value this module produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataLocation {
    /// Absolute offset of the metadata blob within the image buffer
    pub offset: u64,
    /// Size of the metadata blob in bytes
    pub size: u64,
}

/// Locate the metadata blob in `data`.
///
/// `loaded` selects the offset math: for an already-loaded in-memory image,
/// RVAs are valid offsets as-is and section virtual extents apply; for an
/// on-disk byte-for-byte file, RVAs translate through `pointer_to_raw_data`
/// and raw-data sizes apply.
///
/// # Errors
/// Returns [`crate::Error::UnknownFileFormat`] / [`crate::Error::UnsupportedPeMagic`]
/// for unrecognized containers, [`crate::Error::InvalidSectionCount`] for a
/// negative section count, [`crate::Error::OutOfBounds`] for truncated headers
/// and [`crate::Error::Malformed`] when the CLI or metadata directory is
/// absent, resolves outside every section, would cross a section boundary, or
/// produces a span outside the image.
pub fn locate_metadata(data: &[u8], loaded: bool) -> Result<MetadataLocation> {
    if data.is_empty() {
        return Err(crate::Error::Empty);
    }

    let mut parser = Parser::new(data);

    let stub = DosStub::skip(&mut parser)?;
    let coff_only = stub == DosStub::CoffOnly;

    let coff = CoffHeader::read(&mut parser)?;
    if coff.number_of_sections < 0 {
        return Err(crate::Error::InvalidSectionCount(coff.number_of_sections));
    }

    let cor_directory = if coff_only {
        None
    } else {
        Some(PeHeader::read(&mut parser)?.cor_header_table_directory)
    };

    let mut sections = Vec::with_capacity(coff.number_of_sections as usize);
    for _ in 0..coff.number_of_sections {
        sections.push(SectionHeader::read(&mut parser)?);
    }

    let (start, size) = if coff_only {
        let Some(section) = sections.iter().find(|s| s.name == COR_META_SECTION) else {
            return Err(malformed_error!(
                "Image does not contain managed metadata (no {} section)",
                COR_META_SECTION
            ));
        };

        if loaded {
            (u64::from(section.virtual_address), u64::from(section.virtual_size))
        } else {
            (
                u64::from(section.pointer_to_raw_data),
                u64::from(section.size_of_raw_data),
            )
        }
    } else {
        let directory = cor_directory.unwrap_or(DirectoryEntry {
            relative_virtual_address: 0,
            size: 0,
        });
        if directory.is_absent() {
            return Err(malformed_error!(
                "Image does not contain managed metadata (no CLI directory)"
            ));
        }
        if directory.size < SIZE_OF_COR_HEADER {
            return Err(malformed_error!(
                "Invalid COR header size: {}",
                directory.size
            ));
        }

        let cor_offset = directory_offset(&sections, &directory, loaded)?;
        parser.seek(cor_offset as usize)?;
        let cor_header = CorHeader::read(&mut parser)?;

        let metadata_directory = cor_header.metadata_directory;
        if metadata_directory.is_absent() {
            return Err(malformed_error!(
                "Image does not contain managed metadata (empty metadata directory)"
            ));
        }

        let metadata_offset = directory_offset(&sections, &metadata_directory, loaded)?;
        (metadata_offset, u64::from(metadata_directory.size))
    };

    let image_length = data.len() as u64;
    if size == 0 || start >= image_length || start + size > image_length {
        return Err(malformed_error!(
            "Metadata span [{}, +{}] exceeds image of {} bytes",
            start,
            size,
            image_length
        ));
    }

    Ok(MetadataLocation {
        offset: start,
        size,
    })
}

/// Resolve a directory's RVA to a physical offset via the section table.
///
/// Linear scan, first section whose virtual range contains the RVA; the
/// directory must fit within that section's remaining virtual size (reads
/// never cross into the next section).
fn directory_offset(
    sections: &[SectionHeader],
    directory: &DirectoryEntry,
    loaded: bool,
) -> Result<u64> {
    let rva = directory.relative_virtual_address;

    let Some(section) = sections.iter().find(|s| s.contains_rva(rva)) else {
        return Err(malformed_error!(
            "Directory RVA {:#x} is outside every section",
            rva
        ));
    };

    let relative_offset = rva - section.virtual_address;
    if directory.size > section.virtual_size - relative_offset {
        return Err(malformed_error!("Section too small"));
    }

    if loaded {
        Ok(u64::from(rva))
    } else {
        Ok(u64::from(section.pointer_to_raw_data) + u64::from(relative_offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &'static str, va: u32, vsize: u32, raw_ptr: u32, raw_size: u32) -> SectionHeader<'static> {
        SectionHeader {
            name,
            virtual_size: vsize,
            virtual_address: va,
            size_of_raw_data: raw_size,
            pointer_to_raw_data: raw_ptr,
        }
    }

    #[test]
    fn directory_offset_on_disk() {
        let sections = vec![section(".text", 0x2000, 0x1000, 0x200, 0x1000)];
        let directory = DirectoryEntry {
            relative_virtual_address: 0x2050,
            size: 0x100,
        };

        let offset = directory_offset(&sections, &directory, false).unwrap();
        assert_eq!(offset, 0x250);
    }

    #[test]
    fn directory_offset_loaded() {
        let sections = vec![section(".text", 0x2000, 0x1000, 0x200, 0x1000)];
        let directory = DirectoryEntry {
            relative_virtual_address: 0x2050,
            size: 0x100,
        };

        let offset = directory_offset(&sections, &directory, true).unwrap();
        assert_eq!(offset, 0x2050);
    }

    #[test]
    fn directory_offset_outside_sections() {
        let sections = vec![section(".text", 0x2000, 0x1000, 0x200, 0x1000)];
        let directory = DirectoryEntry {
            relative_virtual_address: 0x5000,
            size: 0x100,
        };

        assert!(directory_offset(&sections, &directory, false).is_err());
    }

    #[test]
    fn directory_offset_crosses_section() {
        let sections = vec![
            section(".text", 0x2000, 0x1000, 0x200, 0x1000),
            section(".data", 0x3000, 0x1000, 0x1200, 0x1000),
        ];
        // starts inside .text but extends past its virtual size
        let directory = DirectoryEntry {
            relative_virtual_address: 0x2F00,
            size: 0x200,
        };

        assert!(directory_offset(&sections, &directory, false).is_err());
    }

    #[test]
    fn empty_input() {
        assert!(matches!(
            locate_metadata(&[], false),
            Err(crate::Error::Empty)
        ));
    }
}
