//! PE/COFF header decoders.
//!
//! Fixed-layout decoders for the handful of container structures that stand
//! between the start of an executable image and its managed metadata: the MS-DOS
//! stub, the COFF file header, the optional PE header (PE32 and PE32+), the
//! section table and the CLI/COR header. Each decoder is a pure function from a
//! [`crate::file::Parser`] position to a record; orchestration lives in
//! [`crate::file::locator`].
//!
//! Only the fields needed for metadata location are materialized. Everything
//! else (timestamps, symbol pointers, linker versions, the non-CLI data
//! directories) is skipped by width.
//!
//! # Reference
//! - [PE Format](https://learn.microsoft.com/windows/win32/debug/pe-format)
//! - [ECMA-335 II.25](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, Result};

/// The 2-byte MS-DOS signature, "MZ".
pub const DOS_SIGNATURE: u16 = 0x5A4D;
/// File offset of the 4-byte field holding the NT header offset.
pub const PE_SIGNATURE_OFFSET_LOCATION: usize = 0x3C;
/// The 4-byte NT signature, "PE\0\0".
pub const PE_SIGNATURE: u32 = 0x0000_4550;

/// Optional header magic for PE32 images.
pub const PE32_MAGIC: u16 = 0x010B;
/// Optional header magic for PE32+ images.
pub const PE32_PLUS_MAGIC: u16 = 0x020B;

/// Index of the CLI/COR entry within the 16 standard data directories.
const COR_DIRECTORY_INDEX: usize = 14;
/// Size in bytes of one data directory entry.
const DIRECTORY_ENTRY_SIZE: usize = 8;
/// Minimum size of a valid CLI/COR header.
pub const SIZE_OF_COR_HEADER: u32 = 72;

/// A PE data directory entry: a region described by RVA and size.
///
/// A zero size means the directory is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Relative virtual address of the region
    pub relative_virtual_address: u32,
    /// Size of the region in bytes
    pub size: u32,
}

impl DirectoryEntry {
    /// Read a directory entry at the current cursor position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 8 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<DirectoryEntry> {
        let relative_virtual_address = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;

        Ok(DirectoryEntry {
            relative_virtual_address,
            size,
        })
    }

    /// Returns `true` if this directory does not describe any region.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.size == 0
    }
}

/// Outcome of skipping the MS-DOS stub at the start of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DosStub {
    /// The image carries an MS-DOS stub and a verified `PE\0\0` signature;
    /// the cursor sits right after the signature.
    PeImage,
    /// No MS-DOS signature was found; the image is treated as a plain COFF
    /// object file and the cursor was rewound to offset 0.
    CoffOnly,
}

impl DosStub {
    /// Skip the MS-DOS stub, classifying the image as PE or plain COFF.
    ///
    /// If the first two bytes are not `MZ`, the image is assumed to be a COFF
    /// object file and the cursor rewinds to the start - unless those bytes are
    /// zero and the following two bytes are `0xFFFF`, which marks a legacy
    /// anonymous-object format this crate does not read. For `MZ` images, the
    /// NT header offset at [`PE_SIGNATURE_OFFSET_LOCATION`] is followed and the
    /// `PE\0\0` signature verified.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownFileFormat`] for the legacy sentinel or a
    /// bad NT signature, [`crate::Error::OutOfBounds`] on truncation.
    pub fn skip(parser: &mut Parser) -> Result<DosStub> {
        let dos_signature = parser.read_le::<u16>()?;
        if dos_signature != DOS_SIGNATURE {
            if dos_signature == 0 && parser.read_le::<u16>()? == 0xFFFF {
                return Err(crate::Error::UnknownFileFormat);
            }

            parser.seek(0)?;
            return Ok(DosStub::CoffOnly);
        }

        parser.seek(PE_SIGNATURE_OFFSET_LOCATION)?;
        let nt_header_offset = parser.read_le::<u32>()?;
        parser.seek(nt_header_offset as usize)?;

        if parser.read_le::<u32>()? != PE_SIGNATURE {
            return Err(crate::Error::UnknownFileFormat);
        }

        Ok(DosStub::PeImage)
    }
}

/// The COFF file header.
///
/// Of the 20 bytes only the section count matters for metadata location; the
/// machine type, timestamp, symbol table pointer and characteristics are skipped.
#[derive(Debug, Clone, Copy)]
pub struct CoffHeader {
    /// Number of entries in the section table. Negative values are rejected
    /// by the locator with [`crate::Error::InvalidSectionCount`].
    pub number_of_sections: i16,
}

impl CoffHeader {
    /// Read the COFF header at the current cursor position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 20 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<CoffHeader> {
        parser.skip::<u16>()?; // machine
        let number_of_sections = parser.read_le::<i16>()?;
        parser.advance_by(16)?; // timestamp, symbol table, characteristics

        Ok(CoffHeader { number_of_sections })
    }
}

/// The optional PE header, reduced to what metadata location needs.
///
/// The magic selects field widths further down the header (the stack and heap
/// reserve/commit fields are 4 bytes in PE32 and 8 in PE32+), which shifts the
/// offset of the data directories; everything between the magic and the CLI
/// directory entry is skipped by computed width.
#[derive(Debug, Clone, Copy)]
pub struct PeHeader {
    /// `true` for PE32, `false` for PE32+
    pub is_pe32: bool,
    /// The CLI/COR data directory (15th of the 16 standard directories)
    pub cor_header_table_directory: DirectoryEntry,
}

impl PeHeader {
    /// Total optional header size for the given format: 224 for PE32, 240 for PE32+.
    #[must_use]
    fn size(is_pe32: bool) -> usize {
        let reserve_field_width = if is_pe32 { 4 } else { 8 };
        64 + 4 + 2 + 2 + 4 * reserve_field_width + 4 + 4 + 16 * DIRECTORY_ENTRY_SIZE
    }

    /// Read the optional header at the current cursor position.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedPeMagic`] for a magic other than
    /// PE32/PE32+, or [`crate::Error::OutOfBounds`] on truncation.
    pub fn read(parser: &mut Parser) -> Result<PeHeader> {
        let magic = parser.read_le::<u16>()?;
        let is_pe32 = match magic {
            PE32_MAGIC => true,
            PE32_PLUS_MAGIC => false,
            _ => return Err(crate::Error::UnsupportedPeMagic(magic)),
        };

        // Skip straight to the 15th data directory entry, leaving the 16th
        // (reserved) entry to consume afterwards so the cursor ends exactly
        // past the optional header.
        let skip = Self::size(is_pe32) - 2 - 2 * DIRECTORY_ENTRY_SIZE;
        parser.advance_by(skip)?;

        let cor_header_table_directory = DirectoryEntry::read(parser)?;
        parser.advance_by(DIRECTORY_ENTRY_SIZE)?;

        Ok(PeHeader {
            is_pe32,
            cor_header_table_directory,
        })
    }
}

/// One 40-byte record of the section table.
#[derive(Debug, Clone)]
pub struct SectionHeader<'a> {
    /// Section name, a fixed 8-byte NUL-padded UTF-8 field
    pub name: &'a str,
    /// Size of the section once loaded into memory
    pub virtual_size: u32,
    /// RVA of the section once loaded into memory
    pub virtual_address: u32,
    /// Size of the section's initialized data on disk
    pub size_of_raw_data: u32,
    /// File offset of the section's data
    pub pointer_to_raw_data: u32,
}

impl<'a> SectionHeader<'a> {
    /// Read one section header at the current cursor position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 40 bytes remain, or
    /// [`crate::Error::Malformed`] if the name field is not valid UTF-8.
    pub fn read(parser: &mut Parser<'a>) -> Result<SectionHeader<'a>> {
        let name = parser.read_null_padded_utf8(8)?;
        let virtual_size = parser.read_le::<u32>()?;
        let virtual_address = parser.read_le::<u32>()?;
        let size_of_raw_data = parser.read_le::<u32>()?;
        let pointer_to_raw_data = parser.read_le::<u32>()?;
        parser.advance_by(16)?; // relocations, line numbers, characteristics

        Ok(SectionHeader {
            name,
            virtual_size,
            virtual_address,
            size_of_raw_data,
            pointer_to_raw_data,
        })
    }

    /// Returns `true` if `rva` falls within this section's virtual range.
    #[must_use]
    pub fn contains_rva(&self, rva: u32) -> bool {
        let va = u64::from(self.virtual_address);
        let rva = u64::from(rva);
        va <= rva && rva < va + u64::from(self.virtual_size)
    }
}

/// The CLI/COR header, reduced to the metadata directory.
///
/// The remaining directory entries (resources, strong name signature, vtable
/// fixups and the reserved tail) do not participate in metadata location and
/// are skipped as one block.
#[derive(Debug, Clone, Copy)]
pub struct CorHeader {
    /// The directory describing the embedded metadata blob
    pub metadata_directory: DirectoryEntry,
}

impl CorHeader {
    /// Read the COR header at the current cursor position.
    ///
    /// The caller has already validated that the CLI directory declares at
    /// least [`SIZE_OF_COR_HEADER`] bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 72 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<CorHeader> {
        parser.advance_by(8)?; // cb, runtime versions
        let metadata_directory = DirectoryEntry::read(parser)?;
        parser.advance_by(56)?; // flags, entry point, remaining directories

        Ok(CorHeader { metadata_directory })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dos_stub_pe_image() {
        let mut image = vec![0u8; 0x48];
        image[0] = 0x4D; // 'M'
        image[1] = 0x5A; // 'Z'
        image[0x3C] = 0x40; // NT headers at 0x40
        image[0x40..0x44].copy_from_slice(&PE_SIGNATURE.to_le_bytes());

        let mut parser = Parser::new(&image);
        assert_eq!(DosStub::skip(&mut parser).unwrap(), DosStub::PeImage);
        assert_eq!(parser.pos(), 0x44);
    }

    #[test]
    fn dos_stub_coff_only_rewinds() {
        let image = [0x64, 0x86, 0x01, 0x00, 0x00, 0x00];
        let mut parser = Parser::new(&image);
        assert_eq!(DosStub::skip(&mut parser).unwrap(), DosStub::CoffOnly);
        assert_eq!(parser.pos(), 0);
    }

    #[test]
    fn dos_stub_anonymous_object_rejected() {
        let image = [0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00];
        let mut parser = Parser::new(&image);
        assert!(matches!(
            DosStub::skip(&mut parser),
            Err(crate::Error::UnknownFileFormat)
        ));
    }

    #[test]
    fn dos_stub_bad_nt_signature() {
        let mut image = vec![0u8; 0x48];
        image[0] = 0x4D;
        image[1] = 0x5A;
        image[0x3C] = 0x40;
        image[0x40..0x44].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());

        let mut parser = Parser::new(&image);
        assert!(matches!(
            DosStub::skip(&mut parser),
            Err(crate::Error::UnknownFileFormat)
        ));
    }

    #[test]
    fn coff_header_crafted() {
        #[rustfmt::skip]
        let data = [
            0x64, 0x86,             // machine (skipped)
            0x03, 0x00,             // number_of_sections = 3
            0x00, 0x00, 0x00, 0x00, // timestamp
            0x00, 0x00, 0x00, 0x00, // symbol table pointer
            0x00, 0x00, 0x00, 0x00, // symbol count
            0x00, 0x00,             // optional header size
            0x00, 0x00,             // characteristics
        ];

        let mut parser = Parser::new(&data);
        let header = CoffHeader::read(&mut parser).unwrap();
        assert_eq!(header.number_of_sections, 3);
        assert_eq!(parser.pos(), 20);
    }

    #[test]
    fn pe_header_sizes() {
        assert_eq!(PeHeader::size(true), 224);
        assert_eq!(PeHeader::size(false), 240);
    }

    #[test]
    fn pe_header_crafted_pe32() {
        let mut data = vec![0u8; 224];
        data[0..2].copy_from_slice(&PE32_MAGIC.to_le_bytes());
        // 15th directory entry starts at 224 - 16
        data[208..212].copy_from_slice(&0x2000u32.to_le_bytes());
        data[212..216].copy_from_slice(&72u32.to_le_bytes());

        let mut parser = Parser::new(&data);
        let header = PeHeader::read(&mut parser).unwrap();
        assert!(header.is_pe32);
        assert_eq!(header.cor_header_table_directory.relative_virtual_address, 0x2000);
        assert_eq!(header.cor_header_table_directory.size, 72);
        assert_eq!(parser.pos(), 224);
    }

    #[test]
    fn pe_header_bad_magic() {
        let data = [0x0C, 0x01, 0x00, 0x00];
        let mut parser = Parser::new(&data);
        assert!(matches!(
            PeHeader::read(&mut parser),
            Err(crate::Error::UnsupportedPeMagic(0x010C))
        ));
    }

    #[test]
    fn section_header_crafted() {
        #[rustfmt::skip]
        let data = [
            b'.', b't', b'e', b'x', b't', 0x00, 0x00, 0x00, // name
            0x00, 0x10, 0x00, 0x00, // virtual_size = 0x1000
            0x00, 0x20, 0x00, 0x00, // virtual_address = 0x2000
            0x00, 0x04, 0x00, 0x00, // size_of_raw_data = 0x400
            0x00, 0x02, 0x00, 0x00, // pointer_to_raw_data = 0x200
            0x00, 0x00, 0x00, 0x00, // pointer_to_relocations
            0x00, 0x00, 0x00, 0x00, // pointer_to_line_numbers
            0x00, 0x00, 0x00, 0x00, // counts + characteristics (first half)
            0x00, 0x00, 0x00, 0x00, // characteristics (rest)
        ];

        let mut parser = Parser::new(&data);
        let section = SectionHeader::read(&mut parser).unwrap();
        assert_eq!(section.name, ".text");
        assert_eq!(section.virtual_size, 0x1000);
        assert_eq!(section.virtual_address, 0x2000);
        assert_eq!(section.size_of_raw_data, 0x400);
        assert_eq!(section.pointer_to_raw_data, 0x200);
        assert_eq!(parser.pos(), 40);

        assert!(section.contains_rva(0x2000));
        assert!(section.contains_rva(0x2FFF));
        assert!(!section.contains_rva(0x3000));
        assert!(!section.contains_rva(0x1FFF));
    }

    #[test]
    fn cor_header_crafted() {
        let mut data = vec![0u8; 72];
        data[0..4].copy_from_slice(&72u32.to_le_bytes()); // cb
        data[8..12].copy_from_slice(&0x2050u32.to_le_bytes()); // metadata rva
        data[12..16].copy_from_slice(&0x100u32.to_le_bytes()); // metadata size

        let mut parser = Parser::new(&data);
        let header = CorHeader::read(&mut parser).unwrap();
        assert_eq!(header.metadata_directory.relative_virtual_address, 0x2050);
        assert_eq!(header.metadata_directory.size, 0x100);
        assert_eq!(parser.pos(), 72);
    }
}
