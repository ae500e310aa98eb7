//! Stream header entries of the metadata root.

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// One entry of the stream directory following the metadata root header.
///
/// Offsets are relative to the start of the metadata root. The name is a
/// NUL-terminated ASCII string padded to a 4-byte boundary; only the stream
/// names defined by ECMA-335 are accepted.
pub struct StreamHeader<'a> {
    /// Offset of the stream, relative to the start of the metadata root
    pub offset: u32,
    /// Size of this stream in bytes
    pub size: u32,
    /// Stream name, e.g. `#~` or `#Strings`
    pub name: &'a str,
}

impl<'a> StreamHeader<'a> {
    /// Read one stream header at the current cursor position, leaving the
    /// cursor aligned on the start of the next header.
    ///
    /// # Errors
    /// Returns an error if the data is too short or the stream name is not one
    /// of the names ECMA-335 defines.
    pub fn read(parser: &mut Parser<'a>) -> Result<StreamHeader<'a>> {
        if parser.remaining() < 9 {
            return Err(OutOfBounds);
        }

        let offset = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;

        let name_start = parser.pos();
        let mut name_len = 0;
        while parser.read_le::<u8>()? != 0 {
            name_len += 1;
            if name_len > 32 {
                return Err(malformed_error!("Stream header name too long"));
            }
        }

        let name = match std::str::from_utf8(&parser.data()[name_start..name_start + name_len]) {
            Ok(name) => name,
            Err(_) => return Err(malformed_error!("Stream header name is not valid UTF-8")),
        };

        if !["#Strings", "#US", "#Blob", "#GUID", "#~"]
            .iter()
            .any(|valid_name| name == *valid_name)
        {
            return Err(malformed_error!("Invalid stream header name - {}", name));
        }

        // name plus terminator is padded to a 4-byte boundary
        let name_aligned = ((name_len + 1) + 3) & !3;
        parser.seek(name_start + name_aligned)?;

        Ok(StreamHeader { offset, size, name })
    }
}
