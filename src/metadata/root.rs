//! Metadata root header and stream directory.
//!
//! The metadata root is the entry point for reading managed metadata. It
//! carries the magic signature, a length-prefixed version string, and the
//! stream directory used to locate the `#~` tables stream and the heaps.
//!
//! # References
//!
//! - [ECMA-335 II.24.2.1: Metadata root](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, metadata::streams::StreamHeader, Error::OutOfBounds, Result};

/// The MAGIC value indicating the CIL metadata root
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// The parsed metadata root header.
///
/// Gives access to the version string and the stream directory required to
/// locate all metadata streams within the metadata block.
///
/// # Example
///
/// ```rust,no_run
/// use testscope::metadata::root::Root;
/// let root = Root::read(&[
///            0x42, 0x53, 0x4A, 0x42,
///            0x01, 0x00,
///            0x01, 0x00,
///            0x00, 0x00, 0x00, 0x00,
///            0x04, 0x00, 0x00, 0x00,
///            b'v', b'4', b'.', 0x00,
///            0x00, 0x00,
///            0x01, 0x00,
///            0x1, 0x00, 0x00, 0x00, // StreamHeader
///            0x5, 0x00, 0x00, 0x00,
///            0x23, 0x7E, 0x00, 0x00,
///        ])?;
/// println!("Metadata version: {}", root.version);
/// for stream in &root.stream_headers {
///     println!("Stream: {} (offset: {}, size: {})", stream.name, stream.offset, stream.size);
/// }
/// # Ok::<(), testscope::Error>(())
/// ```
pub struct Root<'a> {
    /// Magic signature for physical metadata: 0x424A5342
    pub signature: u32,
    /// `MajorVersion`
    pub major_version: u16,
    /// `MinorVersion`
    pub minor_version: u16,
    /// Number of bytes allocated to hold the version string, NUL padding included
    pub length: u32,
    /// The version string, trailing NUL padding stripped
    pub version: &'a str,
    /// Reserved, always 0
    pub flags: u16,
    /// Streams
    pub stream_headers: Vec<StreamHeader<'a>>,
}

impl<'a> Root<'a> {
    /// Reads a [`Root`] metadata header from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice, starting at the metadata root signature
    ///
    /// # Errors
    /// Returns an error if the data is too short, the signature is invalid,
    /// or the stream directory is malformed.
    pub fn read(data: &'a [u8]) -> Result<Root<'a>> {
        if data.len() < 20 {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let signature = parser.read_le::<u32>()?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - {}",
                signature
            ));
        }

        let major_version = parser.read_le::<u16>()?;
        let minor_version = parser.read_le::<u16>()?;
        parser.skip::<u32>()?; // reserved

        let version_length = parser.read_le::<u32>()?;
        let version_bytes = parser.read_bytes(version_length as usize)?;
        let version = match std::str::from_utf8(version_bytes) {
            // The allocated space is NUL padded to a 4-byte boundary
            Ok(version) => version.trim_end_matches('\0'),
            Err(_) => return Err(malformed_error!("Version string is not valid UTF-8")),
        };

        let flags = parser.read_le::<u16>()?;
        let stream_count = parser.read_le::<u16>()?;
        if stream_count == 0 || stream_count > 5 {
            // #~, #Strings, #US, #GUID, #Blob - nothing else is defined
            return Err(malformed_error!("Invalid stream count - {}", stream_count));
        }

        let mut stream_headers = Vec::with_capacity(stream_count as usize);
        for _ in 0..stream_count {
            let header = StreamHeader::read(&mut parser)?;

            let Some(stream_end) = u32::checked_add(header.offset, header.size) else {
                return Err(malformed_error!(
                    "Stream offset and size cause integer overflow - {} + {}",
                    header.offset,
                    header.size
                ));
            };
            if stream_end as usize > data.len() {
                return Err(OutOfBounds);
            }

            stream_headers.push(header);
        }

        Ok(Root {
            signature,
            major_version,
            minor_version,
            length: version_length,
            version,
            flags,
            stream_headers,
        })
    }

    /// Find a stream header by name, e.g. `#~` or `#Strings`.
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader<'a>> {
        self.stream_headers.iter().find(|header| header.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let mut data = vec![
            0x42, 0x53, 0x4A, 0x42,
            0x01, 0x00,
            0x01, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x0C, 0x00, 0x00, 0x00,
            b'v', b'4', b'.', b'0', b'.', b'3', b'0', b'3', b'1', b'9', 0x00, 0x00,
            0x00, 0x00,
            0x02, 0x00,
            0x6C, 0x00, 0x00, 0x00, // #~
            0x10, 0x00, 0x00, 0x00,
            0x23, 0x7E, 0x00, 0x00,
            0x7C, 0x00, 0x00, 0x00, // #Strings
            0x08, 0x00, 0x00, 0x00,
            0x23, 0x53, 0x74, 0x72, 0x69, 0x6E, 0x67, 0x73, 0x00, 0x00, 0x00, 0x00,
        ];
        data.resize(0x84, 0);

        let root = Root::read(&data).unwrap();

        assert_eq!(root.signature, CIL_HEADER_MAGIC);
        assert_eq!(root.major_version, 1);
        assert_eq!(root.minor_version, 1);
        assert_eq!(root.length, 12);
        assert_eq!(root.version, "v4.0.30319");
        assert_eq!(root.flags, 0);
        assert_eq!(root.stream_headers.len(), 2);
        assert_eq!(root.stream("#~").unwrap().offset, 0x6C);
        assert_eq!(root.stream("#Strings").unwrap().size, 8);
        assert!(root.stream("#Blob").is_none());
    }

    #[test]
    fn rejects_bad_magic() {
        let data = [0u8; 32];
        assert!(Root::read(&data).is_err());
    }

    #[test]
    fn rejects_stream_past_end() {
        #[rustfmt::skip]
        let data = [
            0x42, 0x53, 0x4A, 0x42,
            0x01, 0x00,
            0x01, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00,
            b'v', b'4', b'.', 0x00,
            0x00, 0x00,
            0x01, 0x00,
            0xFF, 0x00, 0x00, 0x00, // offset past end of block
            0x10, 0x00, 0x00, 0x00,
            0x23, 0x7E, 0x00, 0x00,
        ];
        assert!(Root::read(&data).is_err());
    }
}
