//! Bounded binary cursor for sequential parsing of image structures.
//!
//! [`Parser`] is the foundation every header decoder and metadata reader in this
//! crate builds on: a cursor over a fixed, caller-owned byte slice with checked
//! read primitives (little-endian integers, NUL-padded UTF-8 strings, ECMA-335
//! compressed integers) and absolute seek. A checked read that would cross the
//! end of the buffer fails with [`crate::Error::OutOfBounds`] before any cursor
//! state is touched.
//!
//! Unchecked variants exist for hot paths where a surrounding structure (a
//! directory entry, a section extent) has already proven the bound; they are the
//! second operation variant on the same abstraction, not a separate type.

use crate::{
    file::io::{read_be_at, read_le_at, ImageIO},
    Result,
};

/// A bounded cursor over an immutable byte buffer.
///
/// The cursor never outlives the buffer it reads from; all offsets it produces
/// satisfy `0 <= offset <= len`. Reads advance the position, `seek` moves it
/// absolutely, and every checked operation validates its extent up front.
///
/// # Examples
///
/// ```rust
/// use testscope::file::Parser;
///
/// let data = [0x4D, 0x5A, 0x90, 0x00];
/// let mut parser = Parser::new(&data);
/// let sig = parser.read_le::<u16>()?;
/// assert_eq!(sig, 0x5A4D); // "MZ"
/// # Ok::<(), testscope::Error>(())
/// ```
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of bytes between the current position and the end of the buffer.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the current position to the specified index.
    ///
    /// A position equal to the buffer length is valid (the cursor then sits at
    /// end-of-data and any subsequent read fails); only positions past the end
    /// are rejected.
    ///
    /// # Arguments
    /// * `pos` - The position to move the cursor to
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the current position without bounds checking.
    ///
    /// Callers must have already proven `pos <= len`, typically via an earlier
    /// directory or section validation.
    pub fn seek_unchecked(&mut self, pos: usize) {
        debug_assert!(pos <= self.data.len());
        self.position = pos;
    }

    /// Move the position forward by one byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance(&mut self) -> Result<()> {
        self.advance_by(1)
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Arguments
    /// * `step` - Amount of bytes to advance
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if self.position + step > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position += step;
        Ok(())
    }

    /// Skip over a value of type `T` without reading it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if skipping would exceed the data length.
    pub fn skip<T: ImageIO>(&mut self) -> Result<()> {
        self.advance_by(std::mem::size_of::<T>())
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is at or beyond the data length.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(out_of_bounds_error!());
        }
        Ok(self.data[self.position])
    }

    /// Peek at a value of type `T` in little-endian format without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn peek_le<T: ImageIO>(&self) -> Result<T> {
        let mut temp_position = self.position;
        read_le_at::<T>(self.data, &mut temp_position)
    }

    /// Read a value of type `T` in little-endian format, advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data
    /// length; the position is left untouched in that case.
    pub fn read_le<T: ImageIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a value of type `T` in big-endian format, advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn read_be<T: ImageIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Read a little-endian `u16` without bounds checking.
    ///
    /// Callers must have already validated that at least 2 bytes remain.
    #[must_use]
    pub fn read_u16_unchecked(&mut self) -> u16 {
        debug_assert!(self.position + 2 <= self.data.len());
        let value = u16::from_le_bytes([self.data[self.position], self.data[self.position + 1]]);
        self.position += 2;
        value
    }

    /// Read a little-endian `u32` without bounds checking.
    ///
    /// Callers must have already validated that at least 4 bytes remain.
    #[must_use]
    pub fn read_u32_unchecked(&mut self) -> u32 {
        debug_assert!(self.position + 4 <= self.data.len());
        let value = u32::from_le_bytes([
            self.data[self.position],
            self.data[self.position + 1],
            self.data[self.position + 2],
            self.data[self.position + 3],
        ]);
        self.position += 4;
        value
    }

    /// Read `length` raw bytes, advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        if self.position + length > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let bytes = &self.data[self.position..self.position + length];
        self.position += length;
        Ok(bytes)
    }

    /// Read a fixed-length NUL-padded UTF-8 field, stripping trailing NUL bytes.
    ///
    /// Exactly `byte_count` bytes are consumed. The returned slice ends at the
    /// last non-zero byte; NUL bytes *between* non-zero bytes are preserved
    /// verbatim. This matches how PE section names are stored and compared.
    ///
    /// # Arguments
    /// * `byte_count` - Width of the fixed field in bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `byte_count` bytes
    /// remain, or [`crate::Error::Malformed`] if the field is not valid UTF-8.
    pub fn read_null_padded_utf8(&mut self, byte_count: usize) -> Result<&'a str> {
        let bytes = self.read_bytes(byte_count)?;

        let mut length = 0;
        for (index, byte) in bytes.iter().enumerate() {
            if *byte != 0 {
                length = index + 1;
            }
        }

        match std::str::from_utf8(&bytes[..length]) {
            Ok(name) => Ok(name),
            Err(_) => Err(malformed_error!("Invalid UTF-8 in null-padded field")),
        }
    }

    /// Read an ECMA-335 compressed unsigned integer (II.23.2).
    ///
    /// Values below 0x80 occupy one byte, below 0x4000 two bytes (prefix `10`),
    /// everything else four bytes (prefix `110`).
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the buffer ends mid-encoding, or
    /// [`crate::Error::Malformed`] on an invalid prefix.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first = self.read_le::<u8>()?;

        if first & 0x80 == 0 {
            Ok(u32::from(first))
        } else if first & 0xC0 == 0x80 {
            let second = self.read_le::<u8>()?;
            Ok((u32::from(first & 0x3F) << 8) | u32::from(second))
        } else if first & 0xE0 == 0xC0 {
            let second = self.read_le::<u8>()?;
            let third = self.read_le::<u8>()?;
            let fourth = self.read_le::<u8>()?;
            Ok((u32::from(first & 0x1F) << 24)
                | (u32::from(second) << 16)
                | (u32::from(third) << 8)
                | u32::from(fourth))
        } else {
            Err(malformed_error!(
                "Invalid compressed integer prefix - 0x{:02X}",
                first
            ))
        }
    }

    /// Align the current position up to the next multiple of `alignment`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the aligned position is beyond the data length.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let remainder = self.position % alignment;
        if remainder != 0 {
            self.advance_by(alignment - remainder)?;
        }
        Ok(())
    }
}
