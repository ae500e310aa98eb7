//! String heap (`#Strings`) access.
//!
//! The `#Strings` heap stores NUL-terminated UTF-8 identifier strings referenced
//! by index from the metadata tables.
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::ffi::CStr;

use crate::{Error::OutOfBounds, Result};

/// Zero-copy view over the `#Strings` heap.
///
/// # Examples
///
/// ```rust
/// use testscope::metadata::streams::Strings;
/// let data = &[0u8, b'H', b'e', b'l', b'l', b'o', 0u8];
/// let strings = Strings::from(data).unwrap();
/// assert_eq!(strings.get(1).unwrap(), "Hello");
/// ```
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Create a `Strings` object from a sequence of bytes
    ///
    /// # Arguments
    /// * 'data'    - The byte slice from which this object shall be created
    ///
    /// # Errors
    /// Returns an error if the string heap data is empty or does not start with
    /// the mandatory leading NUL byte.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Provided #Strings heap is empty"));
        }

        Ok(Strings { data })
    }

    /// Get the string located at `index`.
    ///
    /// ## Arguments
    /// * 'index' - The offset within the heap to be accessed (comes from metadata tables)
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the string data is invalid UTF-8
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => match result.to_str() {
                Ok(result) => Ok(result),
                Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
            },
            Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
        }
    }

    /// Get the raw bytes of the string located at `index`, without UTF-8 validation.
    ///
    /// Used for byte-exact comparisons such as the `Tests` name-suffix check.
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or no terminator exists.
    pub fn get_bytes(&self, index: usize) -> Result<&'a [u8]> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => Ok(result.to_bytes()),
            Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data: [u8; 24] = [
            0x00,
            b'<', b'M', b'o', b'd', b'u', b'l', b'e', b'>', 0x00,
            b'F', b'o', b'o', b'T', b'e', b's', b't', b's', 0x00,
            b'R', b'u', b'n', 0x31, 0x00,
        ];

        let str_view = Strings::from(&data).unwrap();

        assert_eq!(str_view.get(1).unwrap(), "<Module>");
        assert_eq!(str_view.get(10).unwrap(), "FooTests");
        assert_eq!(str_view.get(19).unwrap(), "Run1");
        assert_eq!(str_view.get_bytes(10).unwrap(), b"FooTests");
    }

    #[test]
    fn rejects_missing_lead_nul() {
        assert!(Strings::from(b"Hello\0").is_err());
        assert!(Strings::from(&[]).is_err());
    }

    #[test]
    fn index_at_or_past_end_is_out_of_bounds() {
        let data = [0x00, b'A', 0x00];
        let str_view = Strings::from(&data).unwrap();

        assert!(matches!(str_view.get(3), Err(crate::Error::OutOfBounds)));
        assert!(matches!(str_view.get(4), Err(crate::Error::OutOfBounds)));
        assert!(matches!(
            str_view.get_bytes(3),
            Err(crate::Error::OutOfBounds)
        ));
    }
}
