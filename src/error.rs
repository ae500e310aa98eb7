use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while locating and reading
/// the managed metadata of a PE/COFF image and while deriving test identifiers. Each variant
/// provides specific context about the failure mode to enable appropriate error handling.
///
/// All parsing errors are unrecoverable for the single image being processed: callers log the
/// failure, skip the source, and continue with other sources.
///
/// # Examples
///
/// ```rust
/// use testscope::{Error, file::Image};
/// use std::path::Path;
///
/// match Image::from_file(Path::new("assembly.dll")) {
///     Ok(image) => {
///         println!("Successfully mapped image");
///     }
///     Err(Error::UnknownFileFormat) => {
///         eprintln!("Not a PE or COFF image");
///     }
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed image: {} ({}:{})", message, file, line);
///     }
///     Err(e) => {
///         eprintln!("Other error: {}", e);
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Encountered an invalid offset while parsing file structures.
    ///
    /// This error occurs when the parser encounters an offset that is invalid
    /// for the current file context, such as offsets that would point outside
    /// the valid file structure.
    #[error("Could not retrieve a valid offset!")]
    InvalidOffset,

    /// The file is damaged and could not be parsed.
    ///
    /// This error indicates that the file structure is corrupted or doesn't
    /// conform to the expected PE/COFF format. The error includes the source
    /// location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    ///
    /// This error occurs when trying to read data beyond the end of the file
    /// or stream. It's a safety check to prevent buffer overruns during parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The image is neither a PE executable nor a plain COFF object file.
    ///
    /// Raised when the MS-DOS signature, the `PE\0\0` signature, or the legacy
    /// anonymous-object sentinel checks all fail to identify the container.
    #[error("Unknown or unrecognized image container format")]
    UnknownFileFormat,

    /// The optional PE header carries a magic value other than PE32 or PE32+.
    #[error("Unsupported PE optional header magic: {0:#06x}")]
    UnsupportedPeMagic(u16),

    /// The COFF header declares a negative section count.
    #[error("Invalid section count: {0}")]
    InvalidSectionCount(i16),

    /// Provided input was empty.
    ///
    /// This error occurs when an empty file or buffer is provided where
    /// actual image data was expected.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories or for
    /// wrapping external library errors with additional context.
    #[error("{0}")]
    Error(String),
}
