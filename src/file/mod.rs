//! Image loading and raw binary access.
//!
//! This module owns everything below the metadata layer: the [`Backend`]
//! abstraction over file-mapped and in-memory buffers, the bounded [`Parser`]
//! cursor, the PE/COFF header decoders in [`pe`] and the metadata locator in
//! [`locator`]. The [`Image`] type ties them together and is the usual entry
//! point into this crate.
//!
//! # Architecture
//!
//! ```text
//! Image ── Backend (Physical | Memory)
//!   │
//!   ├── locator::locate_metadata ── pe::{DosStub, CoffHeader, PeHeader, ...}
//!   │                                      │
//!   │                                      └── Parser (bounded cursor)
//!   └── metadata() ── &[u8] sub-view of the metadata blob
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use testscope::file::Image;
//! use std::path::Path;
//!
//! let image = Image::from_file(Path::new("tests.dll"))?;
//! let location = image.metadata_location()?;
//! println!("metadata at {:#x}, {} bytes", location.offset, location.size);
//! # Ok::<(), testscope::Error>(())
//! ```

pub(crate) mod io;
pub mod locator;
mod memory;
pub mod parser;
pub mod pe;
mod physical;

use std::path::Path;

use crate::Result;

pub use locator::MetadataLocation;
pub use memory::Memory;
pub use parser::Parser;
pub use physical::Physical;

/// Read-only access to the raw bytes of an image, independent of where they live.
///
/// Implementations exist for memory-mapped files ([`Physical`]) and owned
/// buffers ([`Memory`]). The parsing layer only ever sees byte slices obtained
/// through this trait.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// An executable image whose managed metadata can be located and read.
///
/// Couples a [`Backend`] with the layout flag that decides how RVAs translate
/// to buffer offsets: an image loaded into memory by an OS loader keeps its
/// sections at their virtual addresses, while an on-disk file keeps them at
/// their raw-data pointers. The flag is supplied by whoever produced the
/// buffer; it cannot be inferred from the bytes.
pub struct Image {
    backend: Box<dyn Backend>,
    loaded: bool,
}

impl Image {
    /// Map an on-disk image file.
    ///
    /// # Arguments
    /// * `path` - Path to the image on disk
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// mapped, [`crate::Error::Empty`] if it has no content.
    pub fn from_file(path: &Path) -> Result<Image> {
        Self::with_backend(Box::new(Physical::new(path)?), false)
    }

    /// Map an image file that represents an already-loaded memory layout,
    /// for example a dumped module.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// mapped, [`crate::Error::Empty`] if it has no content.
    pub fn from_file_loaded(path: &Path) -> Result<Image> {
        Self::with_backend(Box::new(Physical::new(path)?), true)
    }

    /// Take ownership of an in-memory buffer holding on-disk image bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] if the buffer has no content.
    pub fn from_mem(data: Vec<u8>) -> Result<Image> {
        Self::with_backend(Box::new(Memory::new(data)), false)
    }

    /// Take ownership of an in-memory buffer holding a loaded image layout.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] if the buffer has no content.
    pub fn from_mem_loaded(data: Vec<u8>) -> Result<Image> {
        Self::with_backend(Box::new(Memory::new(data)), true)
    }

    fn with_backend(backend: Box<dyn Backend>, loaded: bool) -> Result<Image> {
        if backend.len() == 0 {
            return Err(crate::Error::Empty);
        }

        Ok(Image { backend, loaded })
    }

    /// The complete image bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.backend.data()
    }

    /// Total image size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// Returns `true` if the image has no content. Never true for a
    /// constructed [`Image`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backend.len() == 0
    }

    /// Returns `true` if the buffer represents a loaded memory layout.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Locate the managed metadata blob within this image.
    ///
    /// # Errors
    /// See [`locator::locate_metadata`].
    pub fn metadata_location(&self) -> Result<MetadataLocation> {
        locator::locate_metadata(self.backend.data(), self.loaded)
    }

    /// Locate the metadata blob and return it as a sub-view of the image.
    ///
    /// # Errors
    /// See [`locator::locate_metadata`].
    pub fn metadata(&self) -> Result<&[u8]> {
        let location = self.metadata_location()?;
        self.backend
            .data_slice(location.offset as usize, location.size as usize)
    }
}
