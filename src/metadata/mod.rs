//! ECMA-335 physical metadata parsing.
//!
//! Entry point is [`Metadata::parse`], which reads the metadata root, walks
//! the stream directory and wires up zero-copy views over the streams the
//! crate interprets: the `#~` tables stream and the `#Strings` and `#Blob`
//! heaps. The `#GUID` and `#US` heaps are validated by the stream directory
//! but not read.

pub mod root;
pub mod streams;
pub mod tables;
pub mod token;

use crate::{
    metadata::{
        root::Root,
        streams::{Blob, Strings, TablesHeader},
    },
    Result,
};

/// Parsed managed metadata: the root plus typed views over its streams.
///
/// Borrows the metadata block it was parsed from; no stream data is copied.
pub struct Metadata<'a> {
    root: Root<'a>,
    strings: Option<Strings<'a>>,
    blob: Option<Blob<'a>>,
    tables: Option<TablesHeader<'a>>,
}

impl<'a> Metadata<'a> {
    /// Parse a metadata block, starting at the root signature.
    ///
    /// ## Arguments
    /// * `data` - The raw metadata block, as located by the CLI header
    ///
    /// # Errors
    /// Returns an error if the root header or any present stream is malformed.
    pub fn parse(data: &'a [u8]) -> Result<Metadata<'a>> {
        let root = Root::read(data)?;

        let mut strings = None;
        let mut blob = None;
        let mut tables = None;

        for header in &root.stream_headers {
            let stream_data = &data[header.offset as usize..(header.offset + header.size) as usize];

            match header.name {
                "#Strings" => strings = Some(Strings::from(stream_data)?),
                "#Blob" => blob = Some(Blob::from(stream_data)?),
                "#~" => tables = Some(TablesHeader::from(stream_data)?),
                // #GUID and #US carry nothing test discovery needs
                _ => {}
            }
        }

        Ok(Metadata {
            root,
            strings,
            blob,
            tables,
        })
    }

    /// The metadata root header.
    #[must_use]
    pub fn root(&self) -> &Root<'a> {
        &self.root
    }

    /// The `#Strings` heap.
    ///
    /// # Errors
    /// Returns an error if the image carries no `#Strings` stream.
    pub fn strings(&self) -> Result<&Strings<'a>> {
        match &self.strings {
            Some(strings) => Ok(strings),
            None => Err(malformed_error!("Image has no #Strings stream")),
        }
    }

    /// The `#Blob` heap.
    ///
    /// # Errors
    /// Returns an error if the image carries no `#Blob` stream.
    pub fn blob(&self) -> Result<&Blob<'a>> {
        match &self.blob {
            Some(blob) => Ok(blob),
            None => Err(malformed_error!("Image has no #Blob stream")),
        }
    }

    /// The `#~` tables stream.
    ///
    /// # Errors
    /// Returns an error if the image carries no `#~` stream.
    pub fn tables(&self) -> Result<&TablesHeader<'a>> {
        match &self.tables {
            Some(tables) => Ok(tables),
            None => Err(malformed_error!("Image has no #~ stream")),
        }
    }
}
