//! Metadata stream parsing.
//!
//! A metadata root carries up to five streams: the `#~` tables stream, the
//! `#Strings`, `#Blob`, `#GUID` and `#US` heaps. Test discovery needs the
//! tables stream plus the string and blob heaps; the others are located but
//! not interpreted.

mod blob;
mod streamheader;
mod strings;
mod tablesheader;

pub use blob::Blob;
pub use streamheader::StreamHeader;
pub use strings::Strings;
pub use tablesheader::TablesHeader;
