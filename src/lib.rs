//! A library for writing ZIP archives to any byte sink.
//!
//! The writer streams: entry payloads go straight to the sink while an
//! in-memory index collects what the central directory will need. The sink
//! only has to implement [`std::io::Write`], it is never seeked. Sizes and
//! checksums of deflated entries travel in a data descriptor behind the
//! entry data, so they do not need to be known up front; stored entries
//! must declare both before any payload byte is written.
//!
//! ```
//! use std::io::Write;
//! use zipstream::{ZipEntry, ZipWriter};
//!
//! # fn run() -> zipstream::result::ZipResult<()> {
//! let mut zip = ZipWriter::new(Vec::new());
//! zip.start_entry(ZipEntry::new("hello_world.txt"))?;
//! zip.write_all(b"Hello, World!")?;
//! let bytes = zip.finish()?;
//! assert_eq!(&bytes[0..4], b"PK\x03\x04");
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```

#![warn(missing_docs)]

mod compression;
mod cp437;
mod encoding;
pub mod result;
mod spec;
mod types;
pub mod write;

pub use crate::compression::CompressionMethod;
pub use crate::encoding::TextEncoding;
pub use crate::types::{DateTime, DateTimeRangeError, ZipEntry};
pub use crate::write::ZipWriter;
