//! Error types that can be emitted from this library

use std::io;

use thiserror::Error;

/// Generic result type with ZipError as its error variant
pub type ZipResult<T> = Result<T, ZipError>;

/// Error type for Zip
#[derive(Debug, Error)]
pub enum ZipError {
    /// An Error caused by I/O
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A stored entry was started without its uncompressed size or its CRC
    #[error("uncompressed size and crc checksum are required for stored entries")]
    MissingStoredMetadata,

    /// The CRC declared for a stored entry does not match the written bytes
    #[error("bad crc checksum for stored entry: {declared:#010x} instead of {actual:#010x}")]
    StoredCrcMismatch {
        /// CRC the entry was declared with
        declared: u32,
        /// CRC of the bytes actually written
        actual: u32,
    },

    /// The size declared for a stored entry does not match the written bytes
    #[error("bad size for stored entry: {declared} instead of {actual}")]
    StoredSizeMismatch {
        /// Size the entry was declared with
        declared: u32,
        /// Number of payload bytes actually written
        actual: u64,
    },

    /// No encoding is known under the configured label
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
}
