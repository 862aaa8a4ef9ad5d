//! Possible ZIP compression methods.

use std::fmt;

/// Compression methods for the contents of a ZIP file.
///
/// Only the two methods every reader in existence understands are supported.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CompressionMethod {
    /// The file is stored (no compression)
    Stored,
    /// The file is Deflated
    Deflated,
}

impl CompressionMethod {
    /// Numeric identifier used in the header records.
    pub(crate) fn to_u16(self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflated => 8,
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Just duplicate what the Debug format looks like
        write!(f, "{:?}", self)
    }
}
