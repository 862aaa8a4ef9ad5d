//! Text encodings applied to entry names and comments.

use crate::cp437;
use crate::result::{ZipError, ZipResult};

/// Character encoding used when storing names and comments in the archive.
///
/// The default is UTF-8, which is what modern archivers write. Readers that
/// predate the UTF-8 flag expect cp437.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8
    #[default]
    Utf8,
    /// IBM code page 437
    Cp437,
}

impl TextEncoding {
    /// Look up an encoding by label.
    ///
    /// Recognized labels are `utf-8`/`utf8` and `cp437`/`ibm437`, compared
    /// case-insensitively.
    pub fn for_label(label: &str) -> ZipResult<TextEncoding> {
        if label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8") {
            Ok(TextEncoding::Utf8)
        } else if label.eq_ignore_ascii_case("cp437") || label.eq_ignore_ascii_case("ibm437") {
            Ok(TextEncoding::Cp437)
        } else {
            Err(ZipError::UnsupportedEncoding(label.to_string()))
        }
    }

    /// The bytes for `text` under this encoding.
    ///
    /// Characters without a cp437 representation are stored as `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Cp437 => text
                .chars()
                .map(|c| cp437::to_cp437(c).unwrap_or(b'?'))
                .collect(),
        }
    }
}
