//! Text re-materialization: encoding and line-ending conversion.
//!
//! Text assets inside the archives (configs, scripts, localization xml) are Windows-1251 with
//! `\r\n` line endings. Extraction and diffing re-encode them as UTF-8 with the host line
//! separator so the downstream tools and the OS tree speak the same convention.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1251;

/// Target form of extracted bytes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Re-encode known text formats to UTF-8 with host line endings
    #[default]
    Utf8,
    /// Bytes exactly as stored
    Raw,
}

impl TextEncoding {
    /// Conventional name for report lines.
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Raw => "raw",
        }
    }
}

/// Host line separator written by text extraction.
pub const HOST_LINE_SEPARATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Conventional name of the host line separator for report lines.
pub const HOST_LINE_SEPARATOR_NAME: &str = if cfg!(windows) { "crlf" } else { "lf" };

/// Extensions treated as text when re-materializing
const TEXT_EXTENSIONS: [&str; 5] = ["ltx", "xml", "script", "txt", "ini"];

/// Whether a logical path names a known text format.
pub fn is_text_path(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) => TEXT_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Decode archive-side text bytes from the declared source encoding.
pub fn decode_archive_text(bytes: &[u8]) -> String {
    let (text, _, _) = WINDOWS_1251.decode(bytes);
    text.into_owned()
}

/// Rewrite any mix of `\r\n`, `\r` and `\n` endings to the given separator.
pub fn normalize_line_endings(text: &str, separator: &str) -> String {
    let unified: Cow<'_, str> = if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    };
    if separator == "\n" {
        unified.into_owned()
    } else {
        unified.replace('\n', separator)
    }
}

/// Archive bytes to host-convention UTF-8 text.
pub fn to_host_text(bytes: &[u8]) -> String {
    normalize_line_endings(&decode_archive_text(bytes), HOST_LINE_SEPARATOR)
}
