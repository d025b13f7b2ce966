//! Common utilities.

use std::path::{Path, PathBuf};

use write_fonts::types::Tag;

/// The path next to `path` with the same stem and the given extension.
pub(crate) fn sibling_with_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

/// Compute the identifier used to name per-table files for `tag`.
///
/// Lowercase letters and digits become `_c`, uppercase letters `C_`, and
/// anything else the hex value of the byte. Trailing spaces are dropped, so
/// `name` becomes `_n_a_m_e` and `CFF ` becomes `C_F_F_`.
pub fn tag_identifier(tag: Tag) -> String {
    let bytes = tag.to_be_bytes();
    let len = bytes.iter().rposition(|b| *b != b' ').map_or(1, |last| last + 1);

    let mut result = String::with_capacity(8);
    for b in &bytes[..len] {
        match *b {
            b if b.is_ascii_lowercase() || b.is_ascii_digit() => {
                result.push('_');
                result.push(b as char);
            }
            b if b.is_ascii_uppercase() => {
                result.push(b as char);
                result.push('_');
            }
            b => result.push_str(&format!("{b:x}")),
        }
    }
    result
}
