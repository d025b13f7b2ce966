//! Writing selected tables of a binary font as structured text.

use std::path::{Path, PathBuf};

use write_fonts::types::Tag;

use crate::codec::BinaryFont;
use crate::document::Document;
use crate::util;
use crate::write::WriteOptions;
use crate::Error;

/// Write `tables` of the font at `otf_path` as structured text into
/// `dest_folder`.
///
/// All tables go to `<stem>.ttx`, or with `split` each table goes to its own
/// `<stem>.<identifier>.ttx` (see [`tag_identifier`](crate::util::tag_identifier)).
/// Returns the paths written.
pub fn extract_tables(
    otf_path: impl AsRef<Path>,
    dest_folder: impl AsRef<Path>,
    tables: &[Tag],
    split: bool,
) -> Result<Vec<PathBuf>, Error> {
    let otf_path = otf_path.as_ref();
    let dest_folder = dest_folder.as_ref();
    let stem = otf_path.file_stem().unwrap_or_default().to_string_lossy();
    let doc = Document::from_binary(&BinaryFont::load(otf_path)?);
    let options = WriteOptions::default();

    if !split {
        let path = dest_folder.join(format!("{stem}.ttx"));
        doc.subset(tables)?.save(&path, &options)?;
        return Ok(vec![path]);
    }
    // fail before writing anything
    let subset = doc.subset(tables)?;
    let mut written = Vec::with_capacity(tables.len());
    for tag in subset.tags() {
        let path = dest_folder.join(format!("{stem}.{}.ttx", util::tag_identifier(tag)));
        subset.subset(&[tag])?.save(&path, &options)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cff::CFF_TAG;
    use crate::error::MissingTableError;
    use crate::name::NAME_TAG;
    use crate::testdata;

    fn font(dir: &Path) -> PathBuf {
        let path = dir.join("Acme-Regular.otf");
        testdata::binary_font().save(&path).unwrap();
        path
    }

    #[test]
    fn one_file() {
        let dir = tempfile::tempdir().unwrap();
        let otf = font(dir.path());
        let out = tempfile::tempdir().unwrap();
        let written = extract_tables(&otf, out.path(), &[NAME_TAG, CFF_TAG], false).unwrap();
        assert_eq!(written, vec![out.path().join("Acme-Regular.ttx")]);
        let doc = Document::load(&written[0]).unwrap();
        assert_eq!(doc.tags().collect::<Vec<_>>(), [NAME_TAG, CFF_TAG]);
        assert_eq!(doc.sfnt_version(), testdata::OTTO);
    }

    #[test]
    fn one_file_per_table() {
        let dir = tempfile::tempdir().unwrap();
        let otf = font(dir.path());
        let written = extract_tables(&otf, dir.path(), &[NAME_TAG, CFF_TAG], true).unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("Acme-Regular._n_a_m_e.ttx"),
                dir.path().join("Acme-Regular.C_F_F_.ttx"),
            ]
        );
        let name = Document::load(&written[0]).unwrap();
        assert_eq!(name.tags().collect::<Vec<_>>(), [NAME_TAG]);
        assert_eq!(name.name().unwrap(), &testdata::name_table());
    }

    #[test]
    fn missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let otf = font(dir.path());
        let gsub = Tag::new(b"GSUB");
        let err = extract_tables(&otf, dir.path(), &[NAME_TAG, gsub], true).unwrap_err();
        assert!(matches!(err, Error::MissingTable(MissingTableError { tag }) if tag == gsub));
        assert!(!dir.path().join("Acme-Regular._n_a_m_e.ttx").exists());
    }
}
