//! Find and replace across the text of the searchable tables.
//!
//! Only the `name` records and the `CFF ` top DICT strings are searched.

use std::path::Path;

use indexmap::IndexSet;
use write_fonts::types::Tag;

use crate::cff::CFF_TAG;
use crate::document::Document;
use crate::error::MissingTableError;
use crate::name::NAME_TAG;
use crate::pipeline::RoundTrip;
use crate::write::WriteOptions;
use crate::Error;

/// Replace `find` in every name record, returning the number of records changed.
pub fn find_and_replace_in_name(
    doc: &mut Document,
    find: &str,
    replace: &str,
) -> Result<usize, MissingTableError> {
    Ok(doc.name_mut()?.find_and_replace(find, replace))
}

/// Replace `find` in the CFF top DICT strings, returning the number of fields
/// changed.
pub fn find_and_replace_in_cff(
    doc: &mut Document,
    find: &str,
    replace: &str,
) -> Result<usize, MissingTableError> {
    Ok(doc.cff_mut()?.find_and_replace(find, replace))
}

/// Replace `find` in each of `tables`, returning the total count.
///
/// A table that is absent, or that is not searchable, contributes nothing.
pub fn find_and_replace(doc: &mut Document, find: &str, replace: &str, tables: &[Tag]) -> usize {
    let mut count = 0;
    for tag in tables.iter().copied().collect::<IndexSet<_>>() {
        let result = match tag {
            NAME_TAG => find_and_replace_in_name(doc, find, replace),
            CFF_TAG => find_and_replace_in_cff(doc, find, replace),
            _ => {
                log::warn!("'{tag}' is not a searchable table");
                continue;
            }
        };
        match result {
            Ok(n) => count += n,
            Err(e) => log::debug!("skipping: {e}"),
        }
    }
    count
}

/// Find and replace in the structured text file at `ttx_path`, in place.
pub fn find_and_replace_in_ttx(
    ttx_path: impl AsRef<Path>,
    find: &str,
    replace: &str,
    tables: &[Tag],
) -> Result<usize, Error> {
    let ttx_path = ttx_path.as_ref();
    let mut doc = Document::load(ttx_path)?;
    let count = find_and_replace(&mut doc, find, replace, tables);
    log::debug!("replaced '{find}' in {count} places in {}", ttx_path.display());
    doc.save(ttx_path, &WriteOptions::default())?;
    Ok(count)
}

/// Find and replace in the binary font at `otf_path`, writing the result to
/// `dest_path`.
pub fn find_and_replace_in_otf(
    otf_path: impl AsRef<Path>,
    dest_path: impl AsRef<Path>,
    find: &str,
    replace: &str,
    tables: &[Tag],
) -> Result<usize, Error> {
    RoundTrip::new()
        .destination(dest_path.as_ref())
        .run(otf_path, |ttx| find_and_replace_in_ttx(ttx, find, replace, tables))
        .map(|outcome| outcome.value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::codec::BinaryFont;
    use crate::document::Table;
    use crate::name::{NameRecord, NameSlot, NameTable};
    use crate::testdata;

    #[test]
    fn targeted_replace() {
        let mut doc = Document::new(testdata::OTTO);
        let name = NameTable::new(vec![NameRecord::windows(NameSlot::FullName, "Acme Regular")]);
        doc.insert(NAME_TAG, Table::Name(name));
        assert_eq!(find_and_replace_in_name(&mut doc, "Acme", "Zenith"), Ok(1));
        assert_eq!(doc.name().unwrap().get(NameSlot::FullName), Some("Zenith Regular"));
        assert_eq!(find_and_replace_in_name(&mut doc, "Acme", "Zenith"), Ok(0));
        assert_eq!(find_and_replace_in_cff(&mut doc, "Acme", "Zenith").unwrap_err().tag, CFF_TAG);
    }

    #[test]
    fn scoped_to_tables() {
        let mut doc = Document::from_binary(&testdata::binary_font());
        assert_eq!(find_and_replace(&mut doc, "Acme", "Zenith", &[CFF_TAG, CFF_TAG]), 3);
        assert_eq!(doc.name().unwrap().get(NameSlot::Family), Some("Acme"));
        assert_eq!(find_and_replace(&mut doc, "Acme", "Zenith", &[NAME_TAG]), 6);
        assert_eq!(find_and_replace(&mut doc, "Acme", "Zenith", &[NAME_TAG, CFF_TAG]), 0);
        assert_eq!(find_and_replace(&mut doc, "", "Zenith", &[NAME_TAG, CFF_TAG]), 0);
        assert_eq!(find_and_replace(&mut doc, "Zenith", "", &[Tag::new(b"post")]), 0);
    }

    #[test]
    fn absent_tables_count_zero() {
        let mut doc = Document::new(testdata::OTTO);
        assert_eq!(find_and_replace(&mut doc, "Acme", "Zenith", &[NAME_TAG, CFF_TAG]), 0);
    }

    #[test]
    fn replace_in_binary() {
        let dir = tempfile::tempdir().unwrap();
        let otf = dir.path().join("Acme-Regular.otf");
        let dest = dir.path().join("Zenith-Regular.otf");
        testdata::binary_font().save(&otf).unwrap();
        let before = std::fs::read(&otf).unwrap();

        let tables = [NAME_TAG, CFF_TAG];
        let count = find_and_replace_in_otf(&otf, &dest, "Acme Regular", "Zenith Bold", &tables);
        assert_eq!(count.unwrap(), 3);
        assert_eq!(std::fs::read(&otf).unwrap(), before);
        assert!(!dir.path().join("Acme-Regular.ttx").exists());

        let doc = Document::from_binary(&BinaryFont::load(&dest).unwrap());
        assert_eq!(doc.name().unwrap().get(NameSlot::FullName), Some("Zenith Bold"));
        assert_eq!(doc.name().unwrap().get(NameSlot::UniqueId), Some("Zenith Bold: 2024"));
        assert_eq!(doc.cff().unwrap().top_dict().full_name.as_deref(), Some("Zenith Bold"));
        let count = find_and_replace_in_otf(&dest, &dest, "Acme Regular", "Zenith Bold", &tables);
        assert_eq!(count.unwrap(), 0);
    }
}
