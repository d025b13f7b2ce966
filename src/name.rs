//! The `name` table.

use std::collections::BTreeSet;

use write_fonts::read::tables::name::{Encoding, MacRomanMapping, Name as ReadName};
use write_fonts::read::{FontData, FontRead};
use write_fonts::tables::name::{Name, NameRecord as WriteNameRecord};
use write_fonts::types::{NameId, Tag};
use write_fonts::OffsetMarker;

use crate::error::EncodeError;

/// The tag of the naming table.
pub const NAME_TAG: Tag = Tag::new(b"name");

/// Name ids [`strip_names`](crate::strip_names) blanks out.
///
/// These are the family, subfamily, full name, typographic family,
/// typographic subfamily and compatible full name slots.
pub const STRIPPABLE_NAME_IDS: [u16; 6] = [
    NameSlot::Family as u16,
    NameSlot::Subfamily as u16,
    NameSlot::FullName as u16,
    NameSlot::TypographicFamily as u16,
    NameSlot::TypographicSubfamily as u16,
    NameSlot::CompatibleFullName as u16,
];

/// Well-known name ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum NameSlot {
    /// Font family name (1).
    Family = 1,
    /// Font subfamily name (2).
    Subfamily = 2,
    /// Unique font identifier (3).
    UniqueId = 3,
    /// Full font name (4).
    FullName = 4,
    /// Version string (5).
    Version = 5,
    /// Typographic family name (16).
    TypographicFamily = 16,
    /// Typographic subfamily name (17).
    TypographicSubfamily = 17,
    /// Compatible full name, Macintosh only (18).
    CompatibleFullName = 18,
}

impl From<NameSlot> for u16 {
    fn from(slot: NameSlot) -> u16 {
        slot as u16
    }
}

/// A single entry of the naming table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    /// The name id, e.g. `5` for the version string.
    pub name_id: u16,
    /// Platform id.
    pub platform_id: u16,
    /// Platform-specific encoding id.
    pub encoding_id: u16,
    /// Language id.
    pub language_id: u16,
    /// The decoded string.
    pub text: String,
}

impl NameRecord {
    /// Create a Windows, Unicode BMP, English (US) record.
    pub fn windows(name_id: impl Into<u16>, text: impl Into<String>) -> Self {
        NameRecord {
            name_id: name_id.into(),
            platform_id: 3,
            encoding_id: 1,
            language_id: 0x409,
            text: text.into(),
        }
    }

    /// Create a Macintosh, Roman, English record.
    pub fn mac(name_id: impl Into<u16>, text: impl Into<String>) -> Self {
        NameRecord {
            name_id: name_id.into(),
            platform_id: 1,
            encoding_id: 0,
            language_id: 0,
            text: text.into(),
        }
    }

    /// The compiler panics on text it cannot encode, so refuse it here.
    fn check_encodable(&self) -> Result<(), EncodeError> {
        match Encoding::new(self.platform_id, self.encoding_id) {
            Encoding::Utf16Be => Ok(()),
            Encoding::MacRoman => {
                if self.text.chars().any(|c| MacRomanMapping.encode(c).is_none()) {
                    let text = self.text.clone();
                    return Err(EncodeError::NotMacRoman { name_id: self.name_id, text });
                }
                Ok(())
            }
            Encoding::Unknown => Err(EncodeError::UnsupportedEncoding {
                platform_id: self.platform_id,
                encoding_id: self.encoding_id,
            }),
        }
    }

    fn encoded_len(&self) -> usize {
        match Encoding::new(self.platform_id, self.encoding_id) {
            Encoding::Utf16Be => self.text.encode_utf16().count() * 2,
            _ => self.text.chars().count(),
        }
    }
}

/// A decoded naming table.
///
/// The table remembers the bytes it was decoded from; as long as its records
/// are unchanged, those bytes are what [`NameTable::to_bytes`] returns.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    records: Vec<NameRecord>,
    source: Option<Vec<u8>>,
}

impl PartialEq for NameTable {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl NameTable {
    /// Create a table from records.
    pub fn new(records: Vec<NameRecord>) -> Self {
        NameTable { records, source: None }
    }

    /// Decode a compiled naming table.
    ///
    /// Returns `None` for tables that cannot be represented faithfully as a
    /// list of records: version 1 tables with language tags, records in an
    /// encoding we cannot decode, or data that fails to parse.
    pub fn from_bytes(data: &[u8]) -> Option<NameTable> {
        let records = decode_records(data)?;
        Some(NameTable { records, source: Some(data.to_vec()) })
    }

    pub(crate) fn with_source(records: Vec<NameRecord>, source: Vec<u8>) -> NameTable {
        NameTable { records, source: Some(source) }
    }

    pub(crate) fn source(&self) -> Option<&[u8]> {
        self.source.as_deref()
    }

    /// Compile the table.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        if let Some(source) = &self.source {
            if decode_records(source).as_ref() == Some(&self.records) {
                return Ok(source.clone());
            }
        }
        self.compile()
    }

    fn compile(&self) -> Result<Vec<u8>, EncodeError> {
        if let Some(record) = self.records.iter().find(|r| r.encoded_len() > u16::MAX as usize) {
            let length = record.encoded_len();
            return Err(EncodeError::NameTooLong { name_id: record.name_id, length });
        }
        for record in &self.records {
            record.check_encodable()?;
        }
        let mut records = self
            .records
            .iter()
            .map(|record| WriteNameRecord {
                name_id: NameId::new(record.name_id),
                platform_id: record.platform_id,
                encoding_id: record.encoding_id,
                language_id: record.language_id,
                string: OffsetMarker::new(record.text.clone()),
            })
            .collect::<Vec<_>>();
        records.sort_by_key(|r| (r.platform_id, r.encoding_id, r.language_id, r.name_id));
        let table = Name::new(records);
        write_fonts::dump_table(&table).map_err(EncodeError::Name)
    }

    /// The records, in table order.
    pub fn records(&self) -> &[NameRecord] {
        &self.records
    }

    /// Mutable access to the records.
    pub fn records_mut(&mut self) -> &mut Vec<NameRecord> {
        &mut self.records
    }

    /// Iterate over the records with the given name id.
    pub fn records_with_id(&self, name_id: impl Into<u16>) -> impl Iterator<Item = &NameRecord> {
        let name_id = name_id.into();
        self.records.iter().filter(move |r| r.name_id == name_id)
    }

    /// The first record with this id, Windows records first.
    pub fn get(&self, name_id: impl Into<u16>) -> Option<&str> {
        let name_id = name_id.into();
        self.records_with_id(name_id)
            .find(|r| r.platform_id == 3)
            .or_else(|| self.records_with_id(name_id).next())
            .map(|r| r.text.as_str())
    }

    /// Set the text of every record whose id is in `ids` to a single space.
    ///
    /// Returns the number of records that matched.
    pub fn strip_ids<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<u16>,
    {
        let ids = ids.into_iter().map(Into::into).collect::<BTreeSet<u16>>();
        let mut count = 0;
        for record in self.records.iter_mut().filter(|r| ids.contains(&r.name_id)) {
            record.text = String::from(" ");
            count += 1;
        }
        count
    }

    /// Set the text of every record with this id.
    ///
    /// Records are never created; if no record has the id this does nothing.
    /// Returns the number of records that matched.
    pub fn set_text(&mut self, name_id: impl Into<u16>, text: &str) -> usize {
        let name_id = name_id.into();
        let mut count = 0;
        for record in self.records.iter_mut().filter(|r| r.name_id == name_id) {
            record.text = text.to_owned();
            count += 1;
        }
        count
    }

    /// Replace every occurrence of `find` in every record.
    ///
    /// Returns the number of records that changed. An empty `find` matches
    /// nothing.
    pub fn find_and_replace(&mut self, find: &str, replace: &str) -> usize {
        if find.is_empty() {
            return 0;
        }
        let mut count = 0;
        for record in self.records.iter_mut().filter(|r| r.text.contains(find)) {
            record.text = record.text.replace(find, replace);
            count += 1;
        }
        count
    }
}

fn decode_records(data: &[u8]) -> Option<Vec<NameRecord>> {
    let name = ReadName::read(FontData::new(data)).ok()?;
    if name.version() != 0 {
        log::debug!("name table version {} kept as raw data", name.version());
        return None;
    }
    let strings = name.string_data();
    name.name_record()
        .iter()
        .map(|record| {
            if Encoding::new(record.platform_id(), record.encoding_id()) == Encoding::Unknown {
                log::debug!(
                    "name table has records in unknown encoding ({}, {})",
                    record.platform_id(),
                    record.encoding_id()
                );
                return None;
            }
            let text = record.string(strings).ok()?.chars().collect();
            Some(NameRecord {
                name_id: record.name_id().to_u16(),
                platform_id: record.platform_id(),
                encoding_id: record.encoding_id(),
                language_id: record.language_id(),
                text,
            })
        })
        .collect()
}
