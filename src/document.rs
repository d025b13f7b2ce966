//! The structured document: a font's tables as an editable tree.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use indexmap::IndexMap;
use write_fonts::types::Tag;

use crate::cff::{CffTable, TopDictStrings, CFF_TAG};
use crate::codec::BinaryFont;
use crate::error::{DocumentError, EncodeError, Error, MissingTableError};
use crate::name::{NameRecord, NameTable, NAME_TAG};
use crate::ttx::{self, FontElement, NameRecordElement, TableElement, TopDictElement};
use crate::write::{self, WriteOptions};

/// One table of a [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    /// A naming table.
    Name(NameTable),
    /// A CFF table with editable top DICT strings.
    Cff(CffTable),
    /// Any other table, carried as its compiled bytes.
    Opaque(Vec<u8>),
}

impl Table {
    fn decode(tag: Tag, data: &[u8]) -> Table {
        match tag {
            NAME_TAG => match NameTable::from_bytes(data) {
                Some(name) => Table::Name(name),
                None => {
                    log::debug!("keeping the 'name' table as raw data");
                    Table::Opaque(data.to_vec())
                }
            },
            CFF_TAG => match CffTable::from_bytes(data) {
                Ok(cff) => Table::Cff(cff),
                Err(e) => {
                    log::warn!("keeping the 'CFF ' table as raw data: {e}");
                    Table::Opaque(data.to_vec())
                }
            },
            _ => Table::Opaque(data.to_vec()),
        }
    }

    /// Compile the table.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        match self {
            Table::Name(name) => name.to_bytes(),
            Table::Cff(cff) => cff.to_bytes().map_err(EncodeError::Cff),
            Table::Opaque(data) => Ok(data.clone()),
        }
    }

    fn to_element(&self, tag: Tag) -> TableElement {
        let mut element = TableElement {
            tag: ttx::tag_to_string(tag),
            name_records: Vec::new(),
            top_dict: None,
            data: None,
        };
        match self {
            Table::Name(name) => {
                element.name_records = name
                    .records()
                    .iter()
                    .map(|record| NameRecordElement {
                        name_id: record.name_id,
                        platform_id: record.platform_id,
                        encoding_id: record.encoding_id,
                        language_id: record.language_id,
                        text: record.text.clone(),
                    })
                    .collect();
                element.data = name.source().map(|data| BASE64.encode(data));
            }
            Table::Cff(cff) => {
                let top = cff.top_dict().clone();
                element.top_dict = Some(TopDictElement {
                    version: top.version,
                    notice: top.notice,
                    copyright: top.copyright,
                    full_name: top.full_name,
                    family_name: top.family_name,
                    weight: top.weight,
                });
                element.data = Some(BASE64.encode(cff.source()));
            }
            Table::Opaque(data) => element.data = Some(BASE64.encode(data)),
        }
        element
    }

    fn from_element(tag: Tag, element: TableElement) -> Result<Table, DocumentError> {
        let data = element
            .data
            .map(|text| BASE64.decode(text.trim()).map_err(|e| DocumentError::InvalidData(tag, e)))
            .transpose()?;
        let table = match tag {
            NAME_TAG => {
                let records = element
                    .name_records
                    .into_iter()
                    .map(|record| NameRecord {
                        name_id: record.name_id,
                        platform_id: record.platform_id,
                        encoding_id: record.encoding_id,
                        language_id: record.language_id,
                        text: record.text,
                    })
                    .collect::<Vec<_>>();
                match data {
                    Some(data) if records.is_empty() && NameTable::from_bytes(&data).is_none() => {
                        Table::Opaque(data)
                    }
                    Some(data) => Table::Name(NameTable::with_source(records, data)),
                    None => Table::Name(NameTable::new(records)),
                }
            }
            CFF_TAG => {
                let data = data.ok_or(DocumentError::MissingData(tag))?;
                match element.top_dict {
                    Some(top) => {
                        let strings = TopDictStrings {
                            version: top.version,
                            notice: top.notice,
                            copyright: top.copyright,
                            full_name: top.full_name,
                            family_name: top.family_name,
                            weight: top.weight,
                        };
                        Table::Cff(CffTable::from_parts(data, strings).map_err(DocumentError::Cff)?)
                    }
                    None => Table::Opaque(data),
                }
            }
            _ => Table::Opaque(data.unwrap_or_default()),
        };
        Ok(table)
    }
}

/// A font as a tree of tables, at most one per tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    sfnt_version: u32,
    tables: IndexMap<Tag, Table>,
}

impl Document {
    /// Create an empty document.
    pub fn new(sfnt_version: u32) -> Self {
        Document { sfnt_version, tables: IndexMap::new() }
    }

    /// Build a document from a decoded font.
    ///
    /// `name` and `CFF ` tables become editable where they can be represented
    /// faithfully; every other table is kept as is. Tables are held in the
    /// font's layout order, which the text form and [`Document::to_binary`]
    /// keep.
    pub fn from_binary(font: &BinaryFont) -> Document {
        let tables = font.tables().map(|(tag, data)| (tag, Table::decode(tag, data))).collect();
        Document { sfnt_version: font.sfnt_version(), tables }
    }

    /// Compile every table into a [`BinaryFont`].
    pub fn to_binary(&self) -> Result<BinaryFont, EncodeError> {
        let mut font = BinaryFont::new(self.sfnt_version);
        for (tag, table) in &self.tables {
            font.insert_table(*tag, table.to_bytes()?);
        }
        Ok(font)
    }

    /// Load a document from a structured text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Document, Error> {
        let path = path.as_ref();
        let to_error = |e: DocumentError| Error::Encode { path: path.into(), source: e.into() };
        let reader = BufReader::new(File::open(path).map_err(|e| to_error(DocumentError::Io(e)))?);
        let element: FontElement =
            quick_xml::de::from_reader(reader).map_err(|e| to_error(DocumentError::Xml(e)))?;
        Document::from_element(element).map_err(to_error)
    }

    /// Parse a document from structured text.
    pub fn from_xml(xml: &str) -> Result<Document, DocumentError> {
        let element: FontElement = quick_xml::de::from_str(xml).map_err(DocumentError::Xml)?;
        Document::from_element(element)
    }

    fn from_element(element: FontElement) -> Result<Document, DocumentError> {
        let sfnt_version = ttx::sfnt_version_from_str(&element.sfnt_version)
            .ok_or(DocumentError::InvalidSfntVersion(element.sfnt_version))?;
        let mut doc = Document::new(sfnt_version);
        for table in element.tables {
            let tag = ttx::tag_from_str(&table.tag)
                .ok_or_else(|| DocumentError::InvalidTag(table.tag.clone()))?;
            if doc.tables.contains_key(&tag) {
                return Err(DocumentError::DuplicateTable(tag));
            }
            doc.tables.insert(tag, Table::from_element(tag, table)?);
        }
        Ok(doc)
    }

    fn to_element(&self) -> FontElement {
        FontElement {
            sfnt_version: ttx::sfnt_version_to_string(self.sfnt_version),
            tables: self.tables.iter().map(|(tag, table)| table.to_element(*tag)).collect(),
        }
    }

    /// Serialize the document as structured text.
    pub fn to_xml(&self, options: &WriteOptions) -> Result<String, quick_xml::SeError> {
        write::to_xml_string(&self.to_element(), options)
    }

    /// Write the document to a structured text file.
    pub fn save(&self, path: impl AsRef<Path>, options: &WriteOptions) -> Result<(), Error> {
        let path = path.as_ref();
        log::debug!("writing {}", path.display());
        write::write_xml_to_file(path, &self.to_element(), options)
    }

    /// The sfnt version of the font.
    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    /// Returns the table with this tag.
    pub fn get(&self, tag: Tag) -> Option<&Table> {
        self.tables.get(&tag)
    }

    /// Returns the table with this tag, mutably.
    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut Table> {
        self.tables.get_mut(&tag)
    }

    /// Insert a table, replacing and returning any table with the same tag.
    pub fn insert(&mut self, tag: Tag, table: Table) -> Option<Table> {
        self.tables.insert(tag, table)
    }

    /// Remove a table.
    pub fn remove(&mut self, tag: Tag) -> Option<Table> {
        self.tables.shift_remove(&tag)
    }

    /// The tags of the tables, in document order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tables.keys().copied()
    }

    /// The naming table.
    pub fn name(&self) -> Result<&NameTable, MissingTableError> {
        match self.tables.get(&NAME_TAG) {
            Some(Table::Name(name)) => Ok(name),
            _ => Err(MissingTableError::new(NAME_TAG)),
        }
    }

    /// The naming table, mutably.
    pub fn name_mut(&mut self) -> Result<&mut NameTable, MissingTableError> {
        match self.tables.get_mut(&NAME_TAG) {
            Some(Table::Name(name)) => Ok(name),
            _ => Err(MissingTableError::new(NAME_TAG)),
        }
    }

    /// The CFF table.
    pub fn cff(&self) -> Result<&CffTable, MissingTableError> {
        match self.tables.get(&CFF_TAG) {
            Some(Table::Cff(cff)) => Ok(cff),
            _ => Err(MissingTableError::new(CFF_TAG)),
        }
    }

    /// The CFF table, mutably.
    pub fn cff_mut(&mut self) -> Result<&mut CffTable, MissingTableError> {
        match self.tables.get_mut(&CFF_TAG) {
            Some(Table::Cff(cff)) => Ok(cff),
            _ => Err(MissingTableError::new(CFF_TAG)),
        }
    }

    /// A new document holding copies of the tables with the given tags.
    pub fn subset(&self, tags: &[Tag]) -> Result<Document, MissingTableError> {
        let mut subset = Document::new(self.sfnt_version);
        for tag in tags {
            let table = self.tables.get(tag).ok_or(MissingTableError::new(*tag))?;
            subset.tables.insert(*tag, table.clone());
        }
        Ok(subset)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::name::NameSlot;
    use crate::testdata;

    fn document() -> Document {
        Document::from_binary(&testdata::binary_font())
    }

    #[test]
    fn typed_and_opaque_tables() {
        let doc = document();
        assert!(matches!(doc.get(NAME_TAG), Some(Table::Name(_))));
        assert!(matches!(doc.get(CFF_TAG), Some(Table::Cff(_))));
        assert!(matches!(doc.get(Tag::new(b"post")), Some(Table::Opaque(_))));
        // tables keep the order their data is laid out in
        let tags = doc.tags().collect::<Vec<_>>();
        assert_eq!(tags, [Tag::new(b"head"), NAME_TAG, CFF_TAG, Tag::new(b"post")]);
    }

    #[test]
    fn text_round_trip() {
        let doc = document();
        let xml = doc.to_xml(&WriteOptions::default()).unwrap();
        let parsed = Document::from_xml(&xml).unwrap();
        assert_eq!(parsed, doc);
        assert_eq!(parsed.to_binary().unwrap(), doc.to_binary().unwrap());
        assert_eq!(doc.to_binary().unwrap(), testdata::binary_font());
    }

    #[test]
    fn strip_value_survives_text() {
        let mut doc = document();
        doc.name_mut().unwrap().strip_ids([NameSlot::Family]);
        let xml = doc.to_xml(&WriteOptions::default()).unwrap();
        let parsed = Document::from_xml(&xml).unwrap();
        assert_eq!(parsed.name().unwrap().get(NameSlot::Family), Some(" "));
    }

    #[test]
    fn edits_in_text_reach_the_binary() {
        let xml = document().to_xml(&WriteOptions::default()).unwrap();
        let xml =
            xml.replace("Version 1.000", "Version 2.000").replace("Acme Regular", "Acme Bold");
        let font = Document::from_xml(&xml).unwrap().to_binary().unwrap();
        let reread = Document::from_binary(&font);
        assert_eq!(reread.name().unwrap().get(NameSlot::Version), Some("Version 2.000"));
        assert_eq!(reread.cff().unwrap().top_dict().full_name.as_deref(), Some("Acme Bold"));
    }

    #[test]
    fn missing_tables() {
        let mut doc = Document::new(testdata::OTTO);
        doc.insert(Tag::new(b"head"), Table::Opaque(testdata::head_table()));
        assert_eq!(doc.name().unwrap_err(), MissingTableError::new(NAME_TAG));
        assert_eq!(doc.cff_mut().unwrap_err().tag, CFF_TAG);
        assert!(doc.subset(&[NAME_TAG]).is_err());
        let subset = doc.subset(&[Tag::new(b"head")]).unwrap();
        assert_eq!(subset.tags().count(), 1);
    }

    #[test]
    fn opaque_name_table_stays_opaque() {
        let mut bytes = testdata::name_table().to_bytes().unwrap();
        bytes[1] = 1;
        let mut doc = Document::new(testdata::OTTO);
        doc.insert(NAME_TAG, Table::decode(NAME_TAG, &bytes));
        assert!(matches!(doc.get(NAME_TAG), Some(Table::Opaque(_))));
        let xml = doc.to_xml(&WriteOptions::default()).unwrap();
        assert_eq!(Document::from_xml(&xml).unwrap(), doc);
    }

    #[test]
    fn malformed_text() {
        assert!(matches!(Document::from_xml("<ttFont"), Err(DocumentError::Xml(_))));
        assert!(matches!(
            Document::from_xml(r#"<ttFont sfntVersion="1"/>"#),
            Err(DocumentError::InvalidSfntVersion(_))
        ));
        assert!(matches!(
            Document::from_xml(r#"<ttFont sfntVersion="OTTO"><table tag="nm"/></ttFont>"#),
            Err(DocumentError::InvalidTag(_))
        ));
        assert!(matches!(
            Document::from_xml(
                r#"<ttFont sfntVersion="OTTO"><table tag="CFF "><topDict/></table></ttFont>"#
            ),
            Err(DocumentError::MissingData(_))
        ));
        let duplicate = r#"<ttFont sfntVersion="OTTO">
            <table tag="post"><data>AAMAAA==</data></table>
            <table tag="post"><data>AAMAAA==</data></table>
        </ttFont>"#;
        assert!(matches!(Document::from_xml(duplicate), Err(DocumentError::DuplicateTable(_))));
    }

    #[test]
    fn serialized_shape() {
        let mut doc = Document::new(0x0001_0000);
        doc.insert(
            NAME_TAG,
            Table::Name(NameTable::new(vec![NameRecord::windows(NameSlot::Family, "Acme")])),
        );
        doc.insert(Tag::new(b"post"), Table::Opaque(vec![0, 3, 0, 0]));
        let xml = doc.to_xml(&WriteOptions::default()).unwrap();
        expect_test::expect![[r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <ttFont sfntVersion="0x00010000">
              <table tag="name">
                <namerecord nameID="1" platformID="3" platEncID="1" langID="1033" string="Acme"/>
              </table>
              <table tag="post">
                <data>AAMAAA==</data>
              </table>
            </ttFont>
        "#]]
        .assert_eq(&xml);
    }
}
