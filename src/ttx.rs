//! The XML shape of the structured text form.
//!
//! ```xml
//! <ttFont sfntVersion="OTTO">
//!   <table tag="name">
//!     <namerecord nameID="1" platformID="3" platEncID="1" langID="1033" string="Acme"/>
//!     <data>AAAAAQAS...</data>
//!   </table>
//!   <table tag="CFF ">
//!     <topDict version="1.000" FullName="Acme Regular" FamilyName="Acme"/>
//!     <data>AQAEBAAB...</data>
//!   </table>
//!   <table tag="head">
//!     <data>AAEAAAAB...</data>
//!   </table>
//! </ttFont>
//! ```
//!
//! Name strings are attributes rather than text so that leading and trailing
//! whitespace survive parsing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ttFont")]
pub(crate) struct FontElement {
    #[serde(rename = "@sfntVersion")]
    pub(crate) sfnt_version: String,
    #[serde(rename = "table", default)]
    pub(crate) tables: Vec<TableElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TableElement {
    #[serde(rename = "@tag")]
    pub(crate) tag: String,
    #[serde(rename = "namerecord", default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) name_records: Vec<NameRecordElement>,
    #[serde(rename = "topDict", default, skip_serializing_if = "Option::is_none")]
    pub(crate) top_dict: Option<TopDictElement>,
    /// Base64 table data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct NameRecordElement {
    #[serde(rename = "@nameID")]
    pub(crate) name_id: u16,
    #[serde(rename = "@platformID")]
    pub(crate) platform_id: u16,
    #[serde(rename = "@platEncID")]
    pub(crate) encoding_id: u16,
    #[serde(rename = "@langID")]
    pub(crate) language_id: u16,
    #[serde(rename = "@string")]
    pub(crate) text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct TopDictElement {
    #[serde(rename = "@version", default, skip_serializing_if = "Option::is_none")]
    pub(crate) version: Option<String>,
    #[serde(rename = "@Notice", default, skip_serializing_if = "Option::is_none")]
    pub(crate) notice: Option<String>,
    #[serde(rename = "@Copyright", default, skip_serializing_if = "Option::is_none")]
    pub(crate) copyright: Option<String>,
    #[serde(rename = "@FullName", default, skip_serializing_if = "Option::is_none")]
    pub(crate) full_name: Option<String>,
    #[serde(rename = "@FamilyName", default, skip_serializing_if = "Option::is_none")]
    pub(crate) family_name: Option<String>,
    #[serde(rename = "@Weight", default, skip_serializing_if = "Option::is_none")]
    pub(crate) weight: Option<String>,
}

/// Render a tag with one char per byte, so that it parses back losslessly.
pub(crate) fn tag_to_string(tag: write_fonts::types::Tag) -> String {
    tag.to_be_bytes().iter().map(|b| *b as char).collect()
}

pub(crate) fn tag_from_str(s: &str) -> Option<write_fonts::types::Tag> {
    let bytes = s.chars().map(|c| u8::try_from(c as u32).ok()).collect::<Option<Vec<_>>>()?;
    let bytes: [u8; 4] = bytes.try_into().ok()?;
    Some(write_fonts::types::Tag::new(&bytes))
}

/// `OTTO` and `true` are written as text, anything else as hex.
pub(crate) fn sfnt_version_to_string(version: u32) -> String {
    let bytes = version.to_be_bytes();
    if bytes.iter().all(u8::is_ascii_alphanumeric) {
        bytes.iter().map(|b| *b as char).collect()
    } else {
        format!("{version:#010x}")
    }
}

pub(crate) fn sfnt_version_from_str(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x") {
        return u32::from_str_radix(hex, 16).ok();
    }
    let bytes: [u8; 4] = s.as_bytes().try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}
