//! The `CFF ` table and its top DICT strings.
//!
//! Only the six string fields of the top DICT are editable. Everything else
//! in the table is carried through byte for byte; when a string changes, the
//! top DICT and String INDEX are rebuilt and the offsets that point past them
//! are shifted.

use write_fonts::read::tables::cff::Cff;
use write_fonts::read::tables::postscript::dict::{self as ps_dict, Operator};
use write_fonts::read::tables::postscript::{Index1 as ReadIndex1, StringId, STANDARD_STRINGS};
use write_fonts::read::{FontData, FontRead};
use write_fonts::tables::postscript::Index1;
use write_fonts::types::Tag;

use crate::error::CffError;

mod dict;

use dict::Entry;

#[cfg(test)]
pub(crate) use dict::{write_integer, write_offset};

/// The tag of the CFF table.
pub const CFF_TAG: Tag = Tag::new(b"CFF ");

/// An editable string field of the CFF top DICT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopDictField {
    /// `version`
    Version,
    /// `Notice`
    Notice,
    /// `Copyright`
    Copyright,
    /// `FullName`
    FullName,
    /// `FamilyName`
    FamilyName,
    /// `Weight`
    Weight,
}

impl TopDictField {
    /// Every field, in the order they are searched and written.
    pub const ALL: [TopDictField; 6] = [
        TopDictField::Version,
        TopDictField::Notice,
        TopDictField::Copyright,
        TopDictField::FullName,
        TopDictField::FamilyName,
        TopDictField::Weight,
    ];

    /// The field's name as it appears in the structured text.
    pub fn name(self) -> &'static str {
        match self {
            TopDictField::Version => "version",
            TopDictField::Notice => "Notice",
            TopDictField::Copyright => "Copyright",
            TopDictField::FullName => "FullName",
            TopDictField::FamilyName => "FamilyName",
            TopDictField::Weight => "Weight",
        }
    }

    fn operator(self) -> Operator {
        match self {
            TopDictField::Version => Operator::Version,
            TopDictField::Notice => Operator::Notice,
            TopDictField::Copyright => Operator::Copyright,
            TopDictField::FullName => Operator::FullName,
            TopDictField::FamilyName => Operator::FamilyName,
            TopDictField::Weight => Operator::Weight,
        }
    }

    /// The encoded operator.
    fn opcode(self) -> &'static [u8] {
        match self {
            TopDictField::Version => &[0],
            TopDictField::Notice => &[1],
            TopDictField::Copyright => &[12, 0],
            TopDictField::FullName => &[2],
            TopDictField::FamilyName => &[3],
            TopDictField::Weight => &[4],
        }
    }

    fn from_operator(operator: Operator) -> Option<TopDictField> {
        TopDictField::ALL.into_iter().find(|field| field.operator() == operator)
    }

    /// The field a decoded top DICT entry sets, with its string id.
    fn from_entry(entry: &ps_dict::Entry) -> Option<(TopDictField, StringId)> {
        let field = match *entry {
            ps_dict::Entry::Version(sid) => (TopDictField::Version, sid),
            ps_dict::Entry::Notice(sid) => (TopDictField::Notice, sid),
            ps_dict::Entry::Copyright(sid) => (TopDictField::Copyright, sid),
            ps_dict::Entry::FullName(sid) => (TopDictField::FullName, sid),
            ps_dict::Entry::FamilyName(sid) => (TopDictField::FamilyName, sid),
            ps_dict::Entry::Weight(sid) => (TopDictField::Weight, sid),
            _ => return None,
        };
        Some(field)
    }
}

/// The string fields of a CFF top DICT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopDictStrings {
    /// `version`
    pub version: Option<String>,
    /// `Notice`
    pub notice: Option<String>,
    /// `Copyright`
    pub copyright: Option<String>,
    /// `FullName`
    pub full_name: Option<String>,
    /// `FamilyName`
    pub family_name: Option<String>,
    /// `Weight`
    pub weight: Option<String>,
}

impl TopDictStrings {
    /// Returns the value of a field, if present.
    pub fn get(&self, field: TopDictField) -> Option<&str> {
        match field {
            TopDictField::Version => self.version.as_deref(),
            TopDictField::Notice => self.notice.as_deref(),
            TopDictField::Copyright => self.copyright.as_deref(),
            TopDictField::FullName => self.full_name.as_deref(),
            TopDictField::FamilyName => self.family_name.as_deref(),
            TopDictField::Weight => self.weight.as_deref(),
        }
    }

    /// Mutable access to a field.
    pub fn get_mut(&mut self, field: TopDictField) -> &mut Option<String> {
        match field {
            TopDictField::Version => &mut self.version,
            TopDictField::Notice => &mut self.notice,
            TopDictField::Copyright => &mut self.copyright,
            TopDictField::FullName => &mut self.full_name,
            TopDictField::FamilyName => &mut self.family_name,
            TopDictField::Weight => &mut self.weight,
        }
    }
}

/// A CFF table with an editable view of its top DICT strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CffTable {
    top_dict: TopDictStrings,
    source: Vec<u8>,
}

impl CffTable {
    /// Parse a compiled CFF table.
    ///
    /// Fails for malformed data and for CFF tables holding more than one font.
    pub fn from_bytes(data: &[u8]) -> Result<CffTable, CffError> {
        let top_dict = read_top_dict_strings(data)?;
        Ok(CffTable { top_dict, source: data.to_vec() })
    }

    /// Combine compiled data with top DICT strings that may differ from it.
    pub(crate) fn from_parts(source: Vec<u8>, top_dict: TopDictStrings) -> Result<Self, CffError> {
        read_top_dict_strings(&source)?;
        Ok(CffTable { top_dict, source })
    }

    pub(crate) fn source(&self) -> &[u8] {
        &self.source
    }

    /// The top DICT strings.
    pub fn top_dict(&self) -> &TopDictStrings {
        &self.top_dict
    }

    /// Mutable access to the top DICT strings.
    pub fn top_dict_mut(&mut self) -> &mut TopDictStrings {
        &mut self.top_dict
    }

    /// Replace every occurrence of `find` in each top DICT string.
    ///
    /// Returns the number of fields that changed. An empty `find` matches
    /// nothing.
    pub fn find_and_replace(&mut self, find: &str, replace: &str) -> usize {
        if find.is_empty() {
            return 0;
        }
        let mut count = 0;
        for field in TopDictField::ALL {
            if let Some(value) = self.top_dict.get_mut(field) {
                if value.contains(find) {
                    *value = value.replace(find, replace);
                    count += 1;
                }
            }
        }
        count
    }

    /// Compile the table.
    ///
    /// If the strings are unchanged this is the data the table was read from.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CffError> {
        if read_top_dict_strings(&self.source)? == self.top_dict {
            return Ok(self.source.clone());
        }
        rebuild(&self.source, &self.top_dict)
    }
}

/// The parts of a CFF table in front of the global subroutines.
struct Layout<'a> {
    cff: Cff<'a>,
    /// Where the Top DICT INDEX starts; everything before it is kept as is.
    top_dict_index_start: usize,
    top_dict: &'a [u8],
    /// The end of the String INDEX.
    gsubr_start: usize,
}

impl Layout<'_> {
    fn string(&self, sid: StringId) -> Result<String, CffError> {
        self.cff
            .string(sid)
            .map(|string| string.chars().collect())
            .ok_or(CffError::InvalidStringId(sid.to_u16() as i32))
    }

    /// The strings of the String INDEX, in SID order.
    fn custom_strings(&self) -> Result<Vec<Vec<u8>>, CffError> {
        let strings = self.cff.strings();
        (0..strings.count() as usize)
            .map(|i| strings.get(i).map(<[u8]>::to_vec).map_err(CffError::Dict))
            .collect()
    }
}

fn read_layout(data: &[u8]) -> Result<Layout<'_>, CffError> {
    let cff = Cff::read(FontData::new(data)).map_err(CffError::Read)?;
    let header = cff.header();
    if header.major() != 1 {
        return Err(CffError::UnsupportedVersion(header.major()));
    }
    let (names, top_dicts) = (cff.names(), cff.top_dicts());
    if names.count() != 1 || top_dicts.count() != 1 {
        return Err(CffError::FontCount(names.count().max(top_dicts.count()) as usize));
    }
    let size = |index: &ReadIndex1| index.size_in_bytes().map_err(CffError::Read);
    let top_dict_index_start = header.hdr_size() as usize + size(&names)?;
    let gsubr_start = top_dict_index_start + size(&top_dicts)? + size(&cff.strings())?;
    let top_dict = top_dicts.get(0).map_err(CffError::Dict)?;
    Ok(Layout { cff, top_dict_index_start, top_dict, gsubr_start })
}

fn read_top_dict_strings(data: &[u8]) -> Result<TopDictStrings, CffError> {
    let layout = read_layout(data)?;
    let mut strings = TopDictStrings::default();
    for entry in ps_dict::entries(layout.top_dict, None) {
        let entry = entry.map_err(CffError::Dict)?;
        if let Some((field, sid)) = TopDictField::from_entry(&entry) {
            *strings.get_mut(field) = Some(layout.string(sid)?);
        }
    }
    Ok(strings)
}

fn encode_latin1(text: &str) -> Result<Vec<u8>, CffError> {
    text.chars()
        .map(|c| u8::try_from(c as u32).map_err(|_| CffError::NotLatin1(text.to_owned())))
        .collect()
}

/// Find or add a string, returning its string id.
fn intern(strings: &mut Vec<Vec<u8>>, value: Vec<u8>) -> Result<i32, CffError> {
    if let Some(sid) = STANDARD_STRINGS.iter().position(|s| s.as_bytes() == value) {
        return Ok(sid as i32);
    }
    let position = match strings.iter().position(|s| *s == value) {
        Some(position) => position,
        None => {
            strings.push(value);
            strings.len() - 1
        }
    };
    let sid = position + STANDARD_STRINGS.len();
    if sid > u16::MAX as usize {
        return Err(CffError::TooManyStrings);
    }
    Ok(sid as i32)
}

/// Compile `items` into a CFF INDEX.
pub(crate) fn compile_index<T: AsRef<[u8]>>(items: &[T]) -> Result<Vec<u8>, CffError> {
    let count = u16::try_from(items.len()).map_err(|_| CffError::TooManyStrings)?;
    if count == 0 {
        // an empty INDEX is its count alone
        return Ok(vec![0, 0]);
    }
    let data = items.iter().flat_map(|item| item.as_ref()).copied().collect::<Vec<_>>();
    let last = u32::try_from(data.len() + 1)
        .map_err(|_| CffError::OffsetOverflow(data.len() as i64 + 1))?;
    let off_size = match last {
        0..=0xff => 1,
        0x100..=0xffff => 2,
        0x1_0000..=0xff_ffff => 3,
        _ => 4,
    };
    let mut offsets = Vec::with_capacity((items.len() + 1) * off_size);
    let mut offset = 1u32;
    offsets.extend_from_slice(&offset.to_be_bytes()[4 - off_size..]);
    for item in items {
        offset += item.as_ref().len() as u32;
        offsets.extend_from_slice(&offset.to_be_bytes()[4 - off_size..]);
    }
    let index = Index1::new(count, off_size as u8, offsets, data);
    write_fonts::dump_table(&index).map_err(CffError::Compile)
}

/// How a top DICT entry is written back.
enum Rewrite<'a> {
    /// A string field, now pointing at this string id.
    String(TopDictField, i32),
    /// An operator whose operand is an offset into the table.
    Offset { operator: Operator, opcode: &'a [u8], offset: i32 },
    /// Private `[size, offset]`.
    Private { opcode: &'a [u8], size: i32, offset: i32 },
    /// Anything else, copied as read.
    Keep(&'a [u8]),
}

fn classify<'a>(entry: &Entry, dict: &'a [u8]) -> Result<Rewrite<'a>, CffError> {
    let opcode = entry.operator_bytes(dict);
    let keep = Rewrite::Keep(&dict[entry.range.clone()]);
    let rewrite = match entry.operator {
        // predefined charsets and encodings are ids, not offsets
        Operator::Charset if entry.integer()? <= 2 => keep,
        Operator::Encoding if entry.integer()? <= 1 => keep,
        operator @ (Operator::Charset
        | Operator::Encoding
        | Operator::CharstringsOffset
        | Operator::FdArrayOffset
        | Operator::FdSelectOffset) => {
            Rewrite::Offset { operator, opcode, offset: entry.integer()? }
        }
        Operator::PrivateDictRange => {
            let (size, offset) = entry.private()?;
            Rewrite::Private { opcode, size, offset }
        }
        _ => keep,
    };
    Ok(rewrite)
}

fn shift(offset: i32, gsubr_start: usize, delta: i64) -> Result<i32, CffError> {
    if (offset as i64) < gsubr_start as i64 {
        return Err(CffError::UnexpectedOffset(offset as i64));
    }
    let shifted = offset as i64 + delta;
    i32::try_from(shifted).map_err(|_| CffError::OffsetOverflow(shifted))
}

fn encode_top_dict(
    rewrites: &[Rewrite],
    gsubr_start: usize,
    delta: i64,
) -> Result<Vec<u8>, CffError> {
    let mut out = Vec::new();
    for rewrite in rewrites {
        match rewrite {
            Rewrite::String(field, sid) => {
                dict::write_integer(*sid, &mut out);
                out.extend_from_slice(field.opcode());
            }
            Rewrite::Offset { opcode, offset, .. } => {
                dict::write_offset(shift(*offset, gsubr_start, delta)?, &mut out);
                out.extend_from_slice(opcode);
            }
            Rewrite::Private { opcode, size, offset } => {
                dict::write_integer(*size, &mut out);
                dict::write_offset(shift(*offset, gsubr_start, delta)?, &mut out);
                out.extend_from_slice(opcode);
            }
            Rewrite::Keep(bytes) => out.extend_from_slice(bytes),
        }
    }
    Ok(out)
}

fn rebuild(data: &[u8], wanted: &TopDictStrings) -> Result<Vec<u8>, CffError> {
    let layout = read_layout(data)?;
    let entries = dict::entries(layout.top_dict)?;
    let mut strings = layout.custom_strings()?;

    let mut rewrites = Vec::with_capacity(entries.len() + TopDictField::ALL.len());
    let mut seen = Vec::new();
    for entry in &entries {
        if let Some(field) = TopDictField::from_operator(entry.operator) {
            seen.push(field);
            if let Some(text) = wanted.get(field) {
                let sid = intern(&mut strings, encode_latin1(text)?)?;
                rewrites.push(Rewrite::String(field, sid));
            }
        } else {
            rewrites.push(classify(entry, layout.top_dict)?);
        }
    }
    // fields the source did not have go in front, where the string operators
    // conventionally live
    let mut added = Vec::new();
    for field in TopDictField::ALL.into_iter().filter(|f| !seen.contains(f)) {
        if let Some(text) = wanted.get(field) {
            let sid = intern(&mut strings, encode_latin1(text)?)?;
            added.push(Rewrite::String(field, sid));
        }
    }
    added.append(&mut rewrites);
    let rewrites = added;

    let strings_index = compile_index(&strings)?;

    // offsets are written at a fixed width, so the DICT's size does not
    // depend on their values
    let sized = encode_top_dict(&rewrites, layout.gsubr_start, 0)?;
    let sized_index_len = compile_index(&[&sized])?.len();
    let new_gsubr_start = layout.top_dict_index_start + sized_index_len + strings_index.len();
    let delta = new_gsubr_start as i64 - layout.gsubr_start as i64;

    let top_dict = encode_top_dict(&rewrites, layout.gsubr_start, delta)?;
    debug_assert_eq!(top_dict.len(), sized.len());
    let top_dict_index = compile_index(&[&top_dict])?;

    let mut tail = data[layout.gsubr_start..].to_vec();
    for rewrite in &rewrites {
        if let Rewrite::Offset { operator: Operator::FdArrayOffset, offset, .. } = rewrite {
            let fd_array = shift(*offset, layout.gsubr_start, 0)? as usize - layout.gsubr_start;
            shift_font_dict_privates(&mut tail, fd_array, delta)?;
        }
    }

    let mut out = Vec::with_capacity(new_gsubr_start + tail.len());
    out.extend_from_slice(&data[..layout.top_dict_index_start]);
    out.extend_from_slice(&top_dict_index);
    out.extend_from_slice(&strings_index);
    out.extend_from_slice(&tail);
    Ok(out)
}

/// Shift the Private offsets of the Font DICTs in the FDArray at `start`,
/// rewriting each operand in place at its original width.
fn shift_font_dict_privates(tail: &mut [u8], start: usize, delta: i64) -> Result<(), CffError> {
    let mut font_dicts = Vec::new();
    {
        let data = tail.get(start..).ok_or(CffError::Truncated)?;
        let index = ReadIndex1::read(FontData::new(data)).map_err(CffError::Read)?;
        let data_start = start + index.data_byte_range().start;
        for i in 0..index.count() as usize {
            let begin = index.get_offset(i).map_err(CffError::Dict)?;
            let end = index.get_offset(i + 1).map_err(CffError::Dict)?;
            font_dicts.push(data_start + begin..data_start + end);
        }
    }
    for range in font_dicts {
        let font_dict = tail.get(range.clone()).ok_or(CffError::Truncated)?;
        let entries = dict::entries(font_dict)?;
        for entry in entries.iter().filter(|e| e.operator == Operator::PrivateDictRange) {
            let (_, offset) = entry.private()?;
            let shifted = offset as i64 + delta;
            let span = &entry.spans[1];
            let encoded = i32::try_from(shifted)
                .ok()
                .and_then(|value| dict::integer_with_width(value, span.len()))
                .ok_or(CffError::OffsetOverflow(shifted))?;
            let at = range.start + span.start;
            tail[at..at + span.len()].copy_from_slice(&encoded);
        }
    }
    Ok(())
}
