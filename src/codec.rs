//! Decoding and assembling compiled fonts.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use indexmap::IndexMap;
use log::LevelFilter;
use write_fonts::read::tables::compute_checksum;
use write_fonts::read::FontRef;
use write_fonts::types::Tag;
use write_fonts::validate::{Validate, ValidationCtx};
use write_fonts::{FontWrite, TableWriter};

use crate::error::{DecodeError, EncodeError, Error};

const HEAD: Tag = Tag::new(b"head");
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;
const CHECKSUM_ADJUSTMENT: std::ops::Range<usize> = 8..12;
const TABLE_RECORDS_START: usize = 12;
const TABLE_RECORD_LEN: usize = 16;
/// The most tables whose directory search fields fit in 16 bits.
const MAX_TABLES: usize = 4095;

/// The tables of a compiled font, in the order their data is laid out.
///
/// Every table is copied out of the source file when the font is decoded, so
/// a `BinaryFont` never refers back to the data it came from and every table
/// is written out by [`BinaryFont::to_bytes`]. Decoded tables keep the
/// placement they had in the source file, so a font that is decoded and
/// assembled again comes out with the same layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFont {
    sfnt_version: u32,
    tables: IndexMap<Tag, Vec<u8>>,
}

impl BinaryFont {
    /// Create an empty font with the given sfnt version.
    pub fn new(sfnt_version: u32) -> Self {
        BinaryFont { sfnt_version, tables: IndexMap::new() }
    }

    /// Decode a compiled font.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let _quiet = QuietCodec::acquire();
        let font = FontRef::new(data).map_err(DecodeError::Read)?;
        let mut records = font.table_directory.table_records().to_vec();
        records.sort_by_key(|record| record.offset());
        let mut tables = IndexMap::with_capacity(records.len());
        for record in records {
            let tag = record.tag();
            let table = font.table_data(tag).ok_or(DecodeError::TableOutOfBounds(tag))?;
            tables.insert(tag, table.as_bytes().to_vec());
        }
        Ok(BinaryFont { sfnt_version: font.table_directory.sfnt_version(), tables })
    }

    /// Load a compiled font from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        log::debug!("decoding {}", path.display());
        let data = fs::read(path).map_err(|source| Error::Decode {
            path: path.into(),
            source: DecodeError::Io(source),
        })?;
        BinaryFont::from_bytes(&data)
            .map_err(|source| Error::Decode { path: path.into(), source })
    }

    /// Assemble the compiled font.
    ///
    /// Table data is written in the order the tables are held, each padded to
    /// four bytes, behind a directory sorted by tag. The sfnt version is
    /// preserved; the table checksums and `head.checkSumAdjustment` are
    /// recomputed.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        if self.tables.len() > MAX_TABLES {
            return Err(EncodeError::TooManyTables(self.tables.len()));
        }
        let _quiet = QuietCodec::acquire();
        let tables = self
            .tables
            .iter()
            .map(|(tag, data)| (*tag, without_checksum_adjustment(*tag, data)))
            .collect::<Vec<_>>();

        let mut position = TABLE_RECORDS_START + tables.len() * TABLE_RECORD_LEN;
        let mut head_at = None;
        let mut records = Vec::with_capacity(tables.len());
        for (tag, data) in &tables {
            if *tag == HEAD && data.len() >= CHECKSUM_ADJUSTMENT.end {
                head_at = Some(position);
            }
            let too_large = |_| EncodeError::TooLarge(position + data.len());
            records.push(DirectoryRecord {
                tag: *tag,
                checksum: compute_checksum(data),
                offset: u32::try_from(position).map_err(too_large)?,
                length: u32::try_from(data.len()).map_err(too_large)?,
            });
            position += round4(data.len());
        }
        records.sort_unstable_by_key(|record| record.tag);

        let directory = TableDirectory { sfnt_version: self.sfnt_version, records };
        let mut bytes = write_fonts::dump_table(&directory).map_err(EncodeError::Directory)?;
        bytes.reserve(position.saturating_sub(bytes.len()));
        for (_, data) in &tables {
            bytes.extend_from_slice(data);
            bytes.resize(round4(bytes.len()), 0);
        }

        match head_at {
            Some(head) => {
                let adjustment = CHECKSUM_MAGIC.wrapping_sub(compute_checksum(&bytes));
                let field = head + CHECKSUM_ADJUSTMENT.start..head + CHECKSUM_ADJUSTMENT.end;
                bytes[field].copy_from_slice(&adjustment.to_be_bytes());
            }
            None if self.tables.contains_key(&HEAD) => {
                log::warn!("'head' table is too short to hold checkSumAdjustment");
            }
            None => (),
        }
        Ok(bytes)
    }

    /// Write the compiled font to `path`.
    ///
    /// The font is fully assembled in memory first and written to a sibling
    /// file that is renamed over `path`, so a failure never leaves a partial
    /// font behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let bytes =
            self.to_bytes().map_err(|source| Error::Encode { path: path.into(), source })?;
        write_replacing(path, &bytes)
    }

    /// The sfnt version, e.g. `0x00010000` or `OTTO`.
    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    /// Returns the data for the table with the given tag.
    pub fn table(&self, tag: Tag) -> Option<&[u8]> {
        self.tables.get(&tag).map(Vec::as_slice)
    }

    /// Returns `true` if the font has a table with this tag.
    pub fn contains_table(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// Insert a table, returning the data it replaced.
    ///
    /// A replaced table keeps its place in the layout; a new one is laid out
    /// after the others.
    pub fn insert_table(&mut self, tag: Tag, data: Vec<u8>) -> Option<Vec<u8>> {
        self.tables.insert(tag, data)
    }

    /// Remove a table.
    pub fn remove_table(&mut self, tag: Tag) -> Option<Vec<u8>> {
        self.tables.shift_remove(&tag)
    }

    /// Iterate over tables in layout order.
    pub fn tables(&self) -> impl Iterator<Item = (Tag, &[u8])> + '_ {
        self.tables.iter().map(|(tag, data)| (*tag, data.as_slice()))
    }
}

/// `head` is checksummed with its checkSumAdjustment zeroed.
fn without_checksum_adjustment(tag: Tag, data: &[u8]) -> Cow<'_, [u8]> {
    if tag != HEAD || data.len() < CHECKSUM_ADJUSTMENT.end {
        return Cow::Borrowed(data);
    }
    let mut head = data.to_vec();
    head[CHECKSUM_ADJUSTMENT].fill(0);
    Cow::Owned(head)
}

fn round4(len: usize) -> usize {
    (len + 3) & !3
}

/// The sfnt header and its table records.
struct TableDirectory {
    sfnt_version: u32,
    records: Vec<DirectoryRecord>,
}

struct DirectoryRecord {
    tag: Tag,
    checksum: u32,
    offset: u32,
    length: u32,
}

impl FontWrite for TableDirectory {
    fn write_into(&self, writer: &mut TableWriter) {
        // at most MAX_TABLES, checked by `validate_impl`
        let num_tables = self.records.len() as u16;
        let entry_selector = num_tables.checked_ilog2().unwrap_or(0) as u16;
        let search_range = (TABLE_RECORD_LEN as u16) << entry_selector;
        let range_shift = (num_tables * TABLE_RECORD_LEN as u16).saturating_sub(search_range);
        self.sfnt_version.write_into(writer);
        num_tables.write_into(writer);
        search_range.write_into(writer);
        entry_selector.write_into(writer);
        range_shift.write_into(writer);
        for record in &self.records {
            record.tag.write_into(writer);
            record.checksum.write_into(writer);
            record.offset.write_into(writer);
            record.length.write_into(writer);
        }
    }
}

impl Validate for TableDirectory {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.records.len() > MAX_TABLES {
            ctx.report(format!("{} tables, the limit is {MAX_TABLES}", self.records.len()));
        }
    }
}

/// Write `bytes` to a sibling of `path`, then rename it into place.
pub(crate) fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let partial = partial_path(path);
    if let Err(e) = fs::write(&partial, bytes) {
        let _ = fs::remove_file(&partial);
        return Err(Error::io(&partial, e));
    }
    fs::rename(&partial, path).map_err(|e| {
        let _ = fs::remove_file(&partial);
        Error::io(path, e)
    })
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Silences `log` output below the error level while held.
///
/// The codec crates report recoverable oddities through `log`; while one of
/// their calls is in flight those reports are suppressed. `log` only has a
/// process-wide maximum level, so while any guard is alive, records below the
/// error level are dropped on every thread, this crate's own warnings
/// included. Guards nest, and the level in effect before the outermost guard
/// is restored when it is dropped, even on unwind.
pub(crate) struct QuietCodec(());

/// The live guard count and the level to restore when it reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QuietState {
    guards: usize,
    restore: LevelFilter,
}

impl QuietState {
    /// Returns the level to switch to when this is the outermost guard.
    fn enter(&mut self, current: LevelFilter) -> Option<LevelFilter> {
        self.guards += 1;
        if self.guards > 1 {
            return None;
        }
        self.restore = current;
        Some(current.min(LevelFilter::Error))
    }

    /// Returns the level to restore when the last guard is gone.
    fn exit(&mut self) -> Option<LevelFilter> {
        self.guards = self.guards.saturating_sub(1);
        (self.guards == 0).then_some(self.restore)
    }
}

static QUIET_STATE: Mutex<QuietState> =
    Mutex::new(QuietState { guards: 0, restore: LevelFilter::Off });

impl QuietCodec {
    pub(crate) fn acquire() -> Self {
        let mut state = QUIET_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(level) = state.enter(log::max_level()) {
            log::set_max_level(level);
        }
        QuietCodec(())
    }
}

impl Drop for QuietCodec {
    fn drop(&mut self) {
        let mut state = QUIET_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(level) = state.exit() {
            log::set_max_level(level);
        }
    }
}
