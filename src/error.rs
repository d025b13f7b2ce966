//! Error types.

use std::io::Error as IoError;
use std::path::PathBuf;

use write_fonts::read::tables::postscript::dict::Operator;
use write_fonts::read::tables::postscript::Error as PostScriptError;
use write_fonts::read::ReadError;
use write_fonts::types::Tag;

/// Errors that occur while reading, patching or writing fonts.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A binary font could not be decoded.
    #[error("failed to decode binary font '{path}'")]
    Decode {
        /// The path of the binary font.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: DecodeError,
    },
    /// A document could not be turned back into a binary font.
    #[error("failed to encode '{path}'")]
    Encode {
        /// The path of the file being encoded.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: EncodeError,
    },
    /// A table an operation depends on is absent.
    #[error(transparent)]
    MissingTable(#[from] MissingTableError),
    /// A file could not be read, written, renamed or removed.
    #[error("failed to access '{path}'")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: IoError,
    },
    /// A document could not be serialized to structured text.
    #[error("failed to serialize structured text for '{path}'")]
    WriteText {
        /// The destination path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: quick_xml::SeError,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: IoError) -> Self {
        Error::Io { path: path.into(), source }
    }
}

/// An error that occurs while decoding a compiled font.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The font file could not be read.
    #[error("failed to read font file")]
    Io(#[source] IoError),
    /// The sfnt container was rejected by the parser.
    #[error("not a valid sfnt font")]
    Read(#[source] ReadError),
    /// A table record points outside the file.
    #[error("the '{0}' table record points outside the font data")]
    TableOutOfBounds(Tag),
}

/// An error that occurs while encoding a document into a compiled font.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// The structured text is malformed.
    #[error("invalid structured text")]
    Document(#[from] DocumentError),
    /// The name table could not be compiled.
    #[error("failed to compile the 'name' table")]
    Name(#[source] write_fonts::error::Error),
    /// A name string does not fit in the 16-bit length field.
    #[error("name record {name_id} is {length} bytes long, the limit is 65535")]
    NameTooLong {
        /// The record's name id.
        name_id: u16,
        /// The encoded length.
        length: usize,
    },
    /// A Macintosh name record holds text outside the MacRoman character set.
    #[error("name record {name_id} text '{text}' cannot be encoded as MacRoman")]
    NotMacRoman {
        /// The record's name id.
        name_id: u16,
        /// The offending text.
        text: String,
    },
    /// A name record's platform and encoding pair has no known text encoding.
    #[error("unsupported name record encoding ({platform_id}, {encoding_id})")]
    UnsupportedEncoding {
        /// The record's platform id.
        platform_id: u16,
        /// The record's encoding id.
        encoding_id: u16,
    },
    /// The CFF table could not be re-encoded.
    #[error("failed to compile the 'CFF ' table")]
    Cff(#[from] CffError),
    /// The `DSIG` table could not be compiled.
    #[error("failed to compile the 'DSIG' table")]
    Dsig(#[source] write_fonts::error::Error),
    /// A font can contain at most 4095 tables, the most the table
    /// directory's search fields can describe.
    #[error("too many tables ({0})")]
    TooManyTables(usize),
    /// Table offsets and lengths are 32-bit.
    #[error("the font is too large ({0} bytes)")]
    TooLarge(usize),
    /// The table directory could not be compiled.
    #[error("failed to compile the table directory")]
    Directory(#[source] write_fonts::error::Error),
}

/// An error in the structured text form of a font.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DocumentError {
    /// The text could not be read.
    #[error("failed to read structured text")]
    Io(#[source] IoError),
    /// The XML is malformed or has the wrong shape.
    #[error("failed to parse XML structure")]
    Xml(#[source] quick_xml::DeError),
    /// The `sfntVersion` attribute is not a 32-bit hex number.
    #[error("invalid sfntVersion '{0}'")]
    InvalidSfntVersion(String),
    /// A table tag is not four bytes long.
    #[error("invalid table tag '{0}'")]
    InvalidTag(String),
    /// Two tables share a tag.
    #[error("duplicate '{0}' table")]
    DuplicateTable(Tag),
    /// A table's base64 data could not be decoded.
    #[error("invalid data for the '{0}' table")]
    InvalidData(Tag, #[source] base64::DecodeError),
    /// A table that needs its compiled data has none.
    #[error("the '{0}' table has no data element")]
    MissingData(Tag),
    /// The embedded CFF data could not be parsed.
    #[error("invalid 'CFF ' table data")]
    Cff(#[source] CffError),
}

/// An error that occurs while parsing or rebuilding a CFF table.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CffError {
    /// The table's structure could not be read.
    #[error("malformed CFF data")]
    Read(#[source] ReadError),
    /// A DICT or INDEX is malformed.
    #[error("malformed CFF DICT or INDEX")]
    Dict(#[source] PostScriptError),
    /// The data ends before a structure is complete.
    #[error("unexpected end of CFF data")]
    Truncated,
    /// Only CFF version 1 is supported.
    #[error("unsupported CFF major version {0}")]
    UnsupportedVersion(u8),
    /// A DICT ended with operands but no operator.
    #[error("DICT operands without an operator")]
    DanglingOperands,
    /// An operator has the wrong operands.
    #[error("invalid operands for DICT operator {0:?}")]
    InvalidOperands(Operator),
    /// Only single-font CFF tables can be edited.
    #[error("expected exactly one top DICT, found {0}")]
    FontCount(usize),
    /// A string id points past the String INDEX.
    #[error("string id {0} is out of range")]
    InvalidStringId(i32),
    /// The String INDEX is full.
    #[error("too many strings for 16-bit string ids")]
    TooManyStrings,
    /// CFF strings are Latin-1.
    #[error("'{0}' cannot be encoded as Latin-1")]
    NotLatin1(String),
    /// An offset points into the header area rather than the data that follows it.
    #[error("offset {0} points before the global subroutines")]
    UnexpectedOffset(i64),
    /// A shifted offset no longer fits its operand.
    #[error("offset {0} does not fit in the existing operand")]
    OffsetOverflow(i64),
    /// A rebuilt INDEX could not be compiled.
    #[error("failed to compile a CFF INDEX")]
    Compile(#[source] write_fonts::error::Error),
}

/// The font has no table with the given tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("the font has no '{tag}' table")]
pub struct MissingTableError {
    /// The tag of the missing table.
    pub tag: Tag,
}

impl MissingTableError {
    pub(crate) fn new(tag: Tag) -> Self {
        MissingTableError { tag }
    }
}

/// A temporary file could not be removed after a successful round trip.
///
/// This is not an error: the patched font was written. It is logged and
/// reported alongside the result.
#[derive(Debug, thiserror::Error)]
#[error("failed to remove temporary file '{path}'")]
pub struct TempFileCleanupWarning {
    /// The file left behind.
    pub path: PathBuf,
    /// Why it could not be removed.
    #[source]
    pub source: IoError,
}
