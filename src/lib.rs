//! Patching the naming metadata of compiled [OpenType] fonts.
//!
//! A binary font is decoded into a tree of tables and written out as
//! structured XML text, the text is edited, and the result is encoded back
//! into a binary font. The editable parts are the `name` records and the
//! string fields of the `CFF ` top DICT; every other table is carried through
//! unchanged.
//!
//! [OpenType]: https://learn.microsoft.com/en-us/typography/opentype/spec/
//!
//! # Basic usage:
//!
//! ```no_run
//! use otfpatch::{fix_font_info, with_temp_round_trip};
//!
//! let path = "Sample-Bold.otf";
//! fix_font_info(path, "Sample", "Bold", 1, 2, false).expect("failed to fix font info");
//!
//! let stripped = with_temp_round_trip(path, |ttx| otfpatch::strip_names(ttx))
//!     .expect("failed to strip names");
//! println!("blanked {stripped} name records");
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod cff;
mod codec;
mod document;
pub mod dsig;
pub mod error;
mod extract;
mod fontinfo;
pub mod name;
mod pipeline;
mod replace;
mod ttx;
pub mod util;
mod write;

#[cfg(test)]
mod testdata;

pub use cff::{CffTable, TopDictField, TopDictStrings, CFF_TAG};
pub use codec::BinaryFont;
pub use document::{Document, Table};
pub use dsig::{add_dsig_table, Dsig, SignatureRecord, DSIG_TAG};
pub use error::{Error, MissingTableError, TempFileCleanupWarning};
pub use extract::extract_tables;
pub use fontinfo::{fix_font_info, set_unique_name, set_version_string, strip_names, FontInfoFix};
pub use name::{NameRecord, NameSlot, NameTable, NAME_TAG, STRIPPABLE_NAME_IDS};
pub use pipeline::{otf_to_ttx, ttx_to_otf, with_temp_round_trip, RoundTrip, RoundTripOutcome};
pub use replace::{
    find_and_replace, find_and_replace_in_cff, find_and_replace_in_name, find_and_replace_in_otf,
    find_and_replace_in_ttx,
};
pub use write::{QuoteChar, WriteOptions};

pub use write_fonts::types::Tag;
