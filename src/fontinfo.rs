//! Edits to the naming information of a font.

use std::fmt::Display;
use std::path::Path;

use chrono::{Local, NaiveDateTime};

use crate::document::Document;
use crate::name::{NameSlot, STRIPPABLE_NAME_IDS};
use crate::pipeline::{RoundTrip, RoundTripOutcome};
use crate::write::WriteOptions;
use crate::Error;

const TIMESTAMP_FORMAT: &str = "%Y%m%d.%H%M%S";

fn edit_names<F>(ttx_path: &Path, edit: F) -> Result<usize, Error>
where
    F: FnOnce(&mut crate::name::NameTable) -> usize,
{
    let mut doc = Document::load(ttx_path)?;
    let count = edit(doc.name_mut()?);
    doc.save(ttx_path, &WriteOptions::default())?;
    Ok(count)
}

/// Blank the family, style and full name records of a structured text file.
///
/// Returns the number of records changed.
pub fn strip_names(ttx_path: impl AsRef<Path>) -> Result<usize, Error> {
    edit_names(ttx_path.as_ref(), |name| name.strip_ids(STRIPPABLE_NAME_IDS))
}

/// Set every version string record of a structured text file.
pub fn set_version_string(ttx_path: impl AsRef<Path>, text: &str) -> Result<usize, Error> {
    edit_names(ttx_path.as_ref(), |name| name.set_text(NameSlot::Version, text))
}

/// Set every unique identifier record of a structured text file.
pub fn set_unique_name(ttx_path: impl AsRef<Path>, text: &str) -> Result<usize, Error> {
    edit_names(ttx_path.as_ref(), |name| name.set_text(NameSlot::UniqueId, text))
}

/// Stamps a version string and a timestamped unique name into a font.
///
/// ```no_run
/// # use otfpatch::FontInfoFix;
/// FontInfoFix::new("Sample", "Bold")
///     .version(1, 2)
///     .keep_temp(true)
///     .apply("Sample-Bold.otf")
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FontInfoFix {
    family: String,
    style: String,
    version: String,
    keep_temp: bool,
    timestamp: Option<NaiveDateTime>,
}

impl FontInfoFix {
    /// A fix for the given family and style, with version 1.0.
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        FontInfoFix {
            family: family.into(),
            style: style.into(),
            version: version_string(1, 0),
            keep_temp: false,
            timestamp: None,
        }
    }

    /// Set the version. Each part is written as given, so `(1, "000")`
    /// becomes `Version 1.000`.
    pub fn version(mut self, major: impl Display, minor: impl Display) -> Self {
        self.version = version_string(major, minor);
        self
    }

    /// Keep the temporary structured text file.
    pub fn keep_temp(mut self, keep: bool) -> Self {
        self.keep_temp = keep;
        self
    }

    /// Use this timestamp instead of the current local time.
    pub fn timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// The unique name this fix writes.
    pub fn unique_name(&self) -> String {
        let timestamp = self.timestamp.unwrap_or_else(|| Local::now().naive_local());
        format!("{} {}: {}", self.family, self.style, timestamp.format(TIMESTAMP_FORMAT))
    }

    /// Apply the fix to the font at `otf_path`, in place.
    pub fn apply(&self, otf_path: impl AsRef<Path>) -> Result<RoundTripOutcome<()>, Error> {
        let unique_name = self.unique_name();
        log::debug!("setting '{}' and '{unique_name}'", self.version);
        RoundTrip::new().keep_temp(self.keep_temp).run(otf_path, |ttx| {
            let mut doc = Document::load(ttx)?;
            let name = doc.name_mut()?;
            name.set_text(NameSlot::Version, &self.version);
            name.set_text(NameSlot::UniqueId, &unique_name);
            doc.save(ttx, &WriteOptions::default())
        })
    }
}

fn version_string(major: impl Display, minor: impl Display) -> String {
    format!("Version {major}.{minor}")
}

/// Set the version string to `Version {major}.{minor}` and the unique name to
/// `{family} {style}: {timestamp}`, in one round trip.
///
/// The temporary structured text file is removed unless `keep_temp` is set.
pub fn fix_font_info(
    otf_path: impl AsRef<Path>,
    family: &str,
    style: &str,
    version_major: impl Display,
    version_minor: impl Display,
    keep_temp: bool,
) -> Result<(), Error> {
    FontInfoFix::new(family, style)
        .version(version_major, version_minor)
        .keep_temp(keep_temp)
        .apply(otf_path)
        .map(|_| ())
}
