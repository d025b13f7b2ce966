//! Conversions between binary fonts and structured text, and the scoped
//! round trip that patches a binary font through its structured text.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::codec::BinaryFont;
use crate::document::Document;
use crate::error::{Error, TempFileCleanupWarning};
use crate::util;
use crate::write::WriteOptions;

/// Decode the binary font at `binary_path` and write it as structured text.
///
/// The text is written to `ttx_path`, or next to the binary with the `ttx`
/// extension. Returns the path written.
pub fn otf_to_ttx(
    binary_path: impl AsRef<Path>,
    ttx_path: Option<&Path>,
) -> Result<PathBuf, Error> {
    let binary_path = binary_path.as_ref();
    let ttx_path = match ttx_path {
        Some(path) => path.to_owned(),
        None => util::sibling_with_extension(binary_path, "ttx"),
    };
    let font = BinaryFont::load(binary_path)?;
    Document::from_binary(&font).save(&ttx_path, &WriteOptions::default())?;
    Ok(ttx_path)
}

/// Parse the structured text at `ttx_path` and write it as a binary font.
///
/// The font is written to `otf_path`, or next to the text with the `otf`
/// extension. Returns the path written.
pub fn ttx_to_otf(ttx_path: impl AsRef<Path>, otf_path: Option<&Path>) -> Result<PathBuf, Error> {
    let ttx_path = ttx_path.as_ref();
    let otf_path = match otf_path {
        Some(path) => path.to_owned(),
        None => util::sibling_with_extension(ttx_path, "otf"),
    };
    encode_text(ttx_path, &otf_path)?;
    Ok(otf_path)
}

fn encode_text(ttx_path: &Path, otf_path: &Path) -> Result<(), Error> {
    log::debug!("encoding {} to {}", ttx_path.display(), otf_path.display());
    let font = Document::load(ttx_path)?
        .to_binary()
        .map_err(|source| Error::Encode { path: ttx_path.into(), source })?;
    font.save(otf_path)
}

/// Decode `binary_path` to a temporary structured text file, let `patch`
/// edit that file, and encode the result back over `binary_path`.
///
/// The temporary file is removed on every exit path. If `patch` or the
/// encoding fails, the binary font is left untouched.
pub fn with_temp_round_trip<T, F>(binary_path: impl AsRef<Path>, patch: F) -> Result<T, Error>
where
    F: FnOnce(&Path) -> Result<T, Error>,
{
    RoundTrip::new().run(binary_path, patch).map(|outcome| outcome.value)
}

/// A configurable binary → text → patch → binary round trip.
///
/// ```no_run
/// # use otfpatch::{RoundTrip, WriteOptions};
/// let outcome = RoundTrip::new()
///     .destination("Acme-Patched.otf")
///     .keep_temp(true)
///     .write_options(WriteOptions::default().whitespace("\t"))
///     .run("Acme-Regular.otf", |ttx| otfpatch::strip_names(ttx))
///     .unwrap();
/// println!("stripped {} records", outcome.value);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoundTrip {
    destination: Option<PathBuf>,
    keep_temp: bool,
    options: WriteOptions,
}

/// The result of a successful [`RoundTrip`].
#[derive(Debug)]
pub struct RoundTripOutcome<T> {
    /// What the patch function returned.
    pub value: T,
    /// The temporary file, if it was kept.
    pub retained: Option<PathBuf>,
    /// Set if the temporary file could not be removed.
    pub cleanup_warning: Option<TempFileCleanupWarning>,
}

impl RoundTrip {
    /// A round trip that writes back in place and removes its temporary file.
    pub fn new() -> Self {
        RoundTrip::default()
    }

    /// Write the patched font to `path` instead of over the source.
    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }

    /// Keep the temporary structured text file after a successful run.
    ///
    /// A run that fails removes it regardless.
    pub fn keep_temp(mut self, keep: bool) -> Self {
        self.keep_temp = keep;
        self
    }

    /// Options for writing the temporary structured text file.
    pub fn write_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the round trip on the font at `binary_path`.
    pub fn run<T, F>(
        &self,
        binary_path: impl AsRef<Path>,
        patch: F,
    ) -> Result<RoundTripOutcome<T>, Error>
    where
        F: FnOnce(&Path) -> Result<T, Error>,
    {
        let binary_path = binary_path.as_ref();
        let destination = self.destination.as_deref().unwrap_or(binary_path);
        let font = BinaryFont::load(binary_path)?;

        let temp = TempFile::new(util::sibling_with_extension(binary_path, "ttx"), self.keep_temp);
        Document::from_binary(&font).save(temp.path(), &self.options)?;
        let value = patch(temp.path())?;
        encode_text(temp.path(), destination)?;

        let (retained, cleanup_warning) = match temp.close() {
            Ok(retained) => (retained, None),
            Err(warning) => (None, Some(warning)),
        };
        Ok(RoundTripOutcome { value, retained, cleanup_warning })
    }
}

/// A structured text file that is removed when dropped.
///
/// `keep` is only honoured by [`TempFile::close`]: a file that is dropped
/// without being closed belongs to a failed round trip and is always removed.
#[derive(Debug)]
struct TempFile {
    path: PathBuf,
    keep: bool,
    armed: bool,
}

impl TempFile {
    fn new(path: PathBuf, keep: bool) -> Self {
        if path.exists() {
            log::warn!("overwriting existing {}, it will be removed afterwards", path.display());
        }
        TempFile { path, keep, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now, reporting a failure instead of logging it.
    ///
    /// Returns the path if the file is kept.
    fn close(mut self) -> Result<Option<PathBuf>, TempFileCleanupWarning> {
        self.armed = false;
        if self.keep {
            return Ok(Some(self.path.clone()));
        }
        fs::remove_file(&self.path).map(|()| None).map_err(|source| {
            log::warn!("failed to remove {}: {source}", self.path.display());
            TempFileCleanupWarning { path: self.path.clone(), source }
        })
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => (),
            Err(e) if e.kind() == ErrorKind::NotFound => (),
            Err(e) => log::warn!("failed to remove {}: {e}", self.path.display()),
        }
    }
}
