//! Customize serialization behaviour

use std::path::Path;

use serde::Serialize;

use crate::Error;

/// Options that can be set when writing structured text to disk.
///
/// You construct `WriteOptions` using builder semantics:
///
/// ```
/// # use otfpatch::{QuoteChar, WriteOptions};
/// let two_spaces = WriteOptions::default();
///
/// let single_tab = WriteOptions::default()
///     .whitespace("\t");
///
/// let tabs_and_singlequotes = WriteOptions::default()
///     .whitespace("\t")
///     .quote_char(QuoteChar::Single);
/// ```
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub(crate) whitespace_char: char,
    pub(crate) whitespace_count: usize,
    pub(crate) quote_style: QuoteChar,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions { whitespace_char: ' ', whitespace_count: 2, quote_style: QuoteChar::Double }
    }
}

impl WriteOptions {
    /// Builder-style method to customize the whitespace.
    ///
    /// By default, we indent with two spaces.
    ///
    /// The string can contain any number of *a single ASCII character*, but must
    /// not contain multiple different characters. As an example, "\t\t" is
    /// fine, but "\t  \t" is not, because it contains both tabs and spaces.
    ///
    /// # Panics
    ///
    /// Panics if the provided string is empty, or if it contains multiple
    /// different characters.
    pub fn whitespace(mut self, indent_str: &str) -> Self {
        let first = indent_str.chars().next().expect("whitespace str must not be empty");
        assert!(first.is_ascii() && indent_str.chars().all(|c| c == first), "invalid whitespace");
        self.whitespace_char = first;
        self.whitespace_count = indent_str.len();
        self
    }

    /// Builder-style method to customize the XML declaration attribute definition quote
    /// char.
    ///
    /// By default, we use double quotes.
    pub fn quote_char(mut self, quote_style: QuoteChar) -> Self {
        self.quote_style = quote_style;
        self
    }

    fn declaration(&self) -> &'static str {
        match self.quote_style {
            QuoteChar::Single => "<?xml version='1.0' encoding='UTF-8'?>\n",
            QuoteChar::Double => "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        }
    }
}

/// The quote character used to write the XML declaration.
///
/// This is exposed to allow the user to match the output of other tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteChar {
    /// Single quotes: 'UTF-8'.
    Single,
    /// Double quotes: "UTF-8".
    Double,
}

/// Serialize any `Serialize` to an XML string, declaration included.
pub(crate) fn to_xml_string(
    value: &impl Serialize,
    options: &WriteOptions,
) -> Result<String, quick_xml::SeError> {
    let mut xml = String::from(options.declaration());
    let mut ser = quick_xml::se::Serializer::new(&mut xml);
    ser.indent(options.whitespace_char, options.whitespace_count);
    value.serialize(ser)?;
    xml.push('\n');
    Ok(xml)
}

/// Write any `Serialize` to file, providing custom options.
pub(crate) fn write_xml_to_file(
    path: &Path,
    value: &impl Serialize,
    options: &WriteOptions,
) -> Result<(), Error> {
    let xml = to_xml_string(value, options)
        .map_err(|source| Error::WriteText { path: path.into(), source })?;
    std::fs::write(path, xml).map_err(|e| Error::io(path, e))
}
