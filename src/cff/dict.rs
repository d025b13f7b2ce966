//! Top DICT entries with the byte spans of their operands.
//!
//! Tokens are decoded by read-fonts. The spans are tracked alongside so an
//! entry can be copied verbatim and an offset operand can be rewritten in
//! place at its original width.

use std::ops::Range;

use write_fonts::read::tables::postscript::dict::{self, Operator, Token};
use write_fonts::read::tables::postscript::Number;

use crate::error::CffError;

/// A DICT operator with its operands and where they sit in the DICT.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub(crate) operator: Operator,
    pub(crate) operands: Vec<Number>,
    /// The byte range of each operand.
    pub(crate) spans: Vec<Range<usize>>,
    /// The byte range of the whole entry, operator included.
    pub(crate) range: Range<usize>,
}

impl Entry {
    /// The single integer operand of this entry.
    pub(crate) fn integer(&self) -> Result<i32, CffError> {
        match self.operands.as_slice() {
            [Number::I32(value)] => Ok(*value),
            _ => Err(CffError::InvalidOperands(self.operator)),
        }
    }

    /// The `[size, offset]` operands of a Private entry.
    pub(crate) fn private(&self) -> Result<(i32, i32), CffError> {
        match self.operands.as_slice() {
            [Number::I32(size), Number::I32(offset)] => Ok((*size, *offset)),
            _ => Err(CffError::InvalidOperands(self.operator)),
        }
    }

    /// The encoded operator, one or two bytes.
    pub(crate) fn operator_bytes<'a>(&self, dict: &'a [u8]) -> &'a [u8] {
        let start = self.spans.last().map_or(self.range.start, |span| span.end);
        &dict[start..self.range.end]
    }
}

/// The encoded length of the token at the start of `data`.
fn token_len(data: &[u8]) -> Result<usize, CffError> {
    let len = match data.first().ok_or(CffError::Truncated)? {
        12 | 247..=254 => 2,
        28 => 3,
        29 => 5,
        // real: nibble pairs up to the one holding the 0xf terminator
        30 => {
            let nibbles = data.get(1..).unwrap_or_default();
            let last = nibbles.iter().position(|b| b >> 4 == 0xf || b & 0xf == 0xf);
            last.ok_or(CffError::Truncated)? + 2
        }
        _ => 1,
    };
    match len <= data.len() {
        true => Ok(len),
        false => Err(CffError::Truncated),
    }
}

/// Split a DICT into its entries.
pub(crate) fn entries(data: &[u8]) -> Result<Vec<Entry>, CffError> {
    let mut entries = Vec::new();
    let mut operands = Vec::new();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    for token in dict::tokens(data) {
        let token = token.map_err(CffError::Dict)?;
        let end = pos + token_len(&data[pos..])?;
        match token {
            Token::Operand(number, _) => {
                operands.push(number);
                spans.push(pos..end);
            }
            Token::Operator(operator) => {
                entries.push(Entry {
                    operator,
                    operands: std::mem::take(&mut operands),
                    spans: std::mem::take(&mut spans),
                    range: start..end,
                });
                start = end;
            }
        }
        pos = end;
    }
    if !operands.is_empty() {
        return Err(CffError::DanglingOperands);
    }
    Ok(entries)
}

/// Append an integer operand in its shortest encoding.
pub(crate) fn write_integer(value: i32, out: &mut Vec<u8>) {
    match value {
        -107..=107 => out.push((value + 139) as u8),
        108..=1131 => {
            let value = value - 108;
            out.extend_from_slice(&[(value >> 8) as u8 + 247, value as u8]);
        }
        -1131..=-108 => {
            let value = -value - 108;
            out.extend_from_slice(&[(value >> 8) as u8 + 251, value as u8]);
        }
        -32768..=32767 => {
            out.push(28);
            out.extend_from_slice(&(value as i16).to_be_bytes());
        }
        _ => write_offset(value, out),
    }
}

/// Append an integer operand in the fixed five-byte encoding used for offsets.
pub(crate) fn write_offset(value: i32, out: &mut Vec<u8>) {
    out.push(29);
    out.extend_from_slice(&value.to_be_bytes());
}

/// Encode `value` in exactly `width` bytes, if that encoding can hold it.
pub(crate) fn integer_with_width(value: i32, width: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(width);
    match width {
        1 if (-107..=107).contains(&value) => write_integer(value, &mut out),
        2 if (108..=1131).contains(&value.unsigned_abs()) => write_integer(value, &mut out),
        3 if i16::try_from(value).is_ok() => {
            out.push(28);
            out.extend_from_slice(&(value as i16).to_be_bytes());
        }
        5 => write_offset(value, &mut out),
        _ => return None,
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn encoded(value: i32) -> Vec<u8> {
        let mut out = Vec::new();
        write_integer(value, &mut out);
        out
    }

    #[test]
    fn integer_encodings() {
        assert_eq!(encoded(0), [0x8b]);
        assert_eq!(encoded(100), [0xef]);
        assert_eq!(encoded(-100), [0x27]);
        assert_eq!(encoded(1000), [0xfa, 0x7c]);
        assert_eq!(encoded(-1000), [0xfe, 0x7c]);
        assert_eq!(encoded(10000), [0x1c, 0x27, 0x10]);
        assert_eq!(encoded(-10000), [0x1c, 0xd8, 0xf0]);
        assert_eq!(encoded(100000), [0x1d, 0x00, 0x01, 0x86, 0xa0]);
        assert_eq!(encoded(-100000), [0x1d, 0xff, 0xfe, 0x79, 0x60]);
    }

    #[test]
    fn written_integers_read_back() {
        for value in [0, 107, -107, 108, -108, 1131, -1131, 1132, -32768, 32767, 32768, i32::MIN] {
            let mut dict = encoded(value);
            dict.push(0);
            let entries = entries(&dict).unwrap();
            assert_eq!(entries[0].integer().unwrap(), value, "{value}");
            assert_eq!(entries[0].spans, vec![0..dict.len() - 1]);
        }
    }

    #[test]
    fn entries_and_spans() {
        // 391 version, 12 0 copyright with sid 392, [20 5000] private
        let dict = [0xf8, 0x1b, 0x00, 0xf8, 0x1c, 0x0c, 0x00, 0x9f, 0x1d, 0, 0, 0x13, 0x88, 0x12];
        let entries = entries(&dict).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].operator, Operator::Version);
        assert_eq!(entries[0].integer().unwrap(), 391);
        assert_eq!(entries[1].operator, Operator::Copyright);
        assert_eq!(entries[1].integer().unwrap(), 392);
        assert_eq!(entries[1].operator_bytes(&dict), [0x0c, 0x00]);
        assert_eq!(entries[2].operator, Operator::PrivateDictRange);
        assert_eq!(entries[2].private().unwrap(), (20, 5000));
        assert_eq!(entries[2].spans, vec![7..8, 8..13]);
        assert_eq!(entries[2].range, 7..14);
    }

    #[test]
    fn real_operands_are_spanned() {
        // -2.25 ItalicAngle, then 0 version
        let dict = [0x1e, 0xe2, 0xa2, 0x5f, 0x0c, 0x02, 0x8b, 0x00];
        let entries = entries(&dict).unwrap();
        assert_eq!(entries[0].operator, Operator::ItalicAngle);
        assert_eq!(entries[0].spans, vec![0..4]);
        assert_eq!(&dict[entries[0].range.clone()], &dict[..6]);
        assert!(entries[0].integer().is_err());
        assert_eq!(entries[1].range, 6..8);
    }

    #[test]
    fn malformed_dicts() {
        assert!(matches!(entries(&[0x8b]), Err(CffError::DanglingOperands)));
        assert!(matches!(entries(&[0x8b, 0xff]), Err(CffError::Dict(_))));
        assert!(entries(&[0x1d, 0, 0]).is_err());
        assert!(entries(&[0x0c]).is_err());
    }

    #[test]
    fn fixed_width_encodings() {
        assert_eq!(integer_with_width(50, 1), Some(vec![0xbd]));
        assert_eq!(integer_with_width(200, 1), None);
        assert_eq!(integer_with_width(200, 2), Some(vec![0xf7, 0x5c]));
        assert_eq!(integer_with_width(2000, 2), None);
        assert_eq!(integer_with_width(2000, 3), Some(vec![0x1c, 0x07, 0xd0]));
        assert_eq!(integer_with_width(2000, 5), Some(vec![0x1d, 0, 0, 0x07, 0xd0]));
        assert_eq!(integer_with_width(2000, 4), None);
    }
}
