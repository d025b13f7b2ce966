//! A placeholder digital signature table.
//!
//! Some applications refuse to treat a font as an OpenType font unless it
//! carries a `DSIG` table. The table built here has one signature record
//! holding a fixed, meaningless signature.

use std::path::Path;

use write_fonts::types::Tag;

pub use write_fonts::tables::dsig::{Dsig, PermissionFlags, SignatureBlockFormat1, SignatureRecord};

use crate::codec::BinaryFont;
use crate::error::EncodeError;
use crate::Error;

/// The tag of the digital signature table.
pub const DSIG_TAG: Tag = Tag::new(b"DSIG");

/// The signature bytes of the placeholder record.
pub const PLACEHOLDER_SIGNATURE: [u8; 12] =
    [0xd3, 0x4d, 0x34, 0xd3, 0x4d, 0x35, 0xd3, 0x4d, 0x34, 0xd3, 0x4d, 0x34];

/// The placeholder table: flags 1 and one format 1 signature.
pub fn build() -> Dsig {
    let block = SignatureBlockFormat1::new(PLACEHOLDER_SIGNATURE.to_vec());
    Dsig::new(PermissionFlags::CANNOT_BE_RESIGNED, vec![SignatureRecord::new(block)])
}

/// Compile a `DSIG` table.
pub fn compile(dsig: &Dsig) -> Result<Vec<u8>, EncodeError> {
    write_fonts::dump_table(dsig).map_err(EncodeError::Dsig)
}

/// Insert `dsig` into `font`, replacing any existing `DSIG` table.
pub fn attach(dsig: &Dsig, font: &mut BinaryFont) -> Result<(), EncodeError> {
    if font.insert_table(DSIG_TAG, compile(dsig)?).is_some() {
        log::debug!("replaced an existing DSIG table");
    }
    Ok(())
}

/// Attach the placeholder `DSIG` table to the font at `otf_path`, in place.
pub fn add_dsig_table(otf_path: impl AsRef<Path>) -> Result<(), Error> {
    let path = otf_path.as_ref();
    let mut font = BinaryFont::load(path)?;
    attach(&build(), &mut font).map_err(|source| Error::Encode { path: path.into(), source })?;
    font.save(path)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testdata;

    #[test]
    fn placeholder_bytes() {
        let expected = [
            0, 0, 0, 1, 0, 1, 0, 1, // header
            0, 0, 0, 1, 0, 0, 0, 20, 0, 0, 0, 20, // record
            0, 0, 0, 0, 0, 0, 0, 12, // block header
            0xd3, 0x4d, 0x34, 0xd3, 0x4d, 0x35, 0xd3, 0x4d, 0x34, 0xd3, 0x4d, 0x34,
        ];
        assert_eq!(compile(&build()).unwrap(), expected);
        assert_eq!(build(), build());
    }

    #[test]
    fn placeholder_reads_back() {
        use write_fonts::read::{tables::dsig::Dsig as ReadDsig, FontData, FontRead};

        let bytes = compile(&build()).unwrap();
        let dsig = ReadDsig::read(FontData::new(&bytes)).unwrap();
        assert_eq!(dsig.num_signatures(), 1);
        assert_eq!(dsig.flags(), PermissionFlags::CANNOT_BE_RESIGNED);
        let record = &dsig.signature_records()[0];
        let block = record.signature_block(dsig.offset_data()).unwrap();
        assert_eq!(block.signature(), &PLACEHOLDER_SIGNATURE[..]);
    }

    #[test]
    fn attach_replaces() {
        let mut font = testdata::binary_font();
        font.insert_table(DSIG_TAG, vec![0; 8]);
        attach(&build(), &mut font).unwrap();
        assert_eq!(font.table(DSIG_TAG), Some(&compile(&build()).unwrap()[..]));
        assert_eq!(font.tables().count(), 5);
    }

    #[test]
    fn add_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Acme-Regular.otf");
        testdata::binary_font().save(&path).unwrap();
        add_dsig_table(&path).unwrap();
        let font = BinaryFont::load(&path).unwrap();
        assert_eq!(font.table(DSIG_TAG).map(<[u8]>::len), Some(40));
        assert_eq!(font.table(Tag::new(b"post")), testdata::binary_font().table(Tag::new(b"post")));
    }
}
