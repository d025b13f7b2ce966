//! Fonts assembled in code, shared by the unit tests.

use write_fonts::types::Tag;

use crate::cff::{compile_index, write_integer, write_offset, CFF_TAG};
use crate::codec::BinaryFont;
use crate::name::{NameRecord, NameSlot, NameTable, NAME_TAG};

pub(crate) const OTTO: u32 = u32::from_be_bytes(*b"OTTO");

fn index<T: AsRef<[u8]>>(items: &[T]) -> Vec<u8> {
    compile_index(items).unwrap()
}

pub(crate) fn head_table() -> Vec<u8> {
    let mut head = Vec::with_capacity(54);
    head.extend_from_slice(&[0, 1, 0, 0]); // version 1.0
    head.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // fontRevision
    head.extend_from_slice(&0u32.to_be_bytes()); // checkSumAdjustment
    head.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
    head.extend_from_slice(&3u16.to_be_bytes()); // flags
    head.extend_from_slice(&1000u16.to_be_bytes()); // unitsPerEm
    head.extend_from_slice(&[0; 16]); // created, modified
    for value in [-50i16, -200, 1000, 800] {
        head.extend_from_slice(&value.to_be_bytes());
    }
    head.extend_from_slice(&[0, 0, 0, 3, 0, 2, 0, 0, 0, 0]);
    head
}

pub(crate) fn name_table() -> NameTable {
    NameTable::new(vec![
        NameRecord::mac(NameSlot::Family, "Acme"),
        NameRecord::windows(NameSlot::Family, "Acme"),
        NameRecord::windows(NameSlot::Subfamily, "Regular"),
        NameRecord::windows(NameSlot::UniqueId, "Acme Regular: 2024"),
        NameRecord::windows(NameSlot::FullName, "Acme Regular"),
        NameRecord::windows(NameSlot::Version, "Version 1.000"),
        NameRecord::windows(6u16, "Acme-Regular"),
        NameRecord::windows(NameSlot::TypographicFamily, "Acme"),
    ])
}

fn private_dict() -> Vec<u8> {
    let mut private = Vec::new();
    write_integer(0, &mut private);
    private.push(20); // defaultWidthX
    write_integer(500, &mut private);
    private.push(21); // nominalWidthX
    private
}

/// A name-keyed CFF with the ISOAdobe charset and two glyphs.
pub(crate) fn cff_table() -> Vec<u8> {
    let strings: [&[u8]; 4] =
        [b"1.000", b"Acme is a trademark of Acme Type.", b"Acme Regular", b"Acme"];
    let private = private_dict();
    let char_strings = index(&[&[0x0e][..], &[0x0e][..]]);
    let top_dict = |char_strings_at: usize, private_at: usize| {
        let mut dict = Vec::new();
        // version, Notice, FullName, FamilyName, Weight ("Regular")
        for (sid, op) in [(391, 0), (392, 1), (393, 2), (394, 3), (388, 4)] {
            write_integer(sid, &mut dict);
            dict.push(op);
        }
        write_integer(0, &mut dict);
        dict.push(15);
        write_offset(char_strings_at as i32, &mut dict);
        dict.push(17);
        write_integer(private.len() as i32, &mut dict);
        write_offset(private_at as i32, &mut dict);
        dict.push(18);
        dict
    };

    let mut out = vec![1, 0, 4, 4];
    out.extend(index(&[b"Acme-Regular"]));
    let strings = index(&strings);
    let gsubrs = index::<&[u8]>(&[]);
    let char_strings_at =
        out.len() + index(&[top_dict(0, 0)]).len() + strings.len() + gsubrs.len();
    let private_at = char_strings_at + char_strings.len();
    out.extend(index(&[top_dict(char_strings_at, private_at)]));
    out.extend(strings);
    out.extend(gsubrs);
    out.extend(char_strings);
    out.extend(private);
    out
}

/// A CID-keyed CFF with one Font DICT whose Private offset is a 3-byte operand.
pub(crate) fn cid_cff_table() -> Vec<u8> {
    let strings: [&[u8]; 4] = [b"Adobe", b"Identity", b"Acme CID", b"Acme"];
    let private = private_dict();
    let char_strings = index(&[&[0x0e][..]]);
    let fd_select = [3, 0, 1, 0, 0, 0, 0, 1];
    let font_dict = |private_at: usize| {
        let mut dict = Vec::new();
        write_integer(private.len() as i32, &mut dict);
        dict.push(28);
        dict.extend_from_slice(&(private_at as i16).to_be_bytes());
        dict.push(18);
        dict
    };
    let top_dict = |char_strings_at: usize, fd_array_at: usize, fd_select_at: usize| {
        let mut dict = Vec::new();
        // ROS: Adobe-Identity-0
        for operand in [391, 392, 0] {
            write_integer(operand, &mut dict);
        }
        dict.extend([12, 30]);
        write_integer(393, &mut dict);
        dict.push(2);
        write_integer(394, &mut dict);
        dict.push(3);
        write_offset(char_strings_at as i32, &mut dict);
        dict.push(17);
        write_offset(fd_array_at as i32, &mut dict);
        dict.extend([12, 36]);
        write_offset(fd_select_at as i32, &mut dict);
        dict.extend([12, 37]);
        dict
    };

    let mut out = vec![1, 0, 4, 4];
    out.extend(index(&[b"Acme-CID"]));
    let strings = index(&strings);
    let gsubrs = index::<&[u8]>(&[]);
    let char_strings_at =
        out.len() + index(&[top_dict(0, 0, 0)]).len() + strings.len() + gsubrs.len();
    let fd_select_at = char_strings_at + char_strings.len();
    let fd_array_at = fd_select_at + fd_select.len();
    let private_at = fd_array_at + index(&[font_dict(0)]).len();
    out.extend(index(&[top_dict(char_strings_at, fd_array_at, fd_select_at)]));
    out.extend(strings);
    out.extend(gsubrs);
    out.extend(char_strings);
    out.extend(fd_select);
    out.extend(index(&[font_dict(private_at)]));
    out.extend(private);
    out
}

pub(crate) fn binary_font() -> BinaryFont {
    let mut font = BinaryFont::new(OTTO);
    font.insert_table(Tag::new(b"head"), head_table());
    font.insert_table(NAME_TAG, name_table().to_bytes().unwrap());
    font.insert_table(CFF_TAG, cff_table());
    // post version 3.0
    let mut post = vec![0, 3, 0, 0];
    post.extend_from_slice(&[0; 28]);
    font.insert_table(Tag::new(b"post"), post);
    font
}
