//! Benchmarks of converting a font to structured text and back.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use otfpatch::{BinaryFont, Document, NameRecord, NameTable, Table, Tag, WriteOptions, NAME_TAG};

/// A font with a large naming table and a few kilobytes of opaque data.
fn font() -> BinaryFont {
    let records = (0..256u16)
        .map(|id| NameRecord::windows(id, format!("Benchmark name record number {id}")))
        .collect();
    let mut doc = Document::new(u32::from_be_bytes(*b"OTTO"));
    doc.insert(NAME_TAG, Table::Name(NameTable::new(records)));
    doc.insert(Tag::new(b"glyf"), Table::Opaque((0..8192u32).map(|i| i as u8).collect()));
    doc.to_binary().unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let font = font();
    let options = WriteOptions::default();
    let xml = Document::from_binary(&font).to_xml(&options).unwrap();

    c.bench_function("write text", |b| {
        b.iter(|| Document::from_binary(black_box(&font)).to_xml(&options).unwrap())
    });
    c.bench_function("parse text", |b| b.iter(|| Document::from_xml(black_box(&xml)).unwrap()));
    c.bench_function("encode binary", |b| {
        let doc = Document::from_xml(&xml).unwrap();
        b.iter(|| black_box(&doc).to_binary().unwrap().to_bytes().unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
