#![feature(test)]
extern crate test;
use test::Bencher;

use cmapdb::{CMap, parse_cmap, parse_unicode_map};

fn cid_ranges(lead_bytes: std::ops::RangeInclusive<u8>) -> String {
    let mut source = String::from("begincmap\n/CMapName /Bench-H def\nbegincidrange\n");
    let mut cid = 633;
    for lead in lead_bytes {
        source.push_str(&format!("<{:02X}40> <{:02X}7E> {}\n", lead, lead, cid));
        source.push_str(&format!("<{:02X}80> <{:02X}FC> {}\n", lead, lead, cid + 63));
        cid += 188;
    }
    source.push_str("endcidrange\nendcmap\n");
    source
}

fn bfranges(count: u32) -> String {
    let mut source = String::from("beginbfrange\n");
    for i in 0..count {
        let start = i * 32;
        source.push_str(&format!("<{:04X}> <{:04X}> <{:04X}>\n", start, start + 15, 0x4E00 + start));
    }
    source.push_str("endbfrange\n");
    source
}

#[bench]
fn bench_parse_cidrange(b: &mut Bencher) {
    let source = cid_ranges(0x81..=0x9F);
    b.iter(|| parse_cmap(source.as_bytes()));
}

#[bench]
fn bench_parse_bfrange(b: &mut Bencher) {
    let source = bfranges(500);
    b.iter(|| parse_unicode_map(source.as_bytes()));
}

#[bench]
fn bench_decode(b: &mut Bencher) {
    let cmap: CMap = parse_cmap(cid_ranges(0x81..=0x9F).as_bytes());
    let text = (0x81u8..=0x9F)
        .flat_map(|lead| (0x40u8..=0x7E).flat_map(move |trail| [lead, trail]))
        .collect::<Vec<u8>>();
    b.iter(|| cmap.decode(&text));
}
