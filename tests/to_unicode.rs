use cmapdb::{BfRange, CMapParser, Error, Object, UnicodeMap, parse_unicode_map};

mod utils;

fn parse(source: &[u8]) -> (UnicodeMap, Vec<BfRange>) {
    let mut parser = CMapParser::new(UnicodeMap::new(), source);
    parser.run();
    let dropped = parser.dropped().to_vec();
    (parser.into_target(), dropped)
}

#[test]
fn producer_to_unicode_map() {
    let mut map = parse_unicode_map(utils::TO_UNICODE);
    assert_eq!(map.name(), Some("Adobe-Identity-UCS"));
    assert_eq!(map.attrs.get("CMapType"), Some(&Object::Integer(2)));
    let system_info = map.attrs.get("CIDSystemInfo").and_then(Object::as_dict).unwrap();
    assert_eq!(system_info.get(&b"Ordering"[..]), Some(&Object::string_literal("UCS")));

    let text = [0x24, 0x44, 0x45, 0x46, 0x03, 0x50, 0x51, 0x52, 0x11]
        .into_iter()
        .map(|cid| map.get_unichr(cid).map(str::to_string))
        .collect::<Result<String, _>>()
        .unwrap();
    assert_eq!(text, "Aabc ffil.");
}

#[test]
fn list_bfrange() {
    let mut map = parse_unicode_map(b"beginbfrange <0000> <0002> [<0041> <0042> <0043>] endbfrange");
    assert_eq!(map.get_unichr(0).unwrap(), "A");
    assert_eq!(map.get_unichr(1).unwrap(), "B");
    assert_eq!(map.get_unichr(2).unwrap(), "C");
}

#[test]
fn base_bfrange_stops_at_block_boundary() {
    utils::init_logging();
    // Greek and Coptic ends at 0x3FF, Cyrillic starts right after
    let (map, dropped) = parse(b"beginbfrange <0100> <0120> <03F0> endbfrange");
    assert_eq!(map.get(0x10F).unwrap(), "\u{3FF}");
    for cid in 0x110..=0x120 {
        assert!(map.get(cid).is_err(), "cid {:#x} should not be mapped", cid);
    }
    assert_eq!(map.bfranges(), &[BfRange::new(0x100, 0x10F, 0x3F0)]);
    assert_eq!(dropped, vec![BfRange::new(0x110, 0x120, 0x400)]);
}

#[test]
fn same_offset_ranges_fill_gap() {
    let (map, dropped) = parse(b"beginbfrange <0000> <0004> <0064> <000A> <000E> <006E> endbfrange");
    assert!(dropped.is_empty());
    for cid in 5..=9 {
        assert_eq!(map.get(cid).unwrap(), char::from_u32(cid + 100).unwrap().to_string());
    }
    assert_eq!(map.bfranges(), &[BfRange::new(0, 14, 100)]);
}

#[test]
fn contained_range_is_dropped_from_index() {
    let source = b"beginbfrange
<0000> <00FF> <4E00>
<0300> <0310> <4E20>
<0400> <0401> <3042>
endbfrange";
    let (map, _) = parse(source);
    assert_eq!(map.bfranges(), &[BfRange::new(0, 0xFF, 0x4E00), BfRange::new(0x400, 0x401, 0x3042)]);
    assert!(map.bfranges().iter().all(|range| range.start != 0x300));
}

#[test]
fn ranges_merge_again_after_contained_range_is_dropped() {
    let source = b"beginbfrange
<0000> <0004> <0064>
<0005> <0006> <0066>
<000A> <000E> <006E>
endbfrange";
    let (map, dropped) = parse(source);
    assert!(dropped.is_empty());
    assert_eq!(map.bfranges(), &[BfRange::new(0, 14, 100)]);
    // explicit entries keep their own values
    assert_eq!(map.get(5).unwrap(), "f");
    assert_eq!(map.get(6).unwrap(), "g");
    // the gap left between the two outer ranges is filled from their offset
    assert_eq!(map.get(7).unwrap(), "k");
    assert_eq!(map.get(8).unwrap(), "l");
    assert_eq!(map.get(9).unwrap(), "m");
}

#[test]
fn nko_range_is_admitted() {
    let (map, dropped) = parse(b"beginbfrange <0001> <0003> <07CA> endbfrange");
    assert!(dropped.is_empty());
    assert_eq!(map.bfranges(), &[BfRange::new(1, 3, 0x7CA)]);
    assert_eq!(map.get(3).unwrap(), "\u{7CC}");
}

#[test]
fn extrapolation_from_nearest_range() {
    let mut map = parse_unicode_map(b"beginbfrange <0010> <0019> <0030> <0100> <0119> <0041> endbfrange");
    // digits continue past 0x19, the alphabet continues past 0x119
    assert_eq!(map.get_unichr(0x1A).unwrap(), ":");
    assert_eq!(map.get_unichr(0x11A).unwrap(), "[");
    // cached after the first lookup
    assert_eq!(map.get(0x11A).unwrap(), "[");
    assert!(matches!(map.get_unichr(0x5000), Err(Error::UndefinedCid(0x5000))));
}

#[test]
fn bfchar_is_not_filtered() {
    let (map, dropped) = parse(b"beginbfchar <0001> <D83DDE00> <0002> <FFFF> endbfchar");
    assert_eq!(map.get(1).unwrap(), "\u{1F600}");
    assert_eq!(map.get(2).unwrap(), "\u{FFFF}");
    assert!(dropped.is_empty());
    assert!(map.bfranges().is_empty());
}
