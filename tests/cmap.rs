use cmapdb::{CMap, CMapDb, CMapParser, Error, parse_cmap};
use std::fs;

mod utils;

fn hex(code: &[u8]) -> String {
    code.iter().map(|byte| format!("{:02X}", byte)).collect()
}

fn parse_with(db: &CMapDb, source: &[u8]) -> CMap {
    let mut parser = CMapParser::new(CMap::new(), source).with_db(db);
    parser.run();
    parser.into_target()
}

#[test]
fn decode_concatenated_codes_in_any_order() {
    let mut pairs = Vec::new();
    for byte in 0x20u8..0x7F {
        pairs.push((vec![byte], u32::from(byte) - 0x1F));
    }
    for lead in 0x81u8..=0x84 {
        for trail in (0x40u8..=0xFC).step_by(7) {
            pairs.push((vec![lead, trail], 1000 + u32::from(lead) * 256 + u32::from(trail)));
        }
    }
    let mut source = String::from("begincidchar\n");
    for (code, cid) in &pairs {
        source.push_str(&format!("<{}> {}\n", hex(code), cid));
    }
    source.push_str("endcidchar\n");
    let cmap = parse_cmap(source.as_bytes());

    let mut order = (0..pairs.len()).collect::<Vec<_>>();
    for round in 0..3 {
        match round {
            1 => order.reverse(),
            2 => order.sort_by_key(|&i| (i * 7919) % pairs.len()),
            _ => {}
        }
        let bytes = order.iter().flat_map(|&i| pairs[i].0.clone()).collect::<Vec<u8>>();
        let cids = order.iter().map(|&i| pairs[i].1).collect::<Vec<u32>>();
        assert_eq!(cmap.decode(&bytes), cids);
    }
}

#[test]
fn cid_range_expansion() {
    let cmap = parse_cmap(b"begincidrange <0000> <0002> 10 endcidrange");
    assert_eq!(cmap.decode(&[0x00, 0x00, 0x00, 0x01, 0x00, 0x02]), vec![10, 11, 12]);
}

#[test]
fn predefined_cmap_source() {
    let source = b"%!PS-Adobe-3.0 Resource-CMap
/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo 3 dict dup begin
  /Registry (Adobe) def
  /Ordering (Japan1) def
  /Supplement 2 def
end def
/CMapName /90ms-RKSJ-H def
/CMapVersion 11.001 def
/CMapType 1 def
/WMode 0 def
4 begincodespacerange
  <00>   <80>
  <8140> <9FFC>
  <A0>   <DF>
  <E040> <FCFC>
endcodespacerange
1 beginnotdefrange
<00> <1f> 231
endnotdefrange
3 begincidrange
<20> <7d> 231
<8140> <817e> 633
<a1> <df> 326
endcidrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end
";
    let cmap = parse_cmap(source);
    assert_eq!(cmap.name(), Some("90ms-RKSJ-H"));
    assert!(!cmap.is_vertical());
    // 'A', a double byte code, a half width katakana, an unmapped control byte
    assert_eq!(cmap.decode(b"A\x81\x42\xA1\x05"), vec![231 + 0x21, 635, 326]);
}

#[test]
fn usecmap_merges_base() {
    let mut base = CMap::with_name("Base-H");
    base.add_code2cid(b"\x20", 1);
    base.add_code2cid(b"\x81\x40", 633);
    let dir = utils::cmap_dir(&[("Base-H", &base)]);
    let db = utils::db_for(&dir);

    let cmap = parse_with(&db, b"/Base-H usecmap begincidchar <8141> 634 <8240> 700 endcidchar");
    assert_eq!(cmap.decode(b"\x20\x81\x40\x81\x41\x82\x40"), vec![1, 633, 634, 700]);
}

#[test]
fn usecmap_replaces_shared_lead_byte() {
    // Intentional: every branch of the base map is installed as a fresh copy,
    // so codes defined earlier under the same lead byte are discarded.
    let mut base = CMap::with_name("Base-H");
    base.add_code2cid(b"\x81\x40", 633);
    let dir = utils::cmap_dir(&[("Base-H", &base)]);
    let db = utils::db_for(&dir);

    let cmap = parse_with(&db, b"begincidchar <8141> 634 <8240> 700 endcidchar /Base-H usecmap");
    assert!(cmap.decode(b"\x81\x41").is_empty());
    assert_eq!(cmap.decode(b"\x81\x40\x82\x40"), vec![633, 700]);
}

#[test]
fn usecmap_failures_are_not_fatal() {
    utils::init_logging();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Broken-H.json.gz"), b"garbage").unwrap();
    let db = utils::db_for(&dir);

    for base in ["Missing-H", "Broken-H", "Identity-H"] {
        let source = format!("/{} usecmap begincidchar <20> 5 endcidchar", base);
        let cmap = parse_with(&db, source.as_bytes());
        assert_eq!(cmap.trie().entries(), vec![(vec![0x20], 5)], "{}", base);
    }
    assert!(matches!(db.get_cmap("Broken-H"), Err(Error::InvalidResource { .. })));
}

#[test]
fn identity_cmap_without_disk_access() {
    let db = CMapDb::new(["/nonexistent/cmapdb"]);
    let cmap = db.get_cmap("Identity-H").unwrap();
    assert!(cmap.as_table().is_none());
    let bytes = (0u8..=255).rev().collect::<Vec<_>>();
    let expected = bytes
        .chunks(2)
        .map(|pair| (u32::from(pair[0]) << 8) | u32::from(pair[1]))
        .collect::<Vec<_>>();
    assert_eq!(cmap.decode(&bytes), expected);
    assert!(db.get_cmap("Identity-V").unwrap().is_vertical());
}

#[test]
fn unknown_resource() {
    let db = CMapDb::new(["/nonexistent/cmapdb"]);
    assert!(matches!(db.get_cmap("NoSuchCMap-X"), Err(Error::ResourceNotFound(name)) if name == "NoSuchCMap-X"));
    assert!(CMapDb::global().get_cmap("NoSuchCMap-X").unwrap_err().is_not_found());
}
