use cmapdb::resource::{write_cmap, write_unicode_maps};
use cmapdb::{CMap, CMapDb, UnicodeMap};
use std::fs::File;
use tempfile::TempDir;

/// ToUnicode map in the shape PDF producers usually emit.
#[allow(dead_code)]
pub const TO_UNICODE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
3 beginbfchar
<0003> <0020>
<0011> <002E>
<0024> <0041>
endbfchar
2 beginbfrange
<0044> <0046> <0061>
<0050> <0052> [<0066> <00660069> <006C>]
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Directory holding `<name>.json.gz` for every given map.
#[allow(dead_code)]
pub fn cmap_dir(cmaps: &[(&str, &CMap)]) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    for (name, cmap) in cmaps {
        let file = File::create(dir.path().join(format!("{}.json.gz", name))).expect("resource file");
        write_cmap(cmap, file).expect("write resource");
    }
    dir
}

/// Directory holding `to-unicode-<name>.json.gz`.
#[allow(dead_code)]
pub fn unicode_dir(name: &str, horizontal: &UnicodeMap, vertical: &UnicodeMap) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    let file = File::create(dir.path().join(format!("to-unicode-{}.json.gz", name))).expect("resource file");
    write_unicode_maps(horizontal, vertical, file).expect("write resource");
    dir
}

#[allow(dead_code)]
pub fn db_for(dir: &TempDir) -> CMapDb {
    CMapDb::new([dir.path()])
}
