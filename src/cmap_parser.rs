//! Interpreter for CMap programs.
//!
//! The lexer feeds objects onto an operand stack and every CMap keyword consumes
//! what it needs from there. Keywords the interpreter does not know are pushed
//! back as operands, so PostScript boilerplate around the map (`findresource`,
//! `dict`, `defineresource` ...) passes through harmlessly.

use crate::charset::charset_of;
use crate::cmap::{AnyCMap, CMap};
use crate::cmapdb::CMapDb;
use crate::object::{Keyword, Object, nunpack};
use crate::parser::Lexer;
use crate::parser::stack::OperandStack;
use crate::unicode_map::{BfRange, UnicodeMap};
use crate::{Error, Result};
use log::{debug, warn};

/// Largest number of codes a single cidrange or bfrange entry may expand to.
pub const MAX_RANGE_LEN: u32 = 0x10000;

/// A store the interpreter can populate.
///
/// Code to CID maps ignore the Unicode operations and vice versa.
pub trait CMapTarget {
    fn set_attr(&mut self, key: &str, value: Object);

    fn add_code2cid(&mut self, _code: &[u8], _cid: u32) {}

    fn add_cid2unichr(&mut self, _cid: u32, _code: &Object) -> Result<()> {
        Ok(())
    }

    fn has_unichr(&self, _cid: u32) -> bool {
        false
    }

    fn use_cmap(&mut self, _cmap: &AnyCMap) {}

    fn set_bfranges(&mut self, _ranges: Vec<BfRange>) {}
}

impl CMapTarget for CMap {
    fn set_attr(&mut self, key: &str, value: Object) {
        CMap::set_attr(self, key, value);
    }

    fn add_code2cid(&mut self, code: &[u8], cid: u32) {
        CMap::add_code2cid(self, code, cid);
    }

    fn use_cmap(&mut self, cmap: &AnyCMap) {
        match cmap {
            AnyCMap::Table(cmap) => CMap::use_cmap(self, cmap),
            AnyCMap::Identity(_) => warn!("usecmap: identity maps cannot be merged into {:?}", self.name()),
        }
    }
}

impl CMapTarget for UnicodeMap {
    fn set_attr(&mut self, key: &str, value: Object) {
        UnicodeMap::set_attr(self, key, value);
    }

    fn add_cid2unichr(&mut self, cid: u32, code: &Object) -> Result<()> {
        UnicodeMap::add_cid2unichr(self, cid, code)
    }

    fn has_unichr(&self, cid: u32) -> bool {
        self.contains(cid)
    }

    fn set_bfranges(&mut self, ranges: Vec<BfRange>) {
        UnicodeMap::set_bfranges(self, ranges);
    }
}

/// Number of codes in `start..=end`, rejecting reversed and oversized ranges.
fn range_len(start: u32, end: u32, keyword: &'static str) -> Option<u32> {
    if end < start {
        warn!("{}: reversed range {:#x}..{:#x} ignored", keyword, start, end);
        return None;
    }
    let len = end - start;
    if len >= MAX_RANGE_LEN {
        warn!("{}: range {:#x}..{:#x} too large, ignored", keyword, start, end);
        return None;
    }
    Some(len + 1)
}

/// `prefix` followed by the low `width` bytes of `value`.
fn code_bytes(prefix: &[u8], value: u32, width: usize) -> Vec<u8> {
    let mut code = prefix.to_vec();
    code.extend_from_slice(&value.to_be_bytes()[4 - width..]);
    code
}

pub struct CMapParser<'a, T: CMapTarget> {
    target: T,
    lexer: Lexer<'a>,
    stack: OperandStack,
    db: &'a CMapDb,
    // some ToUnicode maps have no begincmap
    in_cmap: bool,
    accepted: Vec<BfRange>,
    dropped: Vec<BfRange>,
}

impl<'a, T: CMapTarget> CMapParser<'a, T> {
    /// Interpreter over `data`, resolving `usecmap` through [`CMapDb::global`].
    pub fn new(target: T, data: &'a [u8]) -> Self {
        CMapParser {
            target,
            lexer: Lexer::new(data),
            stack: OperandStack::new(),
            db: CMapDb::global(),
            in_cmap: true,
            accepted: Vec::new(),
            dropped: Vec::new(),
        }
    }

    /// Resolve `usecmap` through `db` instead of the process wide cache.
    pub fn with_db(mut self, db: &'a CMapDb) -> Self {
        self.db = db;
        self
    }

    /// Interpret the whole input, then repair the collected bfranges.
    pub fn run(&mut self) {
        while let Some((pos, object)) = self.lexer.next() {
            match object {
                Object::Keyword(keyword) => self.do_keyword(pos, keyword),
                object => self.stack.push(pos, object),
            }
        }
        self.fixup_bfranges();
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    /// bfrange entries, or parts of them, that were never applied.
    pub fn dropped(&self) -> &[BfRange] {
        &self.dropped
    }

    fn do_keyword(&mut self, pos: usize, keyword: Keyword) {
        let result = match keyword {
            Keyword::BeginCMap => {
                self.in_cmap = true;
                self.stack.popall();
                Ok(())
            }
            Keyword::EndCMap => {
                self.in_cmap = false;
                Ok(())
            }
            _ if !self.in_cmap => Ok(()),
            Keyword::Def => self.do_def(keyword.name()),
            Keyword::UseCMap => self.do_usecmap(keyword.name()),
            Keyword::EndCidRange => {
                self.end_cid_range();
                Ok(())
            }
            Keyword::EndCidChar => {
                self.end_cid_char();
                Ok(())
            }
            Keyword::EndBfRange => {
                self.end_bf_range();
                Ok(())
            }
            Keyword::EndBfChar => {
                self.end_bf_char();
                Ok(())
            }
            Keyword::BeginCodeSpaceRange
            | Keyword::EndCodeSpaceRange
            | Keyword::BeginCidRange
            | Keyword::BeginCidChar
            | Keyword::BeginBfRange
            | Keyword::BeginBfChar
            | Keyword::BeginNotDefRange
            | Keyword::EndNotDefRange => {
                self.stack.popall();
                Ok(())
            }
            Keyword::Other(_) => {
                self.stack.push(pos, Object::Keyword(keyword));
                Ok(())
            }
        };
        if let Err(err) = result {
            debug!("cmap: operation at {} skipped: {}", pos, err);
        }
    }

    fn do_def(&mut self, op: &'static str) -> Result<()> {
        let mut operands = self.stack.pop(2, op)?.into_iter().map(|(_, obj)| obj);
        let (Some(key), Some(value)) = (operands.next(), operands.next()) else {
            return Err(Error::malformed(op, "missing operands"));
        };
        let key = key
            .as_name_str()
            .ok_or_else(|| Error::malformed(op, format!("key is {}", key.enum_variant())))?;
        self.target.set_attr(key, value);
        Ok(())
    }

    fn do_usecmap(&mut self, op: &'static str) -> Result<()> {
        let operands = self.stack.pop(1, op)?;
        let name = operands
            .first()
            .and_then(|(_, obj)| obj.as_name_str())
            .ok_or_else(|| Error::malformed(op, "operand is not a name"))?;
        match self.db.get_cmap(name) {
            Ok(cmap) => self.target.use_cmap(&cmap),
            Err(err) => warn!("usecmap {}: {}", name, err),
        }
        Ok(())
    }

    fn drain(&mut self) -> Vec<Object> {
        self.stack.popall().into_iter().map(|(_, obj)| obj).collect()
    }

    fn end_cid_range(&mut self) {
        for group in self.drain().chunks_exact(3) {
            let (Some(start), Some(end), Some(cid)) = (group[0].as_str(), group[1].as_str(), group[2].as_i64()) else {
                debug!("endcidrange: skipping {:?}", group);
                continue;
            };
            let Ok(cid) = u32::try_from(cid) else {
                debug!("endcidrange: negative cid {}", cid);
                continue;
            };
            if start.len() != end.len() {
                debug!("endcidrange: code lengths differ in {:?}", group);
                continue;
            }
            let split = start.len().saturating_sub(4);
            let (prefix, start_var) = start.split_at(split);
            let (end_prefix, end_var) = end.split_at(split);
            if prefix != end_prefix {
                debug!("endcidrange: code prefixes differ in {:?}", group);
                continue;
            }
            let first = nunpack(start_var);
            let Some(len) = range_len(first, nunpack(end_var), "endcidrange") else {
                continue;
            };
            for i in 0..len {
                let Some(value) = cid.checked_add(i) else {
                    break;
                };
                let code = code_bytes(prefix, first + i, start_var.len());
                self.target.add_code2cid(&code, value);
            }
        }
    }

    fn end_cid_char(&mut self) {
        for pair in self.drain().chunks_exact(2) {
            let Some(code) = pair[0].as_str() else {
                debug!("endcidchar: skipping {:?}", pair);
                continue;
            };
            let cid = match &pair[1] {
                Object::Integer(cid) => u32::try_from(*cid).ok(),
                Object::String(cid, _) => Some(nunpack(cid)),
                _ => None,
            };
            match cid {
                Some(cid) => self.target.add_code2cid(code, cid),
                None => debug!("endcidchar: skipping {:?}", pair),
            }
        }
    }

    fn end_bf_range(&mut self) {
        for group in self.drain().chunks_exact(3) {
            let (Some(start), Some(end)) = (group[0].as_str(), group[1].as_str()) else {
                debug!("endbfrange: skipping {:?}", group);
                continue;
            };
            if start.len() != end.len() {
                debug!("endbfrange: code lengths differ in {:?}", group);
                continue;
            }
            let (first, last) = (nunpack(start), nunpack(end));
            let Some(len) = range_len(first, last, "endbfrange") else {
                continue;
            };
            match &group[2] {
                Object::Array(codes) => {
                    if codes.len() as u64 != u64::from(len) {
                        debug!("endbfrange: {} codes for {} cids", codes.len(), len);
                        continue;
                    }
                    for (cid, code) in (first..=last).zip(codes) {
                        self.add_unichr(cid, code);
                    }
                }
                Object::String(code, _) => self.add_bf_base_range(first, last, code),
                other => debug!("endbfrange: unexpected destination {:?}", other),
            }
        }
    }

    /// Apply `first..=last` mapped from the UTF-16BE string `code`, cut at the
    /// end of the Unicode block the base scalar lives in.
    fn add_bf_base_range(&mut self, first: u32, last: u32, code: &[u8]) {
        let split = code.len().saturating_sub(4);
        let (prefix, var) = code.split_at(split);
        let base = nunpack(var);
        let Some(charset) = charset_of(base) else {
            self.dropped.push(BfRange::new(first, last, base));
            return;
        };
        let room = charset.high - base;
        let accepted_last = last.min(first.saturating_add(room));
        for i in 0..=(accepted_last - first) {
            let code = Object::hex_string(code_bytes(prefix, base + i, var.len()));
            self.add_unichr(first + i, &code);
        }
        self.accepted.push(BfRange::new(first, accepted_last, base));
        if accepted_last < last {
            let tail = accepted_last + 1;
            self.dropped.push(BfRange::new(tail, last, base + (tail - first)));
        }
    }

    fn end_bf_char(&mut self) {
        for pair in self.drain().chunks_exact(2) {
            let Some(cid) = pair[0].as_str() else {
                debug!("endbfchar: skipping {:?}", pair);
                continue;
            };
            self.add_unichr(nunpack(cid), &pair[1]);
        }
    }

    fn add_unichr(&mut self, cid: u32, code: &Object) {
        if let Err(err) = self.target.add_cid2unichr(cid, code) {
            debug!("cid {}: {}", cid, err);
        }
    }

    fn fixup_bfranges(&mut self) {
        if !self.dropped.is_empty() {
            warn!("dropped unexpected bfrange items: {:?}", self.dropped);
        }
        if self.accepted.is_empty() {
            return;
        }
        let accepted = std::mem::take(&mut self.accepted);
        let merged = self.fill_by_ranges(&accepted);
        let kept = merged
            .iter()
            .enumerate()
            .filter(|&(idx, _)| !is_subset_of_ranges(&merged, idx))
            .map(|(_, range)| *range)
            .collect::<Vec<_>>();
        let ranges = if kept.len() != merged.len() {
            self.fill_by_ranges(&kept)
        } else {
            kept
        };
        self.target.set_bfranges(ranges);
    }

    /// Collapse ranges sharing an offset, filling the CIDs between them.
    fn fill_by_ranges(&mut self, ranges: &[BfRange]) -> Vec<BfRange> {
        let mut sorted = ranges.to_vec();
        sorted.sort_by_key(|range| range.start);

        let mut merged = Vec::new();
        let mut current: Option<BfRange> = None;
        for item in sorted {
            if let Some(last) = current.as_mut().filter(|last| last.offset == item.offset) {
                let (gap_start, gap_end) = (last.end.saturating_add(1), item.start);
                last.end = last.end.max(item.end);
                self.fill_gap(gap_start, gap_end, item.offset);
                continue;
            }
            if let Some(done) = current.replace(item) {
                merged.push(done);
            }
        }
        merged.extend(current);
        merged
    }

    /// Map CIDs `start..end` without an entry to `cid + offset`.
    fn fill_gap(&mut self, start: u32, end: u32, offset: i64) {
        if end <= start {
            return;
        }
        if end - start > MAX_RANGE_LEN {
            debug!("bfrange gap {}..{} too large to fill", start, end);
            return;
        }
        for cid in start..end {
            if !self.target.has_unichr(cid) {
                self.add_unichr(cid, &Object::Integer(i64::from(cid) + offset));
            }
        }
    }
}

/// The Unicode interval of `ranges[idx]` lies within that of another range.
fn is_subset_of_ranges(ranges: &[BfRange], idx: usize) -> bool {
    let range = &ranges[idx];
    ranges
        .iter()
        .enumerate()
        .any(|(i, other)| i != idx && range.base >= other.base && range.base_end() <= other.base_end())
}

/// Build a code to CID map from CMap source text.
pub fn parse_cmap(data: &[u8]) -> CMap {
    let mut parser = CMapParser::new(CMap::new(), data);
    parser.run();
    parser.into_target()
}

/// Build a CID to Unicode map from ToUnicode CMap source text.
pub fn parse_unicode_map(data: &[u8]) -> UnicodeMap {
    let mut parser = CMapParser::new(UnicodeMap::new(), data);
    parser.run();
    parser.into_target()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unicode_parser(data: &[u8]) -> CMapParser<'_, UnicodeMap> {
        let mut parser = CMapParser::new(UnicodeMap::new(), data);
        parser.run();
        parser
    }

    #[test]
    fn malformed_def_names_the_operator() {
        let mut parser = CMapParser::new(CMap::new(), b"");
        parser.stack.push(0, Object::Integer(1));
        let err = parser.do_def(Keyword::Def.name()).unwrap_err();
        assert!(matches!(err, Error::MalformedOperands { keyword: "def", .. }));

        parser.stack.push(0, Object::Integer(1));
        parser.stack.push(1, Object::Integer(0));
        let err = parser.do_def(Keyword::Def.name()).unwrap_err();
        assert!(matches!(err, Error::MalformedOperands { keyword: "def", ref reason } if reason == "key is Integer"));

        parser.stack.push(0, Object::Integer(7));
        let err = parser.do_usecmap(Keyword::UseCMap.name()).unwrap_err();
        assert!(matches!(err, Error::MalformedOperands { keyword: "usecmap", .. }));
    }

    #[test]
    fn cid_range_expansion() {
        let cmap = parse_cmap(b"1 begincidrange <0000> <0002> 10 endcidrange");
        assert_eq!(cmap.decode(b"\x00\x00\x00\x01\x00\x02"), vec![10, 11, 12]);
    }

    #[test]
    fn cid_range_keeps_prefix() {
        let cmap = parse_cmap(b"begincidrange <01020304FE> <01020305FF> 100 endcidrange");
        // the leading byte is a fixed prefix, the trailing four bytes count up
        assert_eq!(cmap.decode(b"\x01\x02\x03\x04\xFE\x01\x02\x03\x05\x00"), vec![100, 102]);
    }

    #[test]
    fn cid_range_rejects_bad_groups() {
        let cmap = parse_cmap(
            b"begincidrange <0002> <0000> 10 <00> <0001> 20 <0100000000> <0200000000> 30 <0000> <FFFF> -1 endcidrange",
        );
        assert!(cmap.trie().is_empty());
    }

    #[test]
    fn cid_range_size_limit() {
        let cmap = parse_cmap(b"begincidrange <00000000> <00010000> 1 endcidrange");
        assert!(cmap.trie().is_empty());
        let cmap = parse_cmap(b"begincidrange <00000000> <0000FFFF> 1 endcidrange");
        assert_eq!(cmap.decode(b"\x00\x00\xFF\xFF"), vec![0x10000]);
    }

    #[test]
    fn cid_char() {
        let cmap = parse_cmap(b"2 begincidchar <8140> 633 <20> <0001> endcidchar");
        assert_eq!(cmap.decode(b"\x81\x40\x20"), vec![633, 1]);
    }

    #[test]
    fn def_sets_attributes() {
        let cmap = parse_cmap(b"/CMapName /UniJIS-UTF16-V def /WMode 1 def 42 def");
        assert_eq!(cmap.name(), Some("UniJIS-UTF16-V"));
        assert!(cmap.is_vertical());
    }

    #[test]
    fn keywords_after_endcmap_are_ignored() {
        let cmap = parse_cmap(
            b"begincmap endcmap /WMode 1 def begincidrange <00> <01> 5 endcidrange begincmap /CMapName /X def",
        );
        assert!(!cmap.is_vertical());
        assert!(cmap.trie().is_empty());
        assert_eq!(cmap.name(), Some("X"));
    }

    #[test]
    fn begincmap_clears_stack() {
        let cmap = parse_cmap(b"/WMode begincmap 1 def");
        assert!(!cmap.is_vertical());
    }

    #[test]
    fn unknown_keywords_are_operands() {
        // `dup` lands on the stack, so `def` pairs it with /WMode
        let cmap = parse_cmap(b"/WMode dup def");
        assert_eq!(cmap.attrs.get("WMode"), Some(&Object::Keyword(Keyword::Other(b"dup".to_vec()))));
    }

    #[test]
    fn bf_range_list() {
        let map = parse_unicode_map(b"1 beginbfrange <0000> <0002> [<0041> <0042> <0043>] endbfrange");
        assert_eq!(map.get(0).unwrap(), "A");
        assert_eq!(map.get(1).unwrap(), "B");
        assert_eq!(map.get(2).unwrap(), "C");
        assert!(map.bfranges().is_empty());
    }

    #[test]
    fn bf_range_list_length_mismatch() {
        let map = parse_unicode_map(b"beginbfrange <0000> <0002> [<0041> <0042>] endbfrange");
        assert!(map.is_empty());
    }

    #[test]
    fn bf_range_base_string() {
        let map = parse_unicode_map(b"beginbfrange <0010> <0012> <4E00> endbfrange");
        assert_eq!(map.get(0x10).unwrap(), "\u{4E00}");
        assert_eq!(map.get(0x12).unwrap(), "\u{4E02}");
        assert_eq!(map.bfranges(), &[BfRange::new(0x10, 0x12, 0x4E00)]);
    }

    #[test]
    fn bf_range_truncated_at_block_end() {
        // Basic Latin ends at 0x7F, four steps after 0x7C
        let parser = unicode_parser(b"beginbfrange <0000> <0009> <007C> endbfrange");
        let map = parser.target();
        assert_eq!(map.get(3).unwrap(), "\u{7F}");
        assert!(map.get(4).is_err());
        assert_eq!(map.bfranges(), &[BfRange::new(0, 3, 0x7C)]);
        assert_eq!(parser.dropped(), &[BfRange::new(4, 9, 0x80)]);
    }

    #[test]
    fn bf_range_outside_blocks_dropped() {
        let parser = unicode_parser(b"beginbfrange <0000> <0001> <D83DDE00> endbfrange");
        assert!(parser.target().is_empty());
        assert_eq!(parser.dropped(), &[BfRange::new(0, 1, 0xD83DDE00)]);
    }

    #[test]
    fn bf_char() {
        let map = parse_unicode_map(b"2 beginbfchar <0003> <0020> <0004> <00660069> <0005> /Aacute endbfchar");
        assert_eq!(map.get(3).unwrap(), " ");
        assert_eq!(map.get(4).unwrap(), "fi");
        assert_eq!(map.get(5).unwrap(), "\u{C1}");
    }

    #[test]
    fn adjacent_ranges_fill_gap() {
        let map = parse_unicode_map(b"beginbfrange <0000> <0004> <0064> <000A> <000E> <006E> endbfrange");
        for cid in 0..=14 {
            let expected = char::from_u32(cid + 100).unwrap().to_string();
            assert_eq!(map.get(cid).unwrap(), expected);
        }
        assert_eq!(map.bfranges(), &[BfRange::new(0, 14, 100)]);
    }

    #[test]
    fn gap_fill_keeps_existing_entries() {
        let map = parse_unicode_map(
            b"beginbfchar <0006> <0021> endbfchar beginbfrange <0000> <0004> <0064> <000A> <000E> <006E> endbfrange",
        );
        assert_eq!(map.get(6).unwrap(), "!");
        assert_eq!(map.get(7).unwrap(), "k");
    }

    #[test]
    fn subset_range_eliminated() {
        let map = parse_unicode_map(b"beginbfrange <0000> <0009> <4E00> <0020> <0022> <4E02> endbfrange");
        assert_eq!(map.bfranges(), &[BfRange::new(0, 9, 0x4E00)]);
        // the direct entries of both ranges stay
        assert_eq!(map.get(0x21).unwrap(), "\u{4E03}");
    }

    #[test]
    fn extrapolate_from_parsed_ranges() {
        let mut map = parse_unicode_map(b"beginbfrange <0010> <0012> <4E00> endbfrange");
        assert_eq!(map.get_unichr(0x14).unwrap(), "\u{4E04}");
        assert!(map.get(0x14).is_ok());
        assert!(matches!(map.get_unichr(0x9000), Err(Error::UndefinedCid(0x9000))));
    }

    #[test]
    fn tolerates_unbalanced_input() {
        let map = parse_unicode_map(b"endbfchar <0001> beginbfchar <0001> endbfrange <0041> ] >> endbfchar");
        assert!(map.is_empty());
    }
}
