//! CID to Unicode maps.

use crate::charset::same_charset;
use crate::cmap::{Attributes, wmode_vertical};
use crate::glyph_names::name2unicode;
use crate::object::Object;
use crate::{Error, Result};
use encoding_rs::UTF_16BE;
use log::info;
use std::char::REPLACEMENT_CHARACTER;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

/// A run of consecutive CIDs mapped to consecutive Unicode scalars.
///
/// CIDs `start..=end` map to `base + (cid - start)`; `offset` is `base - start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BfRange {
    pub start: u32,
    pub end: u32,
    pub base: u32,
    pub offset: i64,
}

impl BfRange {
    pub fn new(start: u32, end: u32, base: u32) -> BfRange {
        BfRange {
            start,
            end,
            base,
            offset: i64::from(base) - i64::from(start),
        }
    }

    /// Last Unicode scalar the range maps to.
    pub fn base_end(&self) -> u32 {
        self.base.saturating_add(self.end - self.start)
    }

    /// Scalar `cid` maps to when this range is extended to cover it.
    pub fn scalar_for(&self, cid: u32) -> Option<u32> {
        u32::try_from(i64::from(cid) + self.offset).ok()
    }

    /// `cid` shifted by the offset lands in the block that holds `base`.
    pub fn same_charset(&self, cid: u32) -> bool {
        self.scalar_for(cid)
            .is_some_and(|scalar| same_charset(scalar, self.base))
    }
}

impl fmt::Display for BfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, 0x{:X}, {})", self.start, self.end, self.base, self.offset)
    }
}

/// Decode UTF-16BE, dropping unpaired surrogates and a trailing odd byte.
pub fn decode_utf16be(bytes: &[u8]) -> String {
    match UTF_16BE.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text.into_owned(),
        None => {
            let (text, _) = UTF_16BE.decode_without_bom_handling(bytes);
            text.chars().filter(|&ch| ch != REPLACEMENT_CHARACTER).collect()
        }
    }
}

/// CID to Unicode table, with the bfrange index used to fill gaps.
#[derive(Debug, Clone, Default)]
pub struct UnicodeMap {
    pub attrs: Attributes,
    cid2unichr: BTreeMap<u32, String>,
    bfranges: Vec<BfRange>,
}

impl UnicodeMap {
    pub fn new() -> UnicodeMap {
        UnicodeMap::default()
    }

    pub fn with_name(name: &str) -> UnicodeMap {
        let mut map = UnicodeMap::new();
        map.set_attr("CMapName", Object::from(name));
        map
    }

    pub(crate) fn from_table(attrs: Attributes, cid2unichr: BTreeMap<u32, String>) -> UnicodeMap {
        UnicodeMap {
            attrs,
            cid2unichr,
            bfranges: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.attrs.get("CMapName").and_then(Object::as_name_str)
    }

    pub fn is_vertical(&self) -> bool {
        wmode_vertical(&self.attrs)
    }

    pub fn set_attr(&mut self, key: &str, value: Object) {
        self.attrs.insert(key.to_string(), value);
    }

    /// Map `cid` to the text `code` stands for.
    ///
    /// Byte strings are UTF-16BE, names are glyph names and integers are scalar values.
    pub fn add_cid2unichr(&mut self, cid: u32, code: &Object) -> Result<()> {
        let text = match code {
            Object::String(bytes, _) => decode_utf16be(bytes),
            Object::Name(name) => name2unicode(&String::from_utf8_lossy(name))?,
            Object::Integer(value) => u32::try_from(*value)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .ok_or_else(|| Error::malformed("bfchar", format!("{} is not a unicode scalar", value)))?,
            other => {
                return Err(Error::malformed(
                    "bfchar",
                    format!("cannot map cid {} to {}", cid, other.enum_variant()),
                ));
            }
        };
        self.cid2unichr.insert(cid, text);
        Ok(())
    }

    pub fn insert(&mut self, cid: u32, text: String) {
        self.cid2unichr.insert(cid, text);
    }

    pub fn contains(&self, cid: u32) -> bool {
        self.cid2unichr.contains_key(&cid)
    }

    /// Direct lookup, no extrapolation.
    pub fn get(&self, cid: u32) -> Result<&str> {
        self.cid2unichr
            .get(&cid)
            .map(String::as_str)
            .ok_or(Error::UndefinedCid(cid))
    }

    /// Look up `cid`, extending the nearest compatible bfrange when it has no entry.
    ///
    /// A synthesized mapping is stored so later lookups hit the table directly.
    pub fn get_unichr(&mut self, cid: u32) -> Result<&str> {
        if !self.cid2unichr.contains_key(&cid) {
            if let Some((range, ch)) = self.extrapolate(cid) {
                info!(
                    "cmap bfrange {}: mapping undefined cid 0x{:x}({}) to 0x{:x}: {}",
                    range, cid, cid, ch as u32, ch
                );
                self.cid2unichr.insert(cid, ch.to_string());
            }
        }
        self.get(cid)
    }

    /// Scalar `cid` would get from its nearest compatible bfrange, if any.
    pub fn extrapolate(&self, cid: u32) -> Option<(BfRange, char)> {
        let range = self.get_nearest_bfrange(cid)?;
        let ch = range.scalar_for(cid).and_then(char::from_u32)?;
        Some((range, ch))
    }

    /// The range before or after `cid` whose offset keeps `cid` inside the
    /// range's own Unicode block. When both qualify the closer one wins, ties
    /// going to the following range.
    pub fn get_nearest_bfrange(&self, cid: u32) -> Option<BfRange> {
        let idx = self.bfranges.partition_point(|range| range.start <= cid);
        let prev = idx.checked_sub(1).map(|i| self.bfranges[i]);
        let next = self.bfranges.get(idx).copied();

        let prev = prev.filter(|range| range.same_charset(cid));
        let next = next.filter(|range| range.same_charset(cid));
        match (prev, next) {
            (Some(prev), Some(next)) => {
                let after_prev = i64::from(cid) - i64::from(prev.end);
                let before_next = i64::from(next.start) - i64::from(cid);
                Some(if after_prev < before_next { prev } else { next })
            }
            (prev, next) => prev.or(next),
        }
    }

    /// Install the extrapolation index, kept sorted by start CID.
    pub fn set_bfranges(&mut self, mut ranges: Vec<BfRange>) {
        ranges.sort_by_key(|range| range.start);
        self.bfranges = ranges;
    }

    pub fn bfranges(&self) -> &[BfRange] {
        &self.bfranges
    }

    pub fn len(&self) -> usize {
        self.cid2unichr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cid2unichr.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.cid2unichr.iter().map(|(&cid, text)| (cid, text.as_str()))
    }

    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (cid, text) in self.iter() {
            writeln!(out, "cid {} = unicode {:?}", cid, text)?;
        }
        Ok(())
    }
}
