//! Pre-built CMap resources: one gzip compressed JSON document per map.
//!
//! Code to CID maps store the trie as nested objects keyed by decimal byte
//! value, e.g. `{"CODE2CID": {"129": {"64": 633}}}`. CID to Unicode resources
//! carry a horizontal and a vertical table side by side.

use crate::cmap::{Attributes, CMap, CodeTrie, Edge};
use crate::object::Object;
use crate::unicode_map::UnicodeMap;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawNode {
    Cid(u32),
    Branch(BTreeMap<String, RawNode>),
}

#[derive(Debug, Serialize, Deserialize)]
struct RawCMap {
    #[serde(rename = "CMapName", default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "IS_VERTICAL", default)]
    is_vertical: bool,
    #[serde(rename = "CODE2CID")]
    code2cid: BTreeMap<String, RawNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawUnicodeMaps {
    #[serde(rename = "CMapName", default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "CID2UNICHR_H", default)]
    horizontal: BTreeMap<u32, String>,
    #[serde(rename = "CID2UNICHR_V", default)]
    vertical: BTreeMap<u32, String>,
}

fn invalid(name: &str, reason: impl ToString) -> Error {
    Error::InvalidResource {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn decode_json<T: for<'de> Deserialize<'de>, R: Read>(name: &str, reader: R) -> Result<T> {
    use flate2::read::GzDecoder;

    serde_json::from_reader(GzDecoder::new(reader)).map_err(|err| invalid(name, err))
}

fn encode_json<T: Serialize, W: Write>(value: &T, writer: W) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let mut encoder = GzEncoder::new(writer, Compression::best());
    serde_json::to_writer(&mut encoder, value)?;
    encoder.finish()?;
    Ok(())
}

fn load_node(
    name: &str, trie: &mut CodeTrie, prefix: &mut Vec<u8>, node: &BTreeMap<String, RawNode>,
) -> Result<()> {
    for (key, value) in node {
        let byte = key
            .parse::<u8>()
            .map_err(|_| invalid(name, format!("{:?} is not a byte value", key)))?;
        prefix.push(byte);
        match value {
            RawNode::Cid(cid) => trie.insert(prefix, *cid),
            RawNode::Branch(children) => load_node(name, trie, prefix, children)?,
        }
        prefix.pop();
    }
    Ok(())
}

fn store_node(trie: &CodeTrie, node: usize) -> BTreeMap<String, RawNode> {
    trie.edges(node)
        .map(|(byte, edge)| {
            let value = match edge {
                Edge::Leaf(cid) => RawNode::Cid(cid),
                Edge::Branch(next) => RawNode::Branch(store_node(trie, next)),
            };
            (byte.to_string(), value)
        })
        .collect()
}

/// Read the code to CID resource `name` from a gzip stream.
pub fn read_cmap<R: Read>(name: &str, reader: R) -> Result<CMap> {
    let raw: RawCMap = decode_json(name, reader)?;
    let mut trie = CodeTrie::new();
    load_node(name, &mut trie, &mut Vec::new(), &raw.code2cid)?;

    let mut attrs = Attributes::new();
    attrs.insert("CMapName".to_string(), Object::from(name));
    if raw.is_vertical {
        attrs.insert("WMode".to_string(), Object::Integer(1));
    }
    Ok(CMap::from_trie(attrs, trie))
}

/// Read the horizontal and vertical CID to Unicode tables of resource `name`.
pub fn read_unicode_maps<R: Read>(name: &str, reader: R) -> Result<[UnicodeMap; 2]> {
    let raw: RawUnicodeMaps = decode_json(name, reader)?;
    let attrs = |vertical: bool| {
        let mut attrs = Attributes::new();
        attrs.insert("CMapName".to_string(), Object::from(name));
        if vertical {
            attrs.insert("WMode".to_string(), Object::Integer(1));
        }
        attrs
    };
    Ok([
        UnicodeMap::from_table(attrs(false), raw.horizontal),
        UnicodeMap::from_table(attrs(true), raw.vertical),
    ])
}

pub fn write_cmap<W: Write>(cmap: &CMap, writer: W) -> Result<()> {
    let raw = RawCMap {
        name: cmap.name().map(str::to_string),
        is_vertical: cmap.is_vertical(),
        code2cid: store_node(cmap.trie(), 0),
    };
    encode_json(&raw, writer)
}

pub fn write_unicode_maps<W: Write>(horizontal: &UnicodeMap, vertical: &UnicodeMap, writer: W) -> Result<()> {
    let table = |map: &UnicodeMap| {
        map.iter()
            .map(|(cid, text)| (cid, text.to_string()))
            .collect::<BTreeMap<_, _>>()
    };
    let raw = RawUnicodeMaps {
        name: horizontal.name().or_else(|| vertical.name()).map(str::to_string),
        horizontal: table(horizontal),
        vertical: table(vertical),
    };
    encode_json(&raw, writer)
}
