//! Code to CID maps.
//!
//! A [`CMap`] stores its codes in a byte trie: every edge is one byte of the code
//! and a path ends on the CID the code maps to. Codes of different lengths can
//! share the trie. [`IdentityCMap`] is the fixed two byte `Identity-H` / `Identity-V`
//! mapping and has no table at all.

use crate::object::Object;
use indexmap::IndexMap;
use log::warn;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Attributes set through `def`, e.g. `CMapName`, `CIDSystemInfo` or `WMode`.
pub type Attributes = IndexMap<String, Object>;

/// `WMode` is present and non-zero.
pub(crate) fn wmode_vertical(attrs: &Attributes) -> bool {
    attrs
        .get("WMode")
        .is_some_and(|wmode| !matches!(wmode, Object::Integer(0) | Object::Null))
}

/// Outgoing edge of a trie node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// The code ends here.
    Leaf(u32),
    /// More bytes follow; index of the next node.
    Branch(usize),
}

/// Byte trie stored as an arena of nodes, node 0 is the root.
///
/// Nodes cut off by an overwrite go on a free list and are handed out again,
/// so repeated merges do not grow the arena.
#[derive(Debug, Clone)]
pub struct CodeTrie {
    nodes: Vec<BTreeMap<u8, Edge>>,
    free: Vec<usize>,
}

impl Default for CodeTrie {
    fn default() -> Self {
        CodeTrie {
            nodes: vec![BTreeMap::new()],
            free: Vec::new(),
        }
    }
}

impl CodeTrie {
    const ROOT: usize = 0;

    pub fn new() -> CodeTrie {
        CodeTrie::default()
    }

    fn new_node(&mut self) -> usize {
        if let Some(node) = self.free.pop() {
            return node;
        }
        self.nodes.push(BTreeMap::new());
        self.nodes.len() - 1
    }

    /// Return `node` and everything beneath it to the free list.
    fn release(&mut self, node: usize) {
        let edges = std::mem::take(&mut self.nodes[node]);
        for edge in edges.into_values() {
            if let Edge::Branch(next) = edge {
                self.release(next);
            }
        }
        self.free.push(node);
    }

    /// Point `byte` of `node` at `edge`, releasing a subtree it replaces.
    fn set_edge(&mut self, node: usize, byte: u8, edge: Edge) {
        if let Some(Edge::Branch(old)) = self.nodes[node].insert(byte, edge) {
            self.release(old);
        }
    }

    /// Child node reached through `byte`, creating it when missing.
    ///
    /// A leaf in the way is replaced by a fresh node: the shorter code it ended
    /// is lost, the longer one being inserted wins.
    fn descend(&mut self, node: usize, byte: u8, code: &[u8]) -> usize {
        match self.nodes[node].get(&byte).copied() {
            Some(Edge::Branch(next)) => next,
            Some(Edge::Leaf(cid)) => {
                warn!(
                    "cmap: code {:02X?} overrides shorter code mapped to cid {}",
                    code, cid
                );
                let next = self.new_node();
                self.nodes[node].insert(byte, Edge::Branch(next));
                next
            }
            None => {
                let next = self.new_node();
                self.nodes[node].insert(byte, Edge::Branch(next));
                next
            }
        }
    }

    /// Insert `code`. An existing branch at the final byte is replaced by the
    /// leaf, dropping the longer codes beneath it. Empty codes are ignored.
    pub fn insert(&mut self, code: &[u8], cid: u32) {
        let Some((&last, prefix)) = code.split_last() else {
            return;
        };
        let mut node = Self::ROOT;
        for &byte in prefix {
            node = self.descend(node, byte, code);
        }
        self.set_edge(node, last, Edge::Leaf(cid));
    }

    pub fn get(&self, code: &[u8]) -> Option<u32> {
        let mut node = Self::ROOT;
        let (&last, prefix) = code.split_last()?;
        for byte in prefix {
            match self.nodes[node].get(byte)? {
                Edge::Branch(next) => node = *next,
                Edge::Leaf(_) => return None,
            }
        }
        match self.nodes[node].get(&last)? {
            Edge::Leaf(cid) => Some(*cid),
            Edge::Branch(_) => None,
        }
    }

    /// Decode a byte string into CIDs.
    ///
    /// The walk restarts at the root after each CID. A byte with no edge from the
    /// current node is dropped and the walk restarts, so misaligned or unmapped
    /// input never fails.
    pub fn decode(&self, code: &[u8]) -> Vec<u32> {
        let mut cids = Vec::new();
        let mut node = Self::ROOT;
        for byte in code {
            match self.nodes[node].get(byte) {
                Some(Edge::Leaf(cid)) => {
                    cids.push(*cid);
                    node = Self::ROOT;
                }
                Some(Edge::Branch(next)) => node = *next,
                None => node = Self::ROOT,
            }
        }
        cids
    }

    /// Copy every branch of `src` into this trie.
    ///
    /// For each key present in `src`, a new node is installed here and only the
    /// source subtree is copied beneath it. Whatever this trie held under the same
    /// key is discarded, not merged; keys only present here are kept.
    pub fn copy_from(&mut self, src: &CodeTrie) {
        self.copy_node(Self::ROOT, src, Self::ROOT);
    }

    fn copy_node(&mut self, dst: usize, src: &CodeTrie, src_node: usize) {
        for (&byte, edge) in &src.nodes[src_node] {
            match *edge {
                Edge::Leaf(cid) => self.set_edge(dst, byte, Edge::Leaf(cid)),
                Edge::Branch(next) => {
                    if let Some(Edge::Branch(old)) = self.nodes[dst].remove(&byte) {
                        self.release(old);
                    }
                    let node = self.new_node();
                    self.nodes[dst].insert(byte, Edge::Branch(node));
                    self.copy_node(node, src, next);
                }
            }
        }
    }

    /// Every `(code, cid)` pair, ordered by code bytes.
    pub fn entries(&self) -> Vec<(Vec<u8>, u32)> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        self.collect(Self::ROOT, &mut prefix, &mut out);
        out
    }

    fn collect(&self, node: usize, prefix: &mut Vec<u8>, out: &mut Vec<(Vec<u8>, u32)>) {
        for (&byte, edge) in &self.nodes[node] {
            prefix.push(byte);
            match *edge {
                Edge::Leaf(cid) => out.push((prefix.clone(), cid)),
                Edge::Branch(next) => self.collect(next, prefix, out),
            }
            prefix.pop();
        }
    }

    /// Edges leaving the node `node`, the root being `0`.
    pub fn edges(&self, node: usize) -> impl Iterator<Item = (u8, Edge)> + '_ {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(&byte, &edge)| (byte, edge)))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[Self::ROOT].is_empty()
    }
}

/// Code to CID map built from a CMap program or loaded from a resource.
#[derive(Debug, Clone, Default)]
pub struct CMap {
    pub attrs: Attributes,
    code2cid: CodeTrie,
}

impl CMap {
    pub fn new() -> CMap {
        CMap::default()
    }

    pub fn with_name(name: &str) -> CMap {
        let mut cmap = CMap::new();
        cmap.set_attr("CMapName", Object::from(name));
        cmap
    }

    pub(crate) fn from_trie(attrs: Attributes, code2cid: CodeTrie) -> CMap {
        CMap { attrs, code2cid }
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

    pub fn add_code2cid(&mut self, code: &[u8], cid: u32) {
        self.code2cid.insert(code, cid);
    }

    /// Merge the codes of `other`, see [`CodeTrie::copy_from`] for the exact rules.
    pub fn use_cmap(&mut self, other: &CMap) {
        self.code2cid.copy_from(&other.code2cid);
    }

    pub fn decode(&self, code: &[u8]) -> Vec<u32> {
        self.code2cid.decode(code)
    }

    pub fn trie(&self) -> &CodeTrie {
        &self.code2cid
    }

    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (code, cid) in self.code2cid.entries() {
            writeln!(out, "code {:?} = cid {}", code, cid)?;
        }
        Ok(())
    }
}

/// The predefined `Identity-H` and `Identity-V` maps: two byte big-endian codes
/// whose value is the CID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityCMap {
    vertical: bool,
}

impl IdentityCMap {
    pub const fn new(vertical: bool) -> IdentityCMap {
        IdentityCMap { vertical }
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    /// A trailing odd byte is dropped.
    pub fn decode(&self, code: &[u8]) -> Vec<u32> {
        code.chunks_exact(2)
            .map(|pair| u32::from(u16::from_be_bytes([pair[0], pair[1]])))
            .collect()
    }
}

/// Either kind of code to CID map, as handed out by the resource cache.
#[derive(Debug, Clone)]
pub enum AnyCMap {
    Identity(IdentityCMap),
    Table(CMap),
}

impl AnyCMap {
    pub fn decode(&self, code: &[u8]) -> Vec<u32> {
        match self {
            AnyCMap::Identity(identity) => identity.decode(code),
            AnyCMap::Table(cmap) => cmap.decode(code),
        }
    }

    pub fn is_vertical(&self) -> bool {
        match self {
            AnyCMap::Identity(identity) => identity.is_vertical(),
            AnyCMap::Table(cmap) => cmap.is_vertical(),
        }
    }

    pub fn as_table(&self) -> Option<&CMap> {
        match self {
            AnyCMap::Table(cmap) => Some(cmap),
            AnyCMap::Identity(_) => None,
        }
    }
}

impl From<CMap> for AnyCMap {
    fn from(cmap: CMap) -> Self {
        AnyCMap::Table(cmap)
    }
}
