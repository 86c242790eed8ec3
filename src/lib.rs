//! Adobe CMap support: code to CID maps, CID to Unicode maps and the
//! interpreter that builds them from CMap programs.
//!
//! ```
//! use cmapdb::parse_unicode_map;
//!
//! let mut map = parse_unicode_map(b"1 beginbfrange <0010> <0012> <4E00> endbfrange");
//! assert_eq!(map.get_unichr(0x11).unwrap(), "\u{4E01}");
//! // not in the table, extended from the range above
//! assert_eq!(map.get_unichr(0x14).unwrap(), "\u{4E04}");
//! ```

mod error;
pub use error::{Error, Result};

pub mod object;
pub use object::{Dictionary, Keyword, Object, StringFormat};

pub mod parser;

pub mod charset;
pub mod cmap;
pub use cmap::{AnyCMap, CMap, CodeTrie, IdentityCMap};

pub mod unicode_map;
pub use unicode_map::{BfRange, UnicodeMap};

pub mod cmap_parser;
pub use cmap_parser::{CMapParser, CMapTarget, parse_cmap, parse_unicode_map};

mod cmapdb;
pub use cmapdb::{CMapDb, DEFAULT_CMAP_PATH};

pub mod resource;

mod glyph_names;
pub use glyph_names::name2unicode;
