use indexmap::IndexMap;
use std::fmt;
use std::str;

/// Dictionary object, `<< /Key value ... >>`, keeps insertion order.
pub type Dictionary = IndexMap<Vec<u8>, Object>;

/// Values produced by the CMap tokenizer.
#[derive(Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Vec<u8>),
    String(Vec<u8>, StringFormat),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Keyword(Keyword),
}

/// String objects can be written in two formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringFormat {
    #[default]
    Literal,
    Hexadecimal,
}

/// Operator tokens. Those the CMap interpreter dispatches on have their own
/// variant, everything else is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    BeginCMap,
    EndCMap,
    UseCMap,
    Def,
    BeginCodeSpaceRange,
    EndCodeSpaceRange,
    BeginCidRange,
    EndCidRange,
    BeginCidChar,
    EndCidChar,
    BeginBfRange,
    EndBfRange,
    BeginBfChar,
    EndBfChar,
    BeginNotDefRange,
    EndNotDefRange,
    Other(Vec<u8>),
}

const KEYWORDS: [(&str, Keyword); 16] = [
    ("begincmap", Keyword::BeginCMap),
    ("endcmap", Keyword::EndCMap),
    ("usecmap", Keyword::UseCMap),
    ("def", Keyword::Def),
    ("begincodespacerange", Keyword::BeginCodeSpaceRange),
    ("endcodespacerange", Keyword::EndCodeSpaceRange),
    ("begincidrange", Keyword::BeginCidRange),
    ("endcidrange", Keyword::EndCidRange),
    ("begincidchar", Keyword::BeginCidChar),
    ("endcidchar", Keyword::EndCidChar),
    ("beginbfrange", Keyword::BeginBfRange),
    ("endbfrange", Keyword::EndBfRange),
    ("beginbfchar", Keyword::BeginBfChar),
    ("endbfchar", Keyword::EndBfChar),
    ("beginnotdefrange", Keyword::BeginNotDefRange),
    ("endnotdefrange", Keyword::EndNotDefRange),
];

impl Keyword {
    pub fn from_bytes(bytes: &[u8]) -> Keyword {
        KEYWORDS
            .iter()
            .find(|(text, _)| text.as_bytes() == bytes)
            .map(|(_, keyword)| keyword.clone())
            .unwrap_or_else(|| Keyword::Other(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Keyword::Other(bytes) => bytes,
            known => KEYWORDS
                .iter()
                .find(|(_, keyword)| keyword == known)
                .map(|(text, _)| text.as_bytes())
                .unwrap_or_default(),
        }
    }

    /// Keyword text for diagnostics.
    pub fn name(&self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| keyword == self)
            .map(|(text, _)| *text)
            .unwrap_or("keyword")
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}

impl From<i64> for Object {
    fn from(number: i64) -> Self {
        Object::Integer(number)
    }
}

macro_rules! from_smaller_ints {
	($( $Int: ty )+) => {
		$(
			impl From<$Int> for Object {
				fn from(number: $Int) -> Self {
					Object::Integer(i64::from(number))
				}
			}
		)+
	}
}

from_smaller_ints! {
    i8 i16 i32
    u8 u16 u32
}

impl From<f64> for Object {
    fn from(number: f64) -> Self {
        Object::Real(number)
    }
}

impl<'a> From<&'a str> for Object {
    fn from(name: &'a str) -> Self {
        Object::Name(name.as_bytes().to_vec())
    }
}

impl From<Vec<Object>> for Object {
    fn from(array: Vec<Object>) -> Self {
        Object::Array(array)
    }
}

impl From<Dictionary> for Object {
    fn from(dict: Dictionary) -> Self {
        Object::Dictionary(dict)
    }
}

impl From<Keyword> for Object {
    fn from(keyword: Keyword) -> Self {
        Object::Keyword(keyword)
    }
}

impl Object {
    pub fn string_literal<S: Into<Vec<u8>>>(s: S) -> Self {
        Object::String(s.into(), StringFormat::Literal)
    }

    pub fn hex_string<S: Into<Vec<u8>>>(s: S) -> Self {
        Object::String(s.into(), StringFormat::Hexadecimal)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Object::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&[u8]> {
        match self {
            Object::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_name_str(&self) -> Option<&str> {
        self.as_name().and_then(|name| str::from_utf8(name).ok())
    }

    pub fn as_str(&self) -> Option<&[u8]> {
        match self {
            Object::String(string, _) => Some(string),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Short type label used in diagnostics.
    pub fn enum_variant(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Name(_) => "Name",
            Object::String(..) => "String",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Keyword(_) => "Keyword",
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => f.write_str("null"),
            Object::Boolean(value) => {
                if *value {
                    f.write_str("true")
                } else {
                    f.write_str("false")
                }
            }
            Object::Integer(value) => write!(f, "{}", value),
            Object::Real(value) => write!(f, "{}", value),
            Object::Name(name) => write!(f, "/{}", String::from_utf8_lossy(name)),
            Object::String(text, StringFormat::Literal) => write!(f, "({})", String::from_utf8_lossy(text)),
            Object::String(text, StringFormat::Hexadecimal) => {
                f.write_str("<")?;
                for byte in text {
                    write!(f, "{:02X}", byte)?;
                }
                f.write_str(">")
            }
            Object::Array(array) => {
                let items = array.iter().map(|item| format!("{:?}", item)).collect::<Vec<String>>();
                write!(f, "[{}]", items.join(" "))
            }
            Object::Dictionary(dict) => {
                let entries = dict
                    .iter()
                    .map(|(key, value)| format!("/{} {:?}", String::from_utf8_lossy(key), value))
                    .collect::<Vec<String>>();
                write!(f, "<<{}>>", entries.join(" "))
            }
            Object::Keyword(keyword) => f.write_str(&String::from_utf8_lossy(keyword.as_bytes())),
        }
    }
}

/// Interpret a byte string as an unsigned big-endian number.
///
/// Strings longer than four bytes keep only their trailing four bytes.
pub fn nunpack(bytes: &[u8]) -> u32 {
    let tail = &bytes[bytes.len().saturating_sub(4)..];
    tail.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}
