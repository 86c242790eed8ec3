//! Adobe glyph name to Unicode conversion.

use crate::{Error, Result};
use phf::phf_map;

/// Standard glyph names used by the Latin text encodings.
static GLYPH_NAMES: phf::Map<&'static str, char> = phf_map! {
    "A" => '\u{0041}',
    "AE" => '\u{00C6}',
    "Aacute" => '\u{00C1}',
    "Acircumflex" => '\u{00C2}',
    "Adieresis" => '\u{00C4}',
    "Agrave" => '\u{00C0}',
    "Aring" => '\u{00C5}',
    "Atilde" => '\u{00C3}',
    "B" => '\u{0042}',
    "C" => '\u{0043}',
    "Ccedilla" => '\u{00C7}',
    "D" => '\u{0044}',
    "E" => '\u{0045}',
    "Eacute" => '\u{00C9}',
    "Ecircumflex" => '\u{00CA}',
    "Edieresis" => '\u{00CB}',
    "Egrave" => '\u{00C8}',
    "Eth" => '\u{00D0}',
    "Euro" => '\u{20AC}',
    "F" => '\u{0046}',
    "G" => '\u{0047}',
    "H" => '\u{0048}',
    "I" => '\u{0049}',
    "Iacute" => '\u{00CD}',
    "Icircumflex" => '\u{00CE}',
    "Idieresis" => '\u{00CF}',
    "Igrave" => '\u{00CC}',
    "J" => '\u{004A}',
    "K" => '\u{004B}',
    "L" => '\u{004C}',
    "Lslash" => '\u{0141}',
    "M" => '\u{004D}',
    "N" => '\u{004E}',
    "Ntilde" => '\u{00D1}',
    "O" => '\u{004F}',
    "OE" => '\u{0152}',
    "Oacute" => '\u{00D3}',
    "Ocircumflex" => '\u{00D4}',
    "Odieresis" => '\u{00D6}',
    "Ograve" => '\u{00D2}',
    "Oslash" => '\u{00D8}',
    "Otilde" => '\u{00D5}',
    "P" => '\u{0050}',
    "Q" => '\u{0051}',
    "R" => '\u{0052}',
    "S" => '\u{0053}',
    "Scaron" => '\u{0160}',
    "T" => '\u{0054}',
    "Thorn" => '\u{00DE}',
    "U" => '\u{0055}',
    "Uacute" => '\u{00DA}',
    "Ucircumflex" => '\u{00DB}',
    "Udieresis" => '\u{00DC}',
    "Ugrave" => '\u{00D9}',
    "V" => '\u{0056}',
    "W" => '\u{0057}',
    "X" => '\u{0058}',
    "Y" => '\u{0059}',
    "Yacute" => '\u{00DD}',
    "Ydieresis" => '\u{0178}',
    "Z" => '\u{005A}',
    "Zcaron" => '\u{017D}',
    "a" => '\u{0061}',
    "aacute" => '\u{00E1}',
    "acircumflex" => '\u{00E2}',
    "acute" => '\u{00B4}',
    "adieresis" => '\u{00E4}',
    "ae" => '\u{00E6}',
    "agrave" => '\u{00E0}',
    "ampersand" => '\u{0026}',
    "aring" => '\u{00E5}',
    "asciicircum" => '\u{005E}',
    "asciitilde" => '\u{007E}',
    "asterisk" => '\u{002A}',
    "at" => '\u{0040}',
    "atilde" => '\u{00E3}',
    "b" => '\u{0062}',
    "backslash" => '\u{005C}',
    "bar" => '\u{007C}',
    "braceleft" => '\u{007B}',
    "braceright" => '\u{007D}',
    "bracketleft" => '\u{005B}',
    "bracketright" => '\u{005D}',
    "breve" => '\u{02D8}',
    "brokenbar" => '\u{00A6}',
    "bullet" => '\u{2022}',
    "c" => '\u{0063}',
    "caron" => '\u{02C7}',
    "ccedilla" => '\u{00E7}',
    "cedilla" => '\u{00B8}',
    "cent" => '\u{00A2}',
    "circumflex" => '\u{02C6}',
    "colon" => '\u{003A}',
    "comma" => '\u{002C}',
    "copyright" => '\u{00A9}',
    "currency" => '\u{00A4}',
    "d" => '\u{0064}',
    "dagger" => '\u{2020}',
    "daggerdbl" => '\u{2021}',
    "degree" => '\u{00B0}',
    "dieresis" => '\u{00A8}',
    "divide" => '\u{00F7}',
    "dollar" => '\u{0024}',
    "dotaccent" => '\u{02D9}',
    "dotlessi" => '\u{0131}',
    "e" => '\u{0065}',
    "eacute" => '\u{00E9}',
    "ecircumflex" => '\u{00EA}',
    "edieresis" => '\u{00EB}',
    "egrave" => '\u{00E8}',
    "eight" => '\u{0038}',
    "ellipsis" => '\u{2026}',
    "emdash" => '\u{2014}',
    "endash" => '\u{2013}',
    "equal" => '\u{003D}',
    "eth" => '\u{00F0}',
    "exclam" => '\u{0021}',
    "exclamdown" => '\u{00A1}',
    "f" => '\u{0066}',
    "fi" => '\u{FB01}',
    "five" => '\u{0035}',
    "fl" => '\u{FB02}',
    "florin" => '\u{0192}',
    "four" => '\u{0034}',
    "fraction" => '\u{2044}',
    "g" => '\u{0067}',
    "germandbls" => '\u{00DF}',
    "grave" => '\u{0060}',
    "greater" => '\u{003E}',
    "guillemotleft" => '\u{00AB}',
    "guillemotright" => '\u{00BB}',
    "guilsinglleft" => '\u{2039}',
    "guilsinglright" => '\u{203A}',
    "h" => '\u{0068}',
    "hungarumlaut" => '\u{02DD}',
    "hyphen" => '\u{002D}',
    "i" => '\u{0069}',
    "iacute" => '\u{00ED}',
    "icircumflex" => '\u{00EE}',
    "idieresis" => '\u{00EF}',
    "igrave" => '\u{00EC}',
    "j" => '\u{006A}',
    "k" => '\u{006B}',
    "l" => '\u{006C}',
    "less" => '\u{003C}',
    "logicalnot" => '\u{00AC}',
    "lslash" => '\u{0142}',
    "m" => '\u{006D}',
    "macron" => '\u{00AF}',
    "minus" => '\u{2212}',
    "mu" => '\u{00B5}',
    "multiply" => '\u{00D7}',
    "n" => '\u{006E}',
    "nine" => '\u{0039}',
    "nbspace" => '\u{00A0}',
    "ntilde" => '\u{00F1}',
    "numbersign" => '\u{0023}',
    "o" => '\u{006F}',
    "oacute" => '\u{00F3}',
    "ocircumflex" => '\u{00F4}',
    "odieresis" => '\u{00F6}',
    "oe" => '\u{0153}',
    "ogonek" => '\u{02DB}',
    "ograve" => '\u{00F2}',
    "one" => '\u{0031}',
    "onehalf" => '\u{00BD}',
    "onequarter" => '\u{00BC}',
    "onesuperior" => '\u{00B9}',
    "ordfeminine" => '\u{00AA}',
    "ordmasculine" => '\u{00BA}',
    "oslash" => '\u{00F8}',
    "otilde" => '\u{00F5}',
    "p" => '\u{0070}',
    "paragraph" => '\u{00B6}',
    "parenleft" => '\u{0028}',
    "parenright" => '\u{0029}',
    "percent" => '\u{0025}',
    "period" => '\u{002E}',
    "periodcentered" => '\u{00B7}',
    "perthousand" => '\u{2030}',
    "plus" => '\u{002B}',
    "plusminus" => '\u{00B1}',
    "q" => '\u{0071}',
    "question" => '\u{003F}',
    "questiondown" => '\u{00BF}',
    "quotedbl" => '\u{0022}',
    "quotedblbase" => '\u{201E}',
    "quotedblleft" => '\u{201C}',
    "quotedblright" => '\u{201D}',
    "quoteleft" => '\u{2018}',
    "quoteright" => '\u{2019}',
    "quotesinglbase" => '\u{201A}',
    "quotesingle" => '\u{0027}',
    "r" => '\u{0072}',
    "registered" => '\u{00AE}',
    "ring" => '\u{02DA}',
    "s" => '\u{0073}',
    "scaron" => '\u{0161}',
    "section" => '\u{00A7}',
    "semicolon" => '\u{003B}',
    "seven" => '\u{0037}',
    "six" => '\u{0036}',
    "slash" => '\u{002F}',
    "space" => '\u{0020}',
    "sterling" => '\u{00A3}',
    "t" => '\u{0074}',
    "thorn" => '\u{00FE}',
    "three" => '\u{0033}',
    "threequarters" => '\u{00BE}',
    "threesuperior" => '\u{00B3}',
    "tilde" => '\u{02DC}',
    "trademark" => '\u{2122}',
    "two" => '\u{0032}',
    "twosuperior" => '\u{00B2}',
    "u" => '\u{0075}',
    "uacute" => '\u{00FA}',
    "ucircumflex" => '\u{00FB}',
    "udieresis" => '\u{00FC}',
    "ugrave" => '\u{00F9}',
    "underscore" => '\u{005F}',
    "v" => '\u{0076}',
    "w" => '\u{0077}',
    "x" => '\u{0078}',
    "y" => '\u{0079}',
    "yacute" => '\u{00FD}',
    "ydieresis" => '\u{00FF}',
    "yen" => '\u{00A5}',
    "z" => '\u{007A}',
    "zcaron" => '\u{017E}',
    "zero" => '\u{0030}',
    "ff" => '\u{FB00}',
    "ffi" => '\u{FB03}',
    "ffl" => '\u{FB04}',
    "sfthyphen" => '\u{00AD}',
};

/// Names found in Wingdings-style symbol fonts.
static GLYPH_NAMES_EXT: phf::Map<&'static str, char> = phf_map! {
    "oneinv" => '\u{278A}',
    "twoinv" => '\u{278B}',
    "threeinv" => '\u{278C}',
    "fourinv" => '\u{278D}',
    "fiveinv" => '\u{278E}',
    "sixinv" => '\u{278F}',
    "seveninv" => '\u{2790}',
    "eightinv" => '\u{2791}',
    "nineinv" => '\u{2792}',
    "teninv" => '\u{2793}',

    "onesansinv" => '\u{278A}',
    "twosansinv" => '\u{278B}',
    "threesansinv" => '\u{278C}',
    "foursansinv" => '\u{278D}',
    "fivesansinv" => '\u{278E}',
    "sixsansinv" => '\u{278F}',
    "sevensansinv" => '\u{2790}',
    "eightsansinv" => '\u{2791}',
    "ninesansinv" => '\u{2792}',
    "tensansinv" => '\u{2793}',

    "handbckptright" => '\u{261E}',
    "xrhombus" => '\u{2756}',
    "boxcheckbld" => '\u{2611}',
};

/// `uniXXXX[XXXX...]`, each group one BMP code unit.
fn parse_uni(name: &str) -> Option<String> {
    let hex = name.strip_prefix("uni")?;
    if hex.is_empty() || hex.len() % 4 != 0 {
        return None;
    }
    let units = (0..hex.len())
        .step_by(4)
        .map(|i| u16::from_str_radix(hex.get(i..i + 4)?, 16).ok())
        .collect::<Option<Vec<u16>>>()?;
    String::from_utf16(&units).ok()
}

/// `uXXXX` to `uXXXXXX`.
fn parse_u(name: &str) -> Option<String> {
    let hex = name.strip_prefix('u')?;
    if !(4..=6).contains(&hex.len()) {
        return None;
    }
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
}

/// First run of decimal digits taken as a code point, e.g. `g65` or `cid0042`.
fn parse_digits(name: &str) -> Option<String> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits = &name[start..];
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end]
        .parse::<u32>()
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
}

/// Converts an Adobe glyph name to its Unicode text.
pub fn name2unicode(name: &str) -> Result<String> {
    if let Some(c) = GLYPH_NAMES.get(name).or_else(|| GLYPH_NAMES_EXT.get(name)) {
        return Ok(c.to_string());
    }
    parse_uni(name)
        .or_else(|| parse_u(name))
        .or_else(|| parse_digits(name))
        .ok_or_else(|| Error::InvalidGlyphName(name.to_string()))
}
