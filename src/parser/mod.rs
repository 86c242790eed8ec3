//! PostScript tokenizer for CMap resources.
//!
//! Turns CMap program text into a stream of `(position, Object)` pairs. Composite
//! objects (arrays, procedures and dictionaries) are assembled here so that the
//! interpreter only ever sees complete operands and bare keywords.

use crate::object::{Dictionary, Keyword, Object, StringFormat};
use log::debug;
use std::str::{self, FromStr};

use nom::branch::alt;
use nom::bytes::complete::{tag, take, take_while, take_while1, take_while_m_n};
use nom::character::complete::{digit0, digit1, one_of};
use nom::combinator::{map, map_opt, map_res, opt, recognize, verify};
use nom::multi::{fold_many0, many0};
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::{AsChar, IResult, Input, Parser};
use nom_locate::LocatedSpan;

pub mod stack;

pub(crate) type ParserInput<'a> = LocatedSpan<&'a [u8]>;
pub(crate) type NomError<'a> = nom::error::Error<ParserInput<'a>>;
pub(crate) type NomResult<'a, O, E = NomError<'a>> = IResult<ParserInput<'a>, O, E>;

/// Maximum nesting of parentheses inside a literal string.
const MAX_BRACKET: usize = 100;

/// Maximum nesting of arrays, procedures and dictionaries.
const MAX_NESTING: usize = 32;

fn eol(input: ParserInput) -> NomResult<ParserInput> {
    alt((tag(&b"\r\n"[..]), tag(&b"\n"[..]), tag(&b"\r"[..]))).parse(input)
}

fn comment(input: ParserInput) -> NomResult<()> {
    map(
        (tag(&b"%"[..]), take_while(|c: u8| !b"\r\n".contains(&c)), opt(eol)),
        |_| (),
    )
    .parse(input)
}

#[inline]
fn is_whitespace(c: u8) -> bool {
    b" \t\n\r\0\x0C".contains(&c)
}

#[inline]
fn is_delimiter(c: u8) -> bool {
    b"()<>[]{}/%".contains(&c)
}

#[inline]
fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

#[inline]
fn is_direct_literal_string(c: u8) -> bool {
    !b"()\\\r\n".contains(&c)
}

fn white_space(input: ParserInput) -> NomResult<()> {
    map(take_while(is_whitespace), |_| ()).parse(input)
}

fn space(input: ParserInput) -> NomResult<()> {
    fold_many0(
        alt((map(take_while1(is_whitespace), |_| ()), comment)),
        || {},
        |_, _| (),
    )
    .parse(input)
}

fn ascii(input: ParserInput) -> Result<&str, str::Utf8Error> {
    str::from_utf8(*input.fragment())
}

/// Parse a recognized run of ASCII digits as `T`.
fn number_text<T: FromStr>(digits: ParserInput) -> Result<T, ()> {
    ascii(digits).ok().and_then(|text| T::from_str(text).ok()).ok_or(())
}

fn integer(input: ParserInput) -> NomResult<i64> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), number_text::<i64>).parse(input)
}

/// `1.5`, `-.5` or `10.`.
fn real(input: ParserInput) -> NomResult<f64> {
    let fraction = alt((
        recognize((digit1, tag(&b"."[..]), digit0)),
        recognize(pair(tag(&b"."[..]), digit1)),
    ));
    map_res(recognize(pair(opt(one_of("+-")), fraction)), number_text::<f64>).parse(input)
}

fn hex_char(input: ParserInput) -> NomResult<u8> {
    map_res(
        verify(take(2usize), |h: &ParserInput| h.fragment().iter().copied().all(AsChar::is_hex_digit)),
        |x: ParserInput| ascii(x).map_err(|_| ()).and_then(|s| u8::from_str_radix(s, 16).map_err(|_| ())),
    )
    .parse(input)
}

fn oct_char(input: ParserInput) -> NomResult<u8> {
    map_res(
        take_while_m_n(1, 3, AsChar::is_oct_digit),
        // Overflow is ignored.
        |x: ParserInput| {
            ascii(x)
                .map_err(|_| ())
                .and_then(|s| u16::from_str_radix(s, 8).map(|o| o as u8).map_err(|_| ()))
        },
    )
    .parse(input)
}

fn name(input: ParserInput) -> NomResult<Vec<u8>> {
    preceded(
        tag(&b"/"[..]),
        many0(alt((
            preceded(tag(&b"#"[..]), hex_char),
            map_opt(take(1usize), |c: ParserInput| {
                if c[0] != b'#' && is_regular(c[0]) {
                    Some(c[0])
                } else {
                    None
                }
            }),
        ))),
    )
    .parse(input)
}

fn escape_sequence(input: ParserInput) -> NomResult<Option<u8>> {
    preceded(
        tag(&b"\\"[..]),
        alt((
            map(oct_char, Some),
            // line continuation
            map(eol, |_| None),
            map(take(1usize), |c: ParserInput| {
                Some(match c[0] {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'b' => 0x08,
                    b'f' => 0x0C,
                    other => other,
                })
            }),
        )),
    )
    .parse(input)
}

enum InnerLiteralString<'a> {
    Direct(ParserInput<'a>),
    Escape(Option<u8>),
    Eol(ParserInput<'a>),
    Nested(Vec<u8>),
}

impl InnerLiteralString<'_> {
    fn push(&self, output: &mut Vec<u8>) {
        match self {
            InnerLiteralString::Direct(s) | InnerLiteralString::Eol(s) => output.extend_from_slice(s.fragment()),
            InnerLiteralString::Escape(e) => output.extend(e),
            InnerLiteralString::Nested(n) => output.extend_from_slice(n),
        }
    }
}

fn inner_literal_string(depth: usize) -> impl Fn(ParserInput) -> NomResult<Vec<u8>> {
    move |input| {
        fold_many0(
            alt((
                map(take_while1(is_direct_literal_string), InnerLiteralString::Direct),
                map(escape_sequence, InnerLiteralString::Escape),
                map(eol, InnerLiteralString::Eol),
                map(nested_literal_string(depth), InnerLiteralString::Nested),
            )),
            Vec::new,
            |mut out: Vec<u8>, value| {
                value.push(&mut out);
                out
            },
        )
        .parse(input)
    }
}

fn nested_literal_string(depth: usize) -> impl Fn(ParserInput) -> NomResult<Vec<u8>> {
    move |input| {
        if depth == 0 {
            map(verify(tag(&b"too deep"[..]), |_| false), |_| vec![]).parse(input)
        } else {
            map(
                delimited(tag(&b"("[..]), inner_literal_string(depth - 1), tag(&b")"[..])),
                |mut content| {
                    content.insert(0, b'(');
                    content.push(b')');
                    content
                },
            )
            .parse(input)
        }
    }
}

fn literal_string(input: ParserInput) -> NomResult<Vec<u8>> {
    delimited(tag(&b"("[..]), inner_literal_string(MAX_BRACKET), tag(&b")"[..])).parse(input)
}

#[inline]
fn hex_digit(input: ParserInput) -> NomResult<u8> {
    map_opt(take(1usize), |c: ParserInput| (c[0] as char).to_digit(16).map(|d| d as u8)).parse(input)
}

/// `<901FA>` is `90 1F A0`: an odd trailing digit is padded with zero.
fn hexadecimal_string(input: ParserInput) -> NomResult<Vec<u8>> {
    map(
        delimited(
            tag(&b"<"[..]),
            terminated(many0(preceded(white_space, hex_digit)), white_space),
            tag(&b">"[..]),
        ),
        |digits: Vec<u8>| {
            digits
                .chunks(2)
                .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
                .collect()
        },
    )
    .parse(input)
}

fn too_deep(input: ParserInput) -> nom::Err<NomError> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::TooLarge))
}

fn array(depth: usize) -> impl Fn(ParserInput) -> NomResult<Vec<Object>> {
    move |input| {
        if depth == 0 {
            return Err(too_deep(input));
        }
        delimited(
            pair(tag(&b"["[..]), space),
            many0(terminated(object(depth - 1), space)),
            tag(&b"]"[..]),
        )
        .parse(input)
    }
}

fn procedure(depth: usize) -> impl Fn(ParserInput) -> NomResult<Vec<Object>> {
    move |input| {
        if depth == 0 {
            return Err(too_deep(input));
        }
        delimited(
            pair(tag(&b"{"[..]), space),
            many0(terminated(object(depth - 1), space)),
            tag(&b"}"[..]),
        )
        .parse(input)
    }
}

fn dictionary(depth: usize) -> impl Fn(ParserInput) -> NomResult<Dictionary> {
    move |input| {
        if depth == 0 {
            return Err(too_deep(input));
        }
        delimited(
            pair(tag(&b"<<"[..]), space),
            fold_many0(
                pair(terminated(name, space), terminated(object(depth - 1), space)),
                Dictionary::new,
                |mut dict, (key, value)| {
                    dict.insert(key, value);
                    dict
                },
            ),
            tag(&b">>"[..]),
        )
        .parse(input)
    }
}

/// A run of regular characters that is not a number: `true`, `false`,
/// `null`, or an executable name.
fn keyword(input: ParserInput) -> NomResult<Object> {
    map(take_while1(is_regular), |word: ParserInput| match *word.fragment() {
        b"true" => Object::Boolean(true),
        b"false" => Object::Boolean(false),
        b"null" => Object::Null,
        other => Object::Keyword(Keyword::from_bytes(other)),
    })
    .parse(input)
}

/// A number must end at a delimiter or whitespace, otherwise the
/// whole word is an executable name such as `1dict`.
fn number_end(input: ParserInput) -> NomResult<()> {
    match input.fragment().first() {
        Some(&c) if is_regular(c) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
        _ => Ok((input, ())),
    }
}

/// `depth` is how many more arrays, procedures or dictionaries may open
/// inside this object.
fn object(depth: usize) -> impl Fn(ParserInput) -> NomResult<Object> {
    move |input| {
        alt((
            map(terminated(real, number_end), Object::Real),
            map(terminated(integer, number_end), Object::Integer),
            map(name, Object::Name),
            map(literal_string, |s| Object::String(s, StringFormat::Literal)),
            map(dictionary(depth), Object::Dictionary),
            map(hexadecimal_string, |s| Object::String(s, StringFormat::Hexadecimal)),
            map(array(depth), Object::Array),
            map(procedure(depth), Object::Array),
            keyword,
        ))
        .parse(input)
    }
}

/// Pull-based source of `(position, object)` pairs.
///
/// Bytes that cannot start any object (an unmatched `]` or `>>`, say) are skipped
/// one at a time, as is the opening bracket of a composite nested deeper than
/// `MAX_NESTING`. The iterator ends at end of input.
pub struct Lexer<'a> {
    input: ParserInput<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Lexer<'a> {
        Lexer {
            input: LocatedSpan::new(data),
        }
    }

    /// Byte offset of the next unread token.
    pub fn position(&self) -> usize {
        self.input.location_offset()
    }
}

impl Iterator for Lexer<'_> {
    type Item = (usize, Object);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Ok((rest, _)) = space(self.input) {
                self.input = rest;
            }
            if self.input.fragment().is_empty() {
                return None;
            }
            let position = self.input.location_offset();
            match object(MAX_NESTING)(self.input) {
                Ok((rest, object)) => {
                    self.input = rest;
                    return Some((position, object));
                }
                Err(_) => {
                    debug!("cmap lexer: skipping byte {:#04x} at {}", self.input.fragment()[0], position);
                    self.input = self.input.take_from(1);
                }
            }
        }
    }
}
