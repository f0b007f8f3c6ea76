//! Tokenizer primitives underlying every format parser.
//!
//! Kernel files are plain ASCII, so all helpers here work on `&str` slices
//! without allocating, except `split`, which collects the borrowed tokens.

use crate::error::NumberError;
use std::num::{IntErrorKind, ParseIntError};

/// Numeric base for [`parse_int`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Octal,
    Decimal,
    /// Hexadecimal, with an optional `0x`/`0X` prefix.
    Hex,
    /// Detected from the literal the way C's `strtol(.., 0)` does:
    /// `0x` means hex, a leading `0` means octal, anything else is decimal.
    Auto,
}

/// Integer types that can be produced by [`parse_int`].
pub trait Integer: Sized + Copy {
    fn from_radix(src: &str, radix: u32) -> Result<Self, ParseIntError>;
}

macro_rules! impl_integer {
    ($($t:ty),*) => {
        $(
            impl Integer for $t {
                fn from_radix(src: &str, radix: u32) -> Result<Self, ParseIntError> {
                    <$t>::from_str_radix(src, radix)
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Whitespace class used by the trim helpers (same set as C `isspace`).
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

/// Splits `line` on every occurrence of `delim`.
///
/// Empty tokens produced by consecutive delimiters are dropped unless
/// `keep_empty` is set. An empty line yields no tokens.
pub fn split(line: &str, delim: char, keep_empty: bool) -> Vec<&str> {
    if line.is_empty() {
        return Vec::new();
    }
    line.split(delim)
        .filter(|token| keep_empty || !token.is_empty())
        .collect()
}

/// Splits `line` on runs of spaces, the most common kernel layout.
pub fn split_spaces(line: &str) -> Vec<&str> {
    split(line, ' ', false)
}

/// Splits `line` at the first `delim`.
///
/// Returns `(line, "")` when the delimiter does not occur.
pub fn split_once(line: &str, delim: char) -> (&str, &str) {
    line.split_once(delim).unwrap_or((line, ""))
}

pub fn ltrim(s: &str) -> &str {
    s.trim_start_matches(is_space)
}

pub fn rtrim(s: &str) -> &str {
    s.trim_end_matches(is_space)
}

pub fn trim(s: &str) -> &str {
    ltrim(rtrim(s))
}

/// Parses `token` as an integer of type `T` in the given base.
///
/// The whole token must be consumed. A token that is not a literal in
/// `base` fails with [`NumberError::InvalidArgument`]; a literal that does
/// not fit `T` fails with [`NumberError::OutOfRange`].
pub fn parse_int<T: Integer>(token: &str, base: Base) -> Result<T, NumberError> {
    let (negative, body) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };

    let (radix, digits) = match base {
        Base::Octal => (8, body),
        Base::Decimal => (10, body),
        Base::Hex => (16, strip_hex_prefix(body).unwrap_or(body)),
        Base::Auto => {
            if let Some(hex) = strip_hex_prefix(body) {
                (16, hex)
            } else if body.len() > 1 && body.starts_with('0') {
                (8, &body[1..])
            } else {
                (10, body)
            }
        }
    };

    // `from_str_radix` accepts its own sign, which must not appear twice.
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(NumberError::InvalidArgument);
    }

    let result = if negative {
        T::from_radix(&format!("-{}", digits), radix)
    } else {
        T::from_radix(digits, radix)
    };

    result.map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => NumberError::OutOfRange,
        // Unsigned targets reject a minus sign as an invalid digit; a
        // negative literal is still a well-formed number that does not fit.
        IntErrorKind::InvalidDigit
            if negative && digits.chars().all(|c| c.is_digit(radix)) =>
        {
            NumberError::OutOfRange
        }
        _ => NumberError::InvalidArgument,
    })
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

/// Parses `token` as a finite floating point number.
pub fn parse_float(token: &str) -> Result<f64, NumberError> {
    let value: f64 = token.parse().map_err(|_| NumberError::InvalidArgument)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(NumberError::OutOfRange)
    }
}
