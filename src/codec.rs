//! Conversions between UUID byte arrays and their string renderings.

use crate::{ParseError, Uuid};

const LOWER_DIGITS: &[u8; 16] = b"0123456789abcdef";
const UPPER_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Byte indexes after which a hyphen is inserted in the 8-4-4-4-12 form.
const fn is_group_end(i: usize) -> bool {
    i == 3 || i == 5 || i == 7 || i == 9
}

/// Writes the hexadecimal representation of `bytes` into the head of `dst`, returning the number
/// of bytes written (36 if `hyphenated`, 32 otherwise).
///
/// # Panics
///
/// Panics if `dst` is shorter than the representation.
pub(crate) fn write_hex(
    bytes: &[u8; 16],
    hyphenated: bool,
    uppercase: bool,
    dst: &mut [u8],
) -> usize {
    let digits = if uppercase { UPPER_DIGITS } else { LOWER_DIGITS };
    let mut n = 0;
    for (i, e) in bytes.iter().enumerate() {
        dst[n] = digits[(e >> 4) as usize];
        dst[n + 1] = digits[(e & 15) as usize];
        n += 2;
        if hyphenated && is_group_end(i) {
            dst[n] = b'-';
            n += 1;
        }
    }
    n
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn decode(src: &[u8], hyphenated: bool) -> Result<[u8; 16], ParseError> {
    const ERR: ParseError = ParseError {};
    let mut dst = [0u8; 16];
    let mut iter = src.iter().copied();
    for (i, e) in dst.iter_mut().enumerate() {
        let hi = iter.next().and_then(hex_value).ok_or(ERR)?;
        let lo = iter.next().and_then(hex_value).ok_or(ERR)?;
        *e = (hi << 4) | lo;
        if hyphenated && is_group_end(i) && iter.next() != Some(b'-') {
            return Err(ERR);
        }
    }
    if iter.next().is_none() {
        Ok(dst)
    } else {
        Err(ERR)
    }
}

/// Decodes the 8-4-4-4-12 representation in either case.
pub(crate) fn decode_hyphenated(src: &[u8]) -> Result<[u8; 16], ParseError> {
    decode(src, true)
}

/// Parses any rendering produced by [`FormatOptions::apply`](crate::FormatOptions::apply).
///
/// Accepted inputs are the 36-character 8-4-4-4-12 form and the 32-digit ungrouped form, in any
/// mix of upper and lower case, optionally wrapped in a single pair of braces. The result can be
/// turned back into the canonical lowercase hyphenated storage form with
/// [`Uuid::encode`] or [`canonicalize`].
///
/// # Examples
///
/// ```rust
/// use uuidgen_core::{parse_canonical, Uuid};
///
/// let expected: Uuid = "91d3e977-b34a-5505-b2e8-71b62328a7d0".parse()?;
/// assert_eq!(parse_canonical("{91D3E977B34A5505B2E871B62328A7D0}")?, expected);
/// assert_eq!(parse_canonical("91d3e977b34a5505b2e871b62328a7d0")?, expected);
/// assert!(parse_canonical("{91d3e977-b34a-5505-b2e8-71b62328a7d0").is_err());
/// # Ok::<(), uuidgen_core::ParseError>(())
/// ```
pub fn parse_canonical(src: &str) -> Result<Uuid, ParseError> {
    let bytes = src.as_bytes();
    let inner = match bytes {
        [b'{', inner @ .., b'}'] => inner,
        _ => bytes,
    };
    match inner.len() {
        36 => decode(inner, true).map(Uuid::from),
        32 => decode(inner, false).map(Uuid::from),
        _ => Err(ParseError {}),
    }
}

/// Re-renders any accepted rendering in the canonical lowercase hyphenated form.
pub fn canonicalize(src: &str) -> Result<String, ParseError> {
    parse_canonical(src).map(String::from)
}
