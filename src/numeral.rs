//! # Base-4-letter numeral codec
//!
//! Every address and memory word that reaches an output artifact is
//! rendered in this alphabet: digit `0..3` maps to letter `a..d`, base 4,
//! left-padded with `a` (the zero digit) to a minimum width.

const DIGITS: [u8; 4] = [b'a', b'b', b'c', b'd'];

/// Encode a non-negative integer as base-4 letters, left-padded with `a`
/// to at least `min_width` characters.
///
/// `n = 0` produces no digits before padding, so `encode(0, 1) == "a"`.
#[must_use]
pub fn encode(n: u32, min_width: usize) -> String {
    let mut digits = Vec::new();
    let mut rest = n;
    while rest > 0 {
        digits.push(DIGITS[(rest % 4) as usize]);
        rest /= 4;
    }
    digits.reverse();

    let pad = min_width.saturating_sub(digits.len());
    let mut out = String::with_capacity(min_width.max(digits.len()));
    out.extend(std::iter::repeat('a').take(pad));
    out.extend(digits.into_iter().map(char::from));
    out
}

/// Decode a base-4-letter string back into its integer value.
///
/// Inverse of [`encode`], ignoring (as encode does) the width it was
/// padded to. Returns `None` if any character is outside `a..=d`.
#[must_use]
pub fn decode(s: &str) -> Option<u32> {
    let mut value: u32 = 0;
    for ch in s.chars() {
        let digit = match ch {
            'a' => 0,
            'b' => 1,
            'c' => 2,
            'd' => 3,
            _ => return None,
        };
        value = value.checked_mul(4)?.checked_add(digit)?;
    }
    Some(value)
}

/// Encode a signed 10-bit memory word as its two's-complement bit pattern,
/// then as base-4 letters of at least `min_width` characters. Negative
/// values are always encoded as their two's-complement 10-bit pattern,
/// never an implementation-defined bit-field layout.
#[must_use]
pub fn encode_signed_word(value: i32, min_width: usize) -> String {
    let bits = (value as u32) & 0x3FF;
    encode(bits, min_width)
}
