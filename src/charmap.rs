//! Bidirectional mapping between a digit value `0 <= c < B` and a single
//! filesystem-legal character.
//!
//! Digits `0..36` use the ASCII alphabet `0-9A-Z`, so lexicographic
//! character comparison equals numeric digit comparison for any base up to
//! 36 (this is what [`crate::dirscan`] relies on). Bases beyond 36 spill
//! into a stable, documented sequence of further Unicode scalar values
//! starting at `U+00C0`, walking upward and skipping the surrogate block
//! (which holds no valid `char`). The spill sequence is monotonic in
//! codepoint, so it too preserves "lexicographic order == numeric order"
//! for single-scalar filenames, which is all this crate ever compares.

const ASCII_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// First codepoint used for digits `>= 36`.
const EXTRA_BASE: u32 = 0x00C0;

/// Start of the UTF-16 surrogate block; no `char` may fall in `[SURROGATE_START, SURROGATE_END)`.
const SURROGATE_START: u32 = 0xD800;
const SURROGATE_SPAN: u32 = 0x0800;

/// Returns the filesystem-legal character for `digit`, or `None` if `digit`
/// cannot be represented (digit values are only ever constructed `< B <=
/// 65536`, well within the representable range, so `None` here indicates a
/// caller bug rather than an expected runtime condition).
pub fn char_of(digit: u32) -> Option<char> {
    if let Ok(i) = usize::try_from(digit) {
        if i < ASCII_ALPHABET.len() {
            return Some(ASCII_ALPHABET[i] as char);
        }
    }
    let offset = digit.checked_sub(ASCII_ALPHABET.len() as u32)?;
    let mut codepoint = EXTRA_BASE.checked_add(offset)?;
    if codepoint >= SURROGATE_START {
        codepoint += SURROGATE_SPAN;
    }
    char::from_u32(codepoint)
}

/// Returns the digit value for `ch`, or `None` if `ch` is not a recognized
/// digit character (either outside the alphabet entirely, or a digit value
/// that would be `>= B` is left for the caller to reject).
pub fn digit_of(ch: char) -> Option<u32> {
    if ch.is_ascii() {
        let b = ch as u8;
        return ASCII_ALPHABET.iter().position(|&c| c == b).map(|i| i as u32);
    }
    let codepoint = ch as u32;
    if codepoint < EXTRA_BASE {
        return None;
    }
    // `ch` is already a valid `char`, so it can never itself fall in the
    // surrogate gap; the un-shift is therefore unconditional for any
    // codepoint at or past where `char_of` starts shifting.
    let raw = if codepoint >= SURROGATE_START + SURROGATE_SPAN {
        codepoint - SURROGATE_SPAN
    } else {
        codepoint
    };
    raw.checked_sub(EXTRA_BASE).map(|offset| offset + ASCII_ALPHABET.len() as u32)
}

/// Decodes a filesystem entry name into a digit `< base`, rejecting names
/// that are not exactly one Unicode scalar value (multi-byte encodings of a
/// single `char` are fine; multiple characters are not).
pub fn digit_of_name(name: &str, base: u32) -> Option<u32> {
    let mut chars = name.chars();
    let ch = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    digit_of(ch).filter(|&d| d < base)
}
