//! Bitset
//!
//! Categorical splits store the categories routed to the "in set" child as a
//! bitset of 32-bit words shared by all the splits of a tree. Each split owns
//! the half-open word range `[start, end)`.
use crate::constants::BITSET_WORD_BITS;
use std::collections::BTreeSet;

/// Check whether bit `pos` of the range `[start, end)` is set.
///
/// Bits past the end of the range, or past the end of `words`, are unset.
#[inline]
pub fn test_bit(words: &[u32], start: usize, end: usize, pos: usize) -> bool {
    let idx = start + pos / BITSET_WORD_BITS;
    if idx >= end {
        return false;
    }
    match words.get(idx) {
        Some(w) => (w >> (pos % BITSET_WORD_BITS)) & 1 == 1,
        None => false,
    }
}

/// Collect the positions of every set bit in the range `[start, end)`.
pub fn decode_range(words: &[u32], start: usize, end: usize) -> BTreeSet<usize> {
    let n_bits = end.saturating_sub(start) * BITSET_WORD_BITS;
    (0..n_bits).filter(|pos| test_bit(words, start, end, *pos)).collect()
}
