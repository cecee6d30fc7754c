//! Size measurement for rendered packs.
//!
//! Lengths are counted in Unicode scalar values (code points), never bytes
//! or UTF-16 units, so multi-byte text does not skew the saving ratio.
//! Grapheme clusters would track "perceived" length more closely; code
//! points are the unit the gate commits to.

/// Length of `text` in Unicode code points.
pub fn rune_len(text: &str) -> usize {
    text.chars().count()
}

/// Fractional reduction from `before_len` to `after_len`.
///
/// Zero when `before_len` is zero. Negative when the pack grew.
pub fn saving_ratio(before_len: usize, after_len: usize) -> f64 {
    if before_len == 0 {
        return 0.0;
    }
    (before_len as f64 - after_len as f64) / before_len as f64
}

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 code points. Rounds up. Reporting only; the gate
/// itself never looks at tokens.
pub fn estimate_tokens(text: &str) -> usize {
    tokens_for_len(rune_len(text))
}

/// Token estimate for an already-measured code point length.
pub fn tokens_for_len(len: usize) -> usize {
    len.div_ceil(4)
}
