//! Saturating integer conversions at the SQL boundary, where SQLite speaks `i64`.

#[inline]
#[must_use]
pub fn usize_to_i64_saturating(v: usize) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Negative counts cannot happen in practice; clamp them to 0 rather than wrap.
#[inline]
#[must_use]
pub fn i64_to_usize_saturating(v: i64) -> usize {
    if v <= 0 { 0 } else { usize::try_from(v).unwrap_or(usize::MAX) }
}

#[inline]
#[must_use]
pub fn u128_to_u64_saturating(v: u128) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}
