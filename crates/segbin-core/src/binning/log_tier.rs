//! Pseudo-logarithmic tier arithmetic.
//!
//! A log-tier size, bit by bit, is `1 <div> <rest>`: an implicit leading one,
//! `p` division bits, then whatever is left. With `p = 2` the octave starting
//! at 512 splits into 512, 640, 768, 896, then 1024, 1280, ...
//!
//! A tier-relative bucket `g` packs the octave above `base_exp` into its high
//! bits and the division into its low `p` bits.

/// Smallest size in tier-relative bucket `g`.
///
/// # Panics
///
/// In debug builds, if the size needs more than 64 bits, i.e.
/// `(g >> p) + base_exp > 63`. [`BucketScheme::new`](super::BucketScheme::new)
/// rejects configs whose log tier reaches that far.
#[inline]
pub(crate) const fn size_of_bucket(g: u64, p: u32, base_exp: u32) -> u64 {
    let mantissa = (1u64 << p) + (g & ((1u64 << p) - 1));
    mantissa << ((g >> p) + (base_exp - p) as u64)
}

/// Tier-relative bucket containing `size`.
///
/// # Panics
///
/// In debug builds, if `size < 1 << base_exp`.
#[inline]
pub(crate) const fn bucket_of_size(size: u64, p: u32, base_exp: u32) -> u64 {
    let e = size.ilog2();
    // Shifting leaves `1 <div>` in the low p+1 bits; the XOR drops the leading one.
    let division = (size >> (e - p)) ^ (1u64 << p);
    let octave = ((e - base_exp) as u64) << p;
    division + octave
}

/// Overflow-checked [`size_of_bucket`] used while validating a config, where
/// `g` may sit one past the last bucket. `None` means the size is past 2^128.
pub(crate) fn wide_size_of_bucket(g: u64, p: u32, base_exp: u32) -> Option<u128> {
    let mantissa = (1u128 << p) + u128::from(g & ((1u64 << p) - 1));
    let shift = (g >> p).checked_add(u64::from(base_exp - p))?;
    let shift = u32::try_from(shift).ok()?;
    if shift >= u128::BITS - mantissa.ilog2() {
        return None;
    }
    Some(mantissa << shift)
}
