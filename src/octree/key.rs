//! Z-order (Morton) keys.
//!
//! Each co-ordinate is offset from the root box's minimum corner, scaled by the
//! root's largest extent and quantised to `64 / K` bits. The per-dimension bits
//! are then interleaved, most significant level first, into a single `u64`.
//! Keys built with the same minimum corner and extent are directly comparable,
//! so the same pair must be used at build time and at lookup time.

use crate::types::Axis;

/// Total number of bits in a key.
pub const KEY_BITS: u32 = u64::BITS;

/// Number of key bits given to each of `K` dimensions.
#[inline]
pub const fn bits_per_dim<const K: usize>() -> u32 {
    if K == 0 {
        0
    } else {
        KEY_BITS / K as u32
    }
}

/// Number of key bits actually used for `K` dimensions.
#[inline]
pub const fn used_key_bits<const K: usize>() -> u32 {
    bits_per_dim::<K>() * K as u32
}

/// Quantises one co-ordinate into `bits` bits. Values outside
/// `[min, min + delta]` are clamped to the nearest end of the range.
#[inline]
fn quantise<A: Axis>(value: A, min: A, delta: A, bits: u32) -> u64 {
    let max_val = if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    };

    let delta = delta.to_f64_lossy();
    if !(delta > 0.0) {
        return 0;
    }

    let offset = (value.to_f64_lossy() - min.to_f64_lossy()).clamp(0.0, delta);
    // `as` saturates, which also covers rounding past max_val
    ((offset / delta) * max_val as f64).floor() as u64
}

/// Computes the space-filling key of `point` relative to the `min` corner and
/// the largest extent `delta` of the box the tree was built over.
///
/// # Examples
///
/// ```rust
/// use octknn::octree::key::interleave_bits;
///
/// let min = [0.0, 0.0];
///
/// assert_eq!(interleave_bits(&[0.0, 0.0], &min, 1.0), 0);
/// assert!(interleave_bits(&[1.0, 1.0], &min, 1.0) > interleave_bits(&[0.9, 0.9], &min, 1.0));
/// ```
pub fn interleave_bits<A: Axis, const K: usize>(point: &[A; K], min: &[A; K], delta: A) -> u64 {
    let bits = bits_per_dim::<K>();
    let ints: [u64; K] = std::array::from_fn(|dim| quantise(point[dim], min[dim], delta, bits));

    let mut key = 0u64;
    for level in (0..bits).rev() {
        for &int in ints.iter() {
            key = (key << 1) | ((int >> level) & 1);
        }
    }
    key
}

/// Whether the bit that a stem splits on is set in `key`.
///
/// Stems store their split as a 1-based bit position (`bit` in `1..=64`);
/// the tested bit is `bit - 1`. A set bit selects the right child.
#[inline]
pub fn lookup_bit(key: u64, bit: u32) -> bool {
    debug_assert!(bit >= 1 && bit <= KEY_BITS, "split bit {bit} out of range");
    (key >> (bit - 1)) & 1 == 1
}
