//! SSE2 Fitch kernel: 16 packed bytes (32 characters) per register.
//!
//! Mirrors [`super::scalar`] exactly but at byte (not nibble) granularity:
//! `_mm_cmpeq_epi8` against zero tells us which bytes of the AND-word are
//! empty (both nibbles' bits matter here, since a byte holds two distinct
//! characters - an "empty" byte means *both* of its two characters were
//! disjoint, which can't happen for a real alignment since the two halves
//! of a byte are unrelated characters). To keep per-character granularity
//! we therefore operate the comparison on a nibble-expanded view: each
//! input byte is split into two bytes (one per nibble) before the SIMD
//! compare, and the two results are repacked afterward. This costs an
//! unpack/pack pair per register but keeps the core AND/OR/compare/select
//! sequence identical to the scalar nibble algorithm.
//!
//! Per-lane match counts are accumulated with `_mm_add_epi8` for up to 127
//! iterations (the most a `u8` lane can hold before it could wrap past
//! 255), then drained into a 64-bit running total with `_mm_sad_epu8`
//! against a zero vector - the same rhythm the original assembly uses to
//! dodge 8-bit lane overflow.

#![allow(unsafe_code)]

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

/// Whether the SSE2 kernel can run on this process. Checked once; callers
/// should cache the result rather than call this per-invocation.
#[cfg(target_arch = "x86_64")]
pub fn available() -> bool {
    is_x86_feature_detected!("sse2")
}

#[cfg(not(target_arch = "x86_64"))]
pub fn available() -> bool {
    false
}

#[cfg(not(target_arch = "x86_64"))]
pub fn combine(_a: &[u8], _b: &[u8], _out: &mut [u8]) -> u32 {
    unreachable!("simd::combine called without checking simd::available()")
}

#[cfg(not(target_arch = "x86_64"))]
pub fn combine_final(_a: &[u8], _b: &[u8], _maxscore: u32) -> Option<u32> {
    unreachable!("simd::combine_final called without checking simd::available()")
}

const DRAIN_PERIOD: usize = 127;

/// Combine two packed-nibble slices with the SSE2 kernel. Caller must have
/// checked [`available`]. Lengths must be equal and a multiple of 16
/// bytes (32 characters).
#[cfg(target_arch = "x86_64")]
pub fn combine(a: &[u8], b: &[u8], out: &mut [u8]) -> u32 {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), out.len());
    debug_assert_eq!(a.len() % 16, 0);

    unsafe {
        let zero = _mm_setzero_si128();
        let mut total: u64 = 0;
        let mut acc = zero;
        let mut pending = 0usize;

        for ((a_chunk, b_chunk), out_chunk) in a
            .chunks_exact(16)
            .zip(b.chunks_exact(16))
            .zip(out.chunks_exact_mut(16))
        {
            let av = _mm_loadu_si128(a_chunk.as_ptr() as *const __m128i);
            let bv = _mm_loadu_si128(b_chunk.as_ptr() as *const __m128i);

            let (lo_a, hi_a) = split_nibbles(av);
            let (lo_b, hi_b) = split_nibbles(bv);

            let (lo_res, lo_matched) = combine_lane(lo_a, lo_b, zero);
            let (hi_res, hi_matched) = combine_lane(hi_a, hi_b, zero);

            let result = join_nibbles(lo_res, hi_res);
            _mm_storeu_si128(out_chunk.as_mut_ptr() as *mut __m128i, result);

            let matched = _mm_add_epi8(lo_matched, hi_matched);
            acc = _mm_add_epi8(acc, matched);
            pending += 1;

            if pending == DRAIN_PERIOD {
                total += drain(acc);
                acc = zero;
                pending = 0;
            }
        }
        if pending > 0 {
            total += drain(acc);
        }
        total as u32
    }
}

/// Same kernel as [`combine`], but does not write a result and bails out
/// early with `None` once the running score exceeds `maxscore`.
#[cfg(target_arch = "x86_64")]
pub fn combine_final(a: &[u8], b: &[u8], maxscore: u32) -> Option<u32> {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len() % 16, 0);

    unsafe {
        let zero = _mm_setzero_si128();
        let mut total: u64 = 0;
        let mut acc = zero;
        let mut pending = 0usize;

        for (a_chunk, b_chunk) in a.chunks_exact(16).zip(b.chunks_exact(16)) {
            let av = _mm_loadu_si128(a_chunk.as_ptr() as *const __m128i);
            let bv = _mm_loadu_si128(b_chunk.as_ptr() as *const __m128i);

            let (lo_a, hi_a) = split_nibbles(av);
            let (lo_b, hi_b) = split_nibbles(bv);
            let (_, lo_matched) = combine_lane(lo_a, lo_b, zero);
            let (_, hi_matched) = combine_lane(hi_a, hi_b, zero);

            let matched = _mm_add_epi8(lo_matched, hi_matched);
            acc = _mm_add_epi8(acc, matched);
            pending += 1;

            if pending == DRAIN_PERIOD {
                total += drain(acc);
                acc = zero;
                pending = 0;
                if total > maxscore as u64 {
                    return None;
                }
            }
        }
        if pending > 0 {
            total += drain(acc);
        }
        if total > maxscore as u64 {
            None
        } else {
            Some(total as u32)
        }
    }
}

/// Split each byte's low and high nibble into separate lanes (one
/// character per lane, zero-extended into a byte).
#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn split_nibbles(v: __m128i) -> (__m128i, __m128i) {
    let low_mask = _mm_set1_epi8(0x0f);
    let lo = _mm_and_si128(v, low_mask);
    let hi = _mm_and_si128(_mm_srli_epi16(v, 4), low_mask);
    (lo, hi)
}

/// Inverse of [`split_nibbles`]: pack low-nibble lane and high-nibble lane
/// back into one byte per pair.
#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn join_nibbles(lo: __m128i, hi: __m128i) -> __m128i {
    _mm_or_si128(lo, _mm_slli_epi16(hi, 4))
}

/// Combine one nibble-per-byte lane pair; returns (result, matched-as-1-or-0).
#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn combine_lane(a: __m128i, b: __m128i, zero: __m128i) -> (__m128i, __m128i) {
    let and_v = _mm_and_si128(a, b);
    let or_v = _mm_or_si128(a, b);
    let empty = _mm_cmpeq_epi8(and_v, zero); // 0xFF where and_v byte == 0
    let result = _mm_xor_si128(and_v, _mm_and_si128(empty, _mm_xor_si128(and_v, or_v)));
    let matched = _mm_and_si128(empty, _mm_set1_epi8(1));
    (result, matched)
}

#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn drain(acc: __m128i) -> u64 {
    let summed = _mm_sad_epu8(acc, _mm_setzero_si128());
    let lo = _mm_cvtsi128_si64(summed) as u64;
    let hi = _mm_cvtsi128_si64(_mm_srli_si128(summed, 8)) as u64;
    lo + hi
}

#[cfg(all(test, target_arch = "x86_64"))]
mod tests {
    use super::*;
    use crate::ps::scalar;

    fn pack(chars: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; chars.len().div_ceil(2)];
        for (i, &c) in chars.iter().enumerate() {
            if i % 2 == 0 {
                out[i / 2] = c;
            } else {
                out[i / 2] |= c << 4;
            }
        }
        out
    }

    #[test]
    fn matches_scalar_on_disjoint_and_overlapping() {
        if !available() {
            return;
        }
        let chars_a: Vec<u8> = (0..64).map(|i| if i % 3 == 0 { 0xC } else { 0x8 }).collect();
        let chars_b: Vec<u8> = (0..64).map(|i| if i % 3 == 0 { 0x1 } else { 0x8 }).collect();
        let a = pack(&chars_a);
        let b = pack(&chars_b);

        let mut out_simd = vec![0u8; a.len()];
        let score_simd = combine(&a, &b, &mut out_simd);

        let mut out_scalar = vec![0u8; a.len()];
        let score_scalar = scalar::combine(&a, &b, &mut out_scalar);

        assert_eq!(score_simd, score_scalar);
        assert_eq!(out_simd, out_scalar);
    }
}
