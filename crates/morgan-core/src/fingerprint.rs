//! Canonical 2048-bit fingerprint and Tanimoto similarity
//!
//! A fingerprint is 32 little-endian `u64` words. Similarity is the Jaccard
//! index over set bits:
//!
//! ```text
//! tanimoto(a, b) = popcount(a & b) / popcount(a | b)
//! ```
//!
//! # Architecture Selection
//!
//! | Platform       | ISA      | Path                              |
//! |----------------|----------|-----------------------------------|
//! | x86_64+POPCNT  | POPCNT   | `counts_popcnt` (runtime check)   |
//! | other          | scalar   | `u64::count_ones` per word        |

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::codec::{self, DecodeError, Format};

/// Number of bits in a Morgan fingerprint
pub const BITS: usize = 2048;

/// Number of 64-bit words in a fingerprint
pub const WORDS: usize = BITS / 64;

/// Size of a fingerprint in bytes (as stored in memory and on disk)
pub const BYTES: usize = BITS / 8;

/// A fixed-width 2048-bit fingerprint.
///
/// Bit `p` lives in word `p / 64` at bit `p % 64`. Equality and hashing cover
/// every word; hashing goes through the standard (SipHash) hasher.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Fingerprint([u64; WORDS]);

impl Fingerprint {
    /// All-zero fingerprint
    #[inline]
    pub const fn zero() -> Self {
        Self([0; WORDS])
    }

    #[inline]
    pub const fn from_words(words: [u64; WORDS]) -> Self {
        Self(words)
    }

    /// Build from 256 raw bytes, 8 little-endian bytes per word
    pub fn from_bytes(bytes: &[u8; BYTES]) -> Self {
        let mut words = [0u64; WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            *word = u64::from_le_bytes(buf);
        }
        Self(words)
    }

    #[inline]
    pub fn words(&self) -> &[u64; WORDS] {
        &self.0
    }

    /// Raw little-endian byte image (the inverse of [`Fingerprint::from_bytes`])
    pub fn to_bytes(&self) -> [u8; BYTES] {
        let mut out = [0u8; BYTES];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Plain (512 character, lowercase) hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse the plain 512 character hex encoding (either case)
    pub fn from_hex(encoded: &str) -> Result<Self, DecodeError> {
        codec::decode(encoded, Format::Plain)
    }

    /// Set bit `position`. Callers guarantee `position < BITS`.
    #[inline]
    pub(crate) fn set_bit(&mut self, position: usize) {
        debug_assert!(position < BITS);
        self.0[position / 64] |= 1u64 << (position % 64);
    }

    #[inline]
    pub fn bit(&self, position: usize) -> bool {
        position < BITS && self.0[position / 64] & (1u64 << (position % 64)) != 0
    }

    /// Number of set bits
    pub fn count_ones(&self) -> u32 {
        self.0.iter().map(|w| w.count_ones()).sum()
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fingerprint")
            .field("ones", &self.count_ones())
            .field("hex", &self.to_hex())
            .finish()
    }
}

// ============================================================================
// x86_64 POPCNT (runtime feature detection)
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "popcnt")]
#[inline]
unsafe fn counts_popcnt(a: &[u64; WORDS], b: &[u64; WORDS]) -> (u32, u32) {
    use std::arch::x86_64::_popcnt64;

    let mut and = 0i32;
    let mut or = 0i32;
    for i in 0..WORDS {
        and += _popcnt64((a[i] & b[i]) as i64);
        or += _popcnt64((a[i] | b[i]) as i64);
    }
    (and as u32, or as u32)
}

// ============================================================================
// Scalar fallback
// ============================================================================

/// Portable intersection/union popcounts over raw words
#[inline]
pub fn counts_scalar(a: &[u64; WORDS], b: &[u64; WORDS]) -> (u32, u32) {
    let mut and = 0u32;
    let mut or = 0u32;
    for (x, y) in a.iter().zip(b.iter()) {
        and += (x & y).count_ones();
        or += (x | y).count_ones();
    }
    (and, or)
}

/// Popcounts of the intersection and the union of two fingerprints
#[inline]
pub fn intersection_union(a: &Fingerprint, b: &Fingerprint) -> (u32, u32) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("popcnt") {
            return unsafe { counts_popcnt(&a.0, &b.0) };
        }
    }

    #[allow(unreachable_code)]
    counts_scalar(&a.0, &b.0)
}

/// Tanimoto (Jaccard) similarity of two fingerprints.
///
/// Returns 0.0 when both fingerprints are all-zero.
#[inline]
pub fn tanimoto(a: &Fingerprint, b: &Fingerprint) -> f64 {
    let (intersection, union) = intersection_union(a, b);
    if union == 0 {
        return 0.0;
    }
    f64::from(intersection) / f64::from(union)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_fp(rng: &mut StdRng) -> Fingerprint {
        let mut words = [0u64; WORDS];
        for w in words.iter_mut() {
            // Sparse-ish, like real Morgan fingerprints
            *w = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
        }
        Fingerprint::from_words(words)
    }

    #[test]
    fn test_self_similarity() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let a = random_fp(&mut rng);
            if a.count_ones() == 0 {
                continue;
            }
            assert_eq!(tanimoto(&a, &a), 1.0);
        }
    }

    #[test]
    fn test_symmetry_and_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let a = random_fp(&mut rng);
            let b = random_fp(&mut rng);
            let ab = tanimoto(&a, &b);
            assert_eq!(ab, tanimoto(&b, &a));
            assert!((0.0..=1.0).contains(&ab));
        }
    }

    #[test]
    fn test_simd_matches_scalar() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let a = random_fp(&mut rng);
            let b = random_fp(&mut rng);
            assert_eq!(intersection_union(&a, &b), counts_scalar(a.words(), b.words()));
        }
    }

    #[test]
    fn test_all_zero_is_zero() {
        let z = Fingerprint::zero();
        assert_eq!(tanimoto(&z, &z), 0.0);
    }

    #[test]
    fn test_disjoint() {
        let mut a = Fingerprint::zero();
        let mut b = Fingerprint::zero();
        a.set_bit(0);
        b.set_bit(2047);
        assert_eq!(tanimoto(&a, &b), 0.0);
        assert_eq!(tanimoto(&a, &Fingerprint::zero()), 0.0);
    }

    #[test]
    fn test_known_ratio() {
        let mut a = Fingerprint::zero();
        let mut b = Fingerprint::zero();
        for p in [1, 64, 100, 2000] {
            a.set_bit(p);
        }
        for p in [1, 64, 1500] {
            b.set_bit(p);
        }
        // 2 shared, 5 in union
        assert!((tanimoto(&a, &b) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_bytes_roundtrip_is_little_endian() {
        let mut bytes = [0u8; BYTES];
        bytes[0] = 0x01;
        bytes[9] = 0x80;
        let fp = Fingerprint::from_bytes(&bytes);
        assert_eq!(fp.words()[0], 1);
        assert_eq!(fp.words()[1], 0x8000);
        assert!(fp.bit(0));
        assert!(fp.bit(64 + 15));
        assert_eq!(fp.to_bytes(), bytes);
    }

    #[test]
    fn test_from_hex() {
        let mut fp = Fingerprint::zero();
        fp.set_bit(5);
        fp.set_bit(2047);
        assert_eq!(Fingerprint::from_hex(&fp.to_hex().to_uppercase()).unwrap(), fp);
        assert!(Fingerprint::from_hex("abc").is_err());
    }
}
