//! Shared generators for integration tests

#![allow(dead_code)]

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::Rng;

use morgan_fps::Fingerprint;

/// Random set of on-bit positions with roughly `density` fill
pub fn random_bits(rng: &mut StdRng, density: f64) -> BTreeSet<u32> {
    (0..2048u32).filter(|_| rng.gen_bool(density)).collect()
}

pub fn fingerprint_of(bits: &BTreeSet<u32>) -> Fingerprint {
    let mut words = [0u64; 32];
    for &b in bits {
        words[(b / 64) as usize] |= 1u64 << (b % 64);
    }
    Fingerprint::from_words(words)
}

pub fn plain_hex(bits: &BTreeSet<u32>) -> String {
    fingerprint_of(bits).to_hex()
}

fn pack_u32(v: u32, out: &mut Vec<u8>) {
    if v < (1 << 7) {
        out.push((v << 1) as u8);
    } else if v < (1 << 7) + (1 << 14) {
        let x = ((v - (1 << 7)) << 2) | 1;
        out.extend_from_slice(&x.to_le_bytes()[..2]);
    } else if v < (1 << 7) + (1 << 14) + (1 << 21) {
        let x = ((v - (1 << 7) - (1 << 14)) << 3) | 3;
        out.extend_from_slice(&x.to_le_bytes()[..3]);
    } else {
        let x = ((v - (1 << 7) - (1 << 14) - (1 << 21)) << 3) | 7;
        out.extend_from_slice(&x.to_le_bytes());
    }
}

/// Legacy version-32 (delta run-length) pickle, hex encoded
pub fn rle_hex(bits: &BTreeSet<u32>) -> String {
    let mut raw = Vec::new();
    raw.extend_from_slice(&(-32i32).to_le_bytes());
    raw.extend_from_slice(&2048i32.to_le_bytes());
    raw.extend_from_slice(&(bits.len() as u32).to_le_bytes());
    let mut cursor = 0;
    for &b in bits {
        pack_u32(b - cursor, &mut raw);
        cursor = b + 1;
    }
    hex::encode_upper(raw)
}

/// Legacy version-16 (u16 positions) pickle, hex encoded
pub fn short_hex(bits: &BTreeSet<u32>) -> String {
    let mut raw = Vec::new();
    raw.extend_from_slice(&(-16i32).to_le_bytes());
    raw.extend_from_slice(&2048i32.to_le_bytes());
    raw.extend_from_slice(&(bits.len() as u32).to_le_bytes());
    for &b in bits {
        raw.extend_from_slice(&(b as u16).to_le_bytes());
    }
    hex::encode(raw)
}

/// Reference Jaccard over position sets
pub fn jaccard(a: &BTreeSet<u32>, b: &BTreeSet<u32>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
