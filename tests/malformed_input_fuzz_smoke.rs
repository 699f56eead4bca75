use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use morgan_fps::{codec, format, Format};

#[test]
fn malformed_bytes_do_not_panic_decode_paths() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..2_000 {
        let len = rng.gen_range(0..600usize);
        let mut data = vec![0u8; len];
        rng.fill(data.as_mut_slice());

        let _ = codec::decode_pickle(&data);
        let _ = codec::decode(&hex::encode(&data), Format::LegacyPacked);
        let _ = format::from_bytes(&data);

        let mut framed = b"MORGANFPS".to_vec();
        framed.extend_from_slice(&data);
        let _ = format::from_bytes(&framed);
    }
}

#[test]
fn random_text_does_not_panic_plain_decoder() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let s: String = (0..512)
            .map(|_| char::from(rng.gen_range(0x20u8..0x7f)))
            .collect();
        let _ = codec::decode(&s, Format::Plain);
    }
}
