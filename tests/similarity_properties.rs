mod common;

use std::collections::BTreeSet;

use morgan_fps::{decode, tanimoto, tanimoto_encoded, FingerprintBatch, Format, SimilarityStore};

fn all_f_with(digit: usize, replacement: char) -> String {
    let mut s: Vec<char> = "F".repeat(512).chars().collect();
    s[digit] = replacement;
    s.into_iter().collect()
}

#[test]
fn one_bit_flips_are_counted_exactly() {
    // 'E' clears exactly one bit of an 'F' nibble
    let a = all_f_with(0, 'E');
    let b = all_f_with(511, 'E');
    let sim = tanimoto_encoded(&a, &b, Format::Plain).unwrap();
    assert_eq!(sim, 2046.0 / 2048.0);
    assert!(sim < 1.0);

    let same = tanimoto_encoded(&a, &a, Format::Plain).unwrap();
    assert_eq!(same, 1.0);
}

#[test]
fn decoding_is_a_pure_function_of_the_string() {
    let s = all_f_with(17, '3');
    let lower = s.to_lowercase();
    assert_eq!(
        decode(&s, Format::Plain).unwrap(),
        decode(&lower, Format::Plain).unwrap()
    );
    let fp = decode(&s, Format::Plain).unwrap();
    assert_eq!(decode(&fp.to_hex(), Format::Plain).unwrap(), fp);
}

#[test]
fn plain_and_packed_agree() {
    let bits: BTreeSet<u32> = [0, 1, 63, 64, 127, 128, 1000, 2047].into_iter().collect();
    let plain = decode(&common::plain_hex(&bits), Format::Plain).unwrap();
    let rle = decode(&common::rle_hex(&bits), Format::LegacyPacked).unwrap();
    let short = decode(&common::short_hex(&bits), Format::LegacyPacked).unwrap();
    assert_eq!(plain, rle);
    assert_eq!(plain, short);
    assert_eq!(tanimoto(&plain, &rle), 1.0);
}

#[test]
fn auto_names_are_one_based() {
    let batch = FingerprintBatch::new([all_f_with(0, '0'), all_f_with(1, '0'), all_f_with(2, '0')]);
    let store = SimilarityStore::from_batch(&batch).unwrap();
    assert_eq!(store.names(), &[1, 2, 3]);
    let rows = store.tanimoto_all(2).unwrap();
    assert_eq!(rows[1].similarity, 1.0);
}
