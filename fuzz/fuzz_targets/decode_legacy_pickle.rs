#![no_main]

use libfuzzer_sys::fuzz_target;
use morgan_core::codec::{decode, decode_pickle, Format};

fuzz_target!(|data: &[u8]| {
    let _ = decode_pickle(data);
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = decode(text, Format::LegacyPacked);
        let _ = decode(text, Format::Plain);
    }
});
