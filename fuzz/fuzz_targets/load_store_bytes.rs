#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(store) = morgan_core::format::from_bytes(data) {
        // Anything that loads must be queryable
        if let Some(&first) = store.names().first() {
            let _ = store.tanimoto_all(first);
        }
    }
});
