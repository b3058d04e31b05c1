#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding must reject bad documents with an error, never a panic.
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(store) = acmex_lib::decode(&value) else {
        return;
    };

    // Every decoded entry must be reachable by its own domain.
    if let Ok(entries) = acmex_lib::list_certificates(&store) {
        for entry in entries {
            let found = acmex_lib::find_certificate(&store, &entry.domain.main);
            assert!(matches!(found, Ok(Some(_))));
            let _ = acmex_lib::extract_chain_pem(entry);
            let _ = acmex_lib::extract_key_pem(entry);
        }
    }
});
