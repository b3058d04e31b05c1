#![no_main]

use libfuzzer_sys::fuzz_target;
use time::OffsetDateTime;

fuzz_target!(|data: &[u8]| {
    let now = OffsetDateTime::UNIX_EPOCH;

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(certs) = acmex_lib::inspect(text, now) {
            let _ = acmex_lib::display_chain(&certs, true);
            let _ = acmex_lib::to_json(&certs);
        }
    }

    // Raw DER goes through the same field extraction.
    if let Ok(cert) = acmex_lib::parse_der(data, now) {
        let _ = cert.subject_string();
        let _ = cert.issuer_string();
        let _ = cert.is_self_issued();
        let _ = acmex_lib::display_text(&cert, true);
    }
});
