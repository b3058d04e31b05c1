#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Property tests over generated store documents and PEM payloads.

use acmex_lib::*;
use base64::Engine;
use proptest::prelude::*;
use serde_json::{json, Value};

fn domain_name() -> impl Strategy<Value = String> {
    "[a-z]{1,12}(\\.[a-z]{2,6}){1,2}"
}

fn pem_text() -> impl Strategy<Value = String> {
    ("[A-Z ]{3,20}", "[A-Za-z0-9+/=\n]{0,200}").prop_map(|(label, body)| {
        format!(
            "-----BEGIN {label}-----\n{body}\n-----END {label}-----\n",
            label = label,
            body = body
        )
    })
}

fn store_doc(mains: &[String], certificate: &str) -> Value {
    let certificates: Vec<Value> = mains
        .iter()
        .map(|main| {
            json!({
                "domain": { "main": main, "sans": [format!("www.{}", main)] },
                "certificate": certificate,
                "key": certificate,
                "Store": "default"
            })
        })
        .collect();
    json!({
        "letsencrypt": {
            "Account": {
                "Email": "ops@example.com",
                "Registration": {
                    "body": { "status": "valid", "contact": [] },
                    "uri": "https://acme.example.test/acct/1"
                },
                "PrivateKey": "",
                "KeyType": "4096"
            },
            "Certificates": certificates
        }
    })
}

proptest! {
    #[test]
    fn decode_preserves_certificate_count(mains in prop::collection::vec(domain_name(), 0..16)) {
        let store = decode(&store_doc(&mains, "eA==")).unwrap();
        let certs = list_certificates(&store).unwrap();
        prop_assert_eq!(certs.len(), mains.len());
        for (entry, main) in certs.iter().zip(&mains) {
            prop_assert_eq!(&entry.domain.main, main);
            prop_assert_eq!(entry.domain.sans(), [format!("www.{}", main)]);
        }
    }

    #[test]
    fn removing_main_fails_at_its_path(
        mains in prop::collection::vec(domain_name(), 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let i = pick.index(mains.len());
        let mut doc = store_doc(&mains, "eA==");
        doc["letsencrypt"]["Certificates"][i]["domain"]
            .as_object_mut()
            .unwrap()
            .remove("main");

        let err = decode(&doc).unwrap_err();
        prop_assert_eq!(
            err.path,
            format!(r#"$["letsencrypt"].Certificates[{}].domain.main"#, i)
        );
    }

    #[test]
    fn absent_domain_is_not_found(
        mains in prop::collection::vec(domain_name(), 0..8),
        probe in domain_name(),
    ) {
        prop_assume!(!mains.contains(&probe));
        let store = decode(&store_doc(&mains, "eA==")).unwrap();
        prop_assert!(find_certificate(&store, &probe).unwrap().is_none());
    }

    #[test]
    fn unique_domain_is_found(mains in prop::collection::hash_set(domain_name(), 1..8)) {
        let mains: Vec<String> = mains.into_iter().collect();
        let store = decode(&store_doc(&mains, "eA==")).unwrap();
        for main in &mains {
            let found = find_certificate(&store, main).unwrap().unwrap();
            prop_assert_eq!(&found.domain.main, main);
        }
    }

    #[test]
    fn extraction_inverts_base64(pem in pem_text()) {
        let encoded = base64::engine::general_purpose::STANDARD.encode(pem.as_bytes());
        let store = decode(&store_doc(&["example.com".to_string()], &encoded)).unwrap();
        let entry = find_certificate(&store, "example.com").unwrap().unwrap();
        prop_assert_eq!(extract_chain_pem(entry).unwrap(), pem.clone());
        prop_assert_eq!(extract_key_pem(entry).unwrap(), pem);
    }
}
