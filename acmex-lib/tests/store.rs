#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Decoding, lookup and PEM extraction against hand-written and fixture
//! store documents.

use acmex_lib::*;
use serde_json::{json, Value};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fixtures_dir() -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.pop(); // up from acmex-lib to workspace root
    p.push("tests");
    p
}

fn account() -> Value {
    json!({
        "Email": "ops@example.com",
        "Registration": {
            "body": { "status": "valid", "contact": ["mailto:ops@example.com"] },
            "uri": "https://acme.example.test/acct/1"
        },
        "PrivateKey": "a2V5",
        "KeyType": "4096"
    })
}

fn entry(main: &str, certificate: &str) -> Value {
    json!({
        "domain": { "main": main },
        "certificate": certificate,
        "key": "a2V5",
        "Store": "default"
    })
}

fn store_with(certificates: Vec<Value>) -> Value {
    json!({ "letsencrypt": { "Account": account(), "Certificates": certificates } })
}

// =========================================================================
// Schema decoder
// =========================================================================

#[test]
fn decode_fixture_store() {
    let bytes = std::fs::read(fixtures_dir().join("data/acme.json")).unwrap();
    let store = parse_store(&bytes).unwrap();

    assert_eq!(store.len(), 1);
    let resolver = &store.resolvers["letsencrypt"];
    assert_eq!(resolver.account.email, "ops@example.com");
    assert_eq!(resolver.account.registration.body.status, "valid");
    assert_eq!(
        resolver.account.registration.body.contact,
        vec!["mailto:ops@example.com".to_string()]
    );
    assert_eq!(resolver.certificates.len(), 3);
    assert_eq!(resolver.certificates[0].store, "default");
}

#[test]
fn decode_missing_domain_main_points_at_field() {
    let mut doc = store_with(vec![entry("a.example", "eA==")]);
    doc["letsencrypt"]["Certificates"][0]["domain"]
        .as_object_mut()
        .unwrap()
        .remove("main");

    let err = decode(&doc).unwrap_err();
    assert_eq!(err.path, r#"$["letsencrypt"].Certificates[0].domain.main"#);
    assert_eq!(err.expected, "string");
    assert_eq!(err.actual, "missing");
}

#[test]
fn decode_wrong_type_reports_expected_and_actual() {
    let mut doc = store_with(vec![entry("a.example", "eA=="), entry("b.example", "eA==")]);
    doc["letsencrypt"]["Certificates"][1]["certificate"] = json!(42);

    let err = decode(&doc).unwrap_err();
    assert_eq!(err.path, r#"$["letsencrypt"].Certificates[1].certificate"#);
    assert_eq!(err.expected, "string");
    assert_eq!(err.actual, "number");
    assert!(err.to_string().contains("expected string, found number"));
}

#[test]
fn decode_rejects_non_string_san() {
    let mut doc = store_with(vec![entry("a.example", "eA==")]);
    doc["letsencrypt"]["Certificates"][0]["domain"]["sans"] = json!(["www.a.example", null]);

    let err = decode(&doc).unwrap_err();
    assert_eq!(err.path, r#"$["letsencrypt"].Certificates[0].domain.sans[1]"#);
    assert_eq!(err.actual, "null");
}

#[test]
fn decode_rejects_non_object_root() {
    let err = decode(&json!([])).unwrap_err();
    assert_eq!(err.path, "$");
    assert_eq!(err.expected, "object");
    assert_eq!(err.actual, "array");
}

#[test]
fn decode_rejects_incomplete_account() {
    let mut doc = store_with(vec![]);
    doc["letsencrypt"]["Account"]["Registration"]["body"]
        .as_object_mut()
        .unwrap()
        .remove("contact");

    let err = decode(&doc).unwrap_err();
    assert_eq!(
        err.path,
        r#"$["letsencrypt"].Account.Registration.body.contact"#
    );
    assert_eq!(err.actual, "missing");
}

#[test]
fn decode_rejects_certificates_object() {
    let mut doc = store_with(vec![]);
    doc["letsencrypt"]["Certificates"] = json!({});

    let err = decode(&doc).unwrap_err();
    assert_eq!(err.path, r#"$["letsencrypt"].Certificates"#);
    assert_eq!(err.expected, "array");
    assert_eq!(err.actual, "object");
}

#[test]
fn decode_ignores_unknown_keys_and_absent_sans() {
    let mut doc = store_with(vec![entry("a.example", "eA==")]);
    doc["letsencrypt"]["Certificates"][0]["extra"] = json!({"anything": true});
    doc["letsencrypt"]["Unknown"] = json!(1);

    let store = decode(&doc).unwrap();
    let certs = list_certificates(&store).unwrap();
    assert_eq!(certs[0].domain.sans, None);
    assert!(certs[0].domain.sans().is_empty());
}

#[test]
fn decode_rejects_null_sans() {
    let mut doc = store_with(vec![entry("a.example", "eA==")]);
    doc["letsencrypt"]["Certificates"][0]["domain"]["sans"] = Value::Null;

    let err = decode(&doc).unwrap_err();
    assert_eq!(err.path, r#"$["letsencrypt"].Certificates[0].domain.sans"#);
    assert_eq!(err.expected, "array of strings");
    assert_eq!(err.actual, "null");
}

#[test]
fn decode_rejects_empty_domain_main() {
    let doc = store_with(vec![entry("a.example", "eA=="), entry("", "eA==")]);

    let err = decode(&doc).unwrap_err();
    assert_eq!(err.path, r#"$["letsencrypt"].Certificates[1].domain.main"#);
    assert_eq!(err.expected, "non-empty string");
    assert_eq!(err.actual, "empty string");
}

#[test]
fn decode_quotes_resolver_keys_in_path() {
    let doc = json!({ "my.resolver": { "Account": account() } });
    let err = decode(&doc).unwrap_err();
    assert_eq!(err.path, r#"$["my.resolver"].Certificates"#);
}

// =========================================================================
// Store accessor
// =========================================================================

#[test]
fn empty_store_has_no_certificates() {
    let store = decode(&json!({})).unwrap();
    assert!(store.is_empty());
    assert_eq!(list_certificates(&store).unwrap_err(), EmptyStoreError);
    assert_eq!(
        find_certificate(&store, "example.com").unwrap_err(),
        EmptyStoreError
    );
}

#[test]
fn find_certificate_exact_match_only() {
    let store = decode(&store_with(vec![
        entry("example.com", "eA=="),
        entry("www.example.com", "eQ=="),
    ]))
    .unwrap();

    let found = find_certificate(&store, "www.example.com").unwrap().unwrap();
    assert_eq!(found.certificate, "eQ==");
    assert!(find_certificate(&store, "EXAMPLE.COM").unwrap().is_none());
    assert!(find_certificate(&store, "example.com.").unwrap().is_none());
}

#[test]
fn find_certificate_returns_first_duplicate() {
    let store = decode(&store_with(vec![
        entry("dup.example", "Zmlyc3Q="),
        entry("dup.example", "c2Vjb25k"),
    ]))
    .unwrap();
    let found = find_certificate(&store, "dup.example").unwrap().unwrap();
    assert_eq!(extract_chain_pem(found).unwrap(), "first");
}

#[test]
fn first_resolver_is_document_order() {
    let raw = format!(
        r#"{{"zeta": {{"Account": {a}, "Certificates": [{z}]}},
            "alpha": {{"Account": {a}, "Certificates": []}}}}"#,
        a = account(),
        z = entry("zeta.example", "eA==")
    );
    let store = parse_store(raw.as_bytes()).unwrap();

    assert_eq!(resolver_names(&store).collect::<Vec<_>>(), ["zeta", "alpha"]);
    assert_eq!(list_certificates(&store).unwrap()[0].domain.main, "zeta.example");
    assert!(list_certificates_in(&store, "alpha").unwrap().is_empty());
    assert_eq!(
        list_certificates_in(&store, "beta").unwrap_err().name,
        "beta"
    );
}

// =========================================================================
// PEM extraction
// =========================================================================

#[test]
fn placeholder_chain_round_trip() {
    let mut doc = store_with(vec![entry("example.com", "LS0tLS1CRUdJTi4uLg==")]);
    doc["letsencrypt"]["Certificates"][0]["domain"]["sans"] =
        json!(["www.example.com", "api.example.com"]);
    let store = decode(&doc).unwrap();

    let certs = list_certificates(&store).unwrap();
    assert_eq!(
        certs[0].domain.sans(),
        ["www.example.com".to_string(), "api.example.com".to_string()]
    );

    let found = find_certificate(&store, "example.com").unwrap().unwrap();
    assert_eq!(extract_chain_pem(found).unwrap(), "-----BEGIN...");
    assert_eq!(extract_key_pem(found).unwrap(), "key");
}

#[test]
fn fixture_chain_is_byte_identical() {
    let dir = fixtures_dir();
    let store = read_store(&dir.join("data/acme.json")).unwrap();
    let entry = find_certificate(&store, "example.com").unwrap().unwrap();

    let chain = std::fs::read_to_string(dir.join("certs/fullchain.pem")).unwrap();
    let key = std::fs::read_to_string(dir.join("certs/leaf-key.pem")).unwrap();
    assert_eq!(extract_chain_pem(entry).unwrap(), chain);
    assert_eq!(AttachmentKind::Key.extract(entry).unwrap(), key);
}

#[test]
fn corrupt_base64_is_invalid_encoding() {
    let store = read_store(&fixtures_dir().join("data/acme.json")).unwrap();
    let entry = find_certificate(&store, "corrupt.example.net")
        .unwrap()
        .unwrap();

    let err = extract_chain_pem(entry).unwrap_err();
    assert_eq!(err.field, "certificate");
    assert_eq!(err.domain, "corrupt.example.net");
    assert!(err.reason.starts_with("invalid base64"));
    assert_eq!(extract_key_pem(entry).unwrap_err().field, "key");
}

#[test]
fn non_utf8_payload_is_invalid_encoding() {
    // 0xFF 0xFE is not valid UTF-8
    let store = decode(&store_with(vec![entry("bin.example", "//4=")])).unwrap();
    let entry = &list_certificates(&store).unwrap()[0];
    let err = extract_chain_pem(entry).unwrap_err();
    assert!(err.reason.starts_with("not UTF-8"));
}

#[test]
fn unpadded_base64_is_accepted() {
    let store = decode(&store_with(vec![entry("p.example", "LS0tLS1CRUdJTi4uLg")])).unwrap();
    let entry = &list_certificates(&store).unwrap()[0];
    assert_eq!(extract_chain_pem(entry).unwrap(), "-----BEGIN...");
}

#[test]
fn attachment_kind_names() {
    assert_eq!(AttachmentKind::from_name("FullChain"), Some(AttachmentKind::Fullchain));
    assert_eq!(AttachmentKind::from_name("key"), Some(AttachmentKind::Key));
    assert_eq!(AttachmentKind::from_name("cert"), None);
    assert_eq!(AttachmentKind::Fullchain.to_string(), "fullchain");
}

// =========================================================================
// Loading
// =========================================================================

#[test]
fn missing_file_is_io_error() {
    let err = read_store(&fixtures_dir().join("data/does-not-exist.json")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "got {:?}", err);
}

#[test]
fn invalid_json_is_not_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("acme.json");
    std::fs::write(&path, b"{\"letsencrypt\": {").unwrap();

    let err = read_store(&path).unwrap_err();
    assert!(matches!(err, LoadError::Json(_)), "got {:?}", err);
}

#[test]
fn shape_mismatch_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("acme.json");
    std::fs::write(&path, br#"{"letsencrypt": []}"#).unwrap();

    match read_store(&path).unwrap_err() {
        LoadError::Decode(e) => assert_eq!(e.path, r#"$["letsencrypt"]"#),
        other => panic!("expected decode error, got {:?}", other),
    }
}

#[test]
fn oversized_file_is_rejected() {
    let file = tempfile::NamedTempFile::new().unwrap();
    file.as_file().set_len(MAX_STORE_BYTES + 1).unwrap();

    let err = read_store(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::TooLarge { .. }), "got {:?}", err);
}
