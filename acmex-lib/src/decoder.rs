//! Shape validation of an untrusted store document.
//!
//! [`decode`] walks a [`serde_json::Value`] and either produces a fully
//! typed [`Store`] or the first mismatch it met, with the JSON path to it.
//! Unknown keys are ignored at every level. Nothing is partially accepted.

use crate::store::{
    Account, CertificateEntry, Domain, Registration, RegistrationBody, ResolverRecord, Store,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;

/// The store document does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid store document at {path}: expected {expected}, found {actual}")]
pub struct DecodeError {
    /// Path to the offending value, rooted at `$`.
    pub path: String,
    /// What the decoder wanted at that position.
    pub expected: &'static str,
    /// JSON type found there, or `missing`.
    pub actual: String,
}

/// Location inside the document, rendered like `$["le"].Certificates[0].key`.
#[derive(Debug, Clone)]
struct JsonPath(String);

impl JsonPath {
    fn root() -> Self {
        JsonPath("$".into())
    }

    fn field(&self, name: &str) -> Self {
        JsonPath(format!("{}.{}", self.0, name))
    }

    /// Arbitrary map keys are quoted so that dots or brackets stay readable.
    fn key(&self, name: &str) -> Self {
        let quoted = serde_json::to_string(name).unwrap_or_else(|_| format!("\"{}\"", name));
        JsonPath(format!("{}[{}]", self.0, quoted))
    }

    fn index(&self, i: usize) -> Self {
        JsonPath(format!("{}[{}]", self.0, i))
    }

    fn mismatch(&self, expected: &'static str, actual: impl fmt::Display) -> DecodeError {
        DecodeError {
            path: self.0.clone(),
            expected,
            actual: actual.to_string(),
        }
    }
}

/// Validate `raw` against the store shape.
pub fn decode(raw: &Value) -> Result<Store, DecodeError> {
    let root = JsonPath::root();
    let object = as_object(raw, &root)?;

    let mut resolvers = IndexMap::with_capacity(object.len());
    for (name, value) in object {
        let record = decode_resolver(value, &root.key(name))?;
        resolvers.insert(name.clone(), record);
    }
    Ok(Store { resolvers })
}

fn decode_resolver(value: &Value, path: &JsonPath) -> Result<ResolverRecord, DecodeError> {
    let object = as_object(value, path)?;

    let (account, account_path) = required(object, "Account", path, "object")?;
    let account = decode_account(account, &account_path)?;

    let (certificates, certs_path) = required(object, "Certificates", path, "array")?;
    let certificates = as_array(certificates, &certs_path)?
        .iter()
        .enumerate()
        .map(|(i, cert)| decode_certificate(cert, &certs_path.index(i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResolverRecord {
        account,
        certificates,
    })
}

fn decode_account(value: &Value, path: &JsonPath) -> Result<Account, DecodeError> {
    let object = as_object(value, path)?;

    let email = required_string(object, "Email", path)?;

    let (registration, reg_path) = required(object, "Registration", path, "object")?;
    let registration = as_object(registration, &reg_path)?;
    let (body, body_path) = required(registration, "body", &reg_path, "object")?;
    let body = as_object(body, &body_path)?;
    let status = required_string(body, "status", &body_path)?;
    let (contact, contact_path) = required(body, "contact", &body_path, "array of strings")?;
    let contact = string_array(contact, &contact_path)?;
    let uri = required_string(registration, "uri", &reg_path)?;

    let private_key = required_string(object, "PrivateKey", path)?;
    let key_type = required_string(object, "KeyType", path)?;

    Ok(Account {
        email,
        registration: Registration {
            body: RegistrationBody { status, contact },
            uri,
        },
        private_key,
        key_type,
    })
}

fn decode_certificate(value: &Value, path: &JsonPath) -> Result<CertificateEntry, DecodeError> {
    let object = as_object(value, path)?;

    let (domain, domain_path) = required(object, "domain", path, "object")?;
    let domain = as_object(domain, &domain_path)?;
    let main = required_string(domain, "main", &domain_path)?;
    if main.is_empty() {
        return Err(domain_path.field("main").mismatch("non-empty string", "empty string"));
    }
    // Only an absent key means "no SANs"; null is a type error.
    let sans = match domain.get("sans") {
        None => None,
        Some(sans) => Some(string_array(sans, &domain_path.field("sans"))?),
    };

    let certificate = required_string(object, "certificate", path)?;
    let key = required_string(object, "key", path)?;
    let store = required_string(object, "Store", path)?;

    Ok(CertificateEntry {
        domain: Domain { main, sans },
        certificate,
        key,
        store,
    })
}

fn required<'a>(
    object: &'a Map<String, Value>,
    name: &str,
    parent: &JsonPath,
    expected: &'static str,
) -> Result<(&'a Value, JsonPath), DecodeError> {
    let path = parent.field(name);
    match object.get(name) {
        Some(value) => Ok((value, path)),
        None => Err(path.mismatch(expected, "missing")),
    }
}

fn required_string(
    object: &Map<String, Value>,
    name: &str,
    parent: &JsonPath,
) -> Result<String, DecodeError> {
    let (value, path) = required(object, name, parent, "string")?;
    as_string(value, &path)
}

fn string_array(value: &Value, path: &JsonPath) -> Result<Vec<String>, DecodeError> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(path.mismatch("array of strings", json_type(other))),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| as_string(item, &path.index(i)))
        .collect()
}

fn as_object<'a>(
    value: &'a Value,
    path: &JsonPath,
) -> Result<&'a Map<String, Value>, DecodeError> {
    value
        .as_object()
        .ok_or_else(|| path.mismatch("object", json_type(value)))
}

fn as_array<'a>(value: &'a Value, path: &JsonPath) -> Result<&'a Vec<Value>, DecodeError> {
    value
        .as_array()
        .ok_or_else(|| path.mismatch("array", json_type(value)))
}

fn as_string(value: &Value, path: &JsonPath) -> Result<String, DecodeError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| path.mismatch("string", json_type(value)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
