//! In-memory model of an ACME resolver store.
//!
//! The store file maps a resolver name (usually a single key such as
//! `"letsencrypt"`) to the account and certificates that resolver manages.
//! Values are produced only by [`crate::decode`]; nothing here mutates them.

use indexmap::IndexMap;
use serde::Serialize;

/// A decoded ACME store: resolver name to resolver record, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Store {
    pub resolvers: IndexMap<String, ResolverRecord>,
}

impl Store {
    /// Number of resolver records in the store.
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

/// One resolver: the ACME account and the certificates issued to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResolverRecord {
    pub account: Account,
    pub certificates: Vec<CertificateEntry>,
}

/// ACME account registration. Carried through, never used for extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    pub email: String,
    pub registration: Registration,
    /// Base64 account key. Not serialized so it never leaks into listings.
    #[serde(skip)]
    pub private_key: String,
    pub key_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub body: RegistrationBody,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationBody {
    pub status: String,
    pub contact: Vec<String>,
}

/// A certificate managed by a resolver.
///
/// `certificate` and `key` hold base64 text exactly as stored; they are
/// only decoded on demand by [`crate::extract_chain_pem`] and
/// [`crate::extract_key_pem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateEntry {
    pub domain: Domain,
    #[serde(skip)]
    pub certificate: String,
    #[serde(skip)]
    pub key: String,
    #[serde(rename = "Store")]
    pub store: String,
}

/// Identity of a certificate entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Domain {
    pub main: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sans: Option<Vec<String>>,
}

impl Domain {
    /// SANs as a slice, empty when the field was absent.
    pub fn sans(&self) -> &[String] {
        self.sans.as_deref().unwrap_or_default()
    }
}
