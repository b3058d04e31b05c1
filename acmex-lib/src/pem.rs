//! Recovering PEM text from the base64 payloads of a certificate entry.
//!
//! The store keeps each PEM document base64-encoded as a whole. Decoding
//! yields the original text byte for byte, line breaks included, which is
//! what gets handed out as downloadable material.

use crate::store::CertificateEntry;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::Serialize;
use std::fmt;

/// Standard alphabet; trailing `=` padding is optional.
const STORE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Which payload of a certificate entry to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// The full certificate chain, leaf first.
    Fullchain,
    /// The certificate's private key.
    Key,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 2] = [AttachmentKind::Fullchain, AttachmentKind::Key];

    /// Lower-case name used in file names and URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            AttachmentKind::Fullchain => "fullchain",
            AttachmentKind::Key => "key",
        }
    }

    /// Parse a kind name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    /// Extract this kind of payload from `entry`.
    pub fn extract(self, entry: &CertificateEntry) -> Result<String, InvalidEncodingError> {
        match self {
            AttachmentKind::Fullchain => extract_chain_pem(entry),
            AttachmentKind::Key => extract_key_pem(entry),
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload field is not valid base64, or does not decode to UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("corrupt '{field}' field for {domain}: {reason}")]
pub struct InvalidEncodingError {
    /// Primary domain of the entry.
    pub domain: String,
    /// Store field name: `certificate` or `key`.
    pub field: &'static str,
    pub reason: String,
}

/// Decode the certificate chain of `entry` into PEM text.
pub fn extract_chain_pem(entry: &CertificateEntry) -> Result<String, InvalidEncodingError> {
    decode_field(entry, "certificate", &entry.certificate)
}

/// Decode the private key of `entry` into PEM text.
pub fn extract_key_pem(entry: &CertificateEntry) -> Result<String, InvalidEncodingError> {
    decode_field(entry, "key", &entry.key)
}

fn decode_field(
    entry: &CertificateEntry,
    field: &'static str,
    encoded: &str,
) -> Result<String, InvalidEncodingError> {
    let corrupt = |reason: String| InvalidEncodingError {
        domain: entry.domain.main.clone(),
        field,
        reason,
    };

    let bytes = STORE_BASE64
        .decode(encoded.trim())
        .map_err(|e| corrupt(format!("invalid base64: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| corrupt(format!("not UTF-8 text: {}", e)))
}
