//! acmex-lib: Library for reading ACME certificate stores and inspecting the
//! certificates they hold.
//!
//! The pipeline is: load the store JSON ([`read_store`] / [`parse_store`]),
//! validate its shape ([`decode`]), pick entries ([`list_certificates`],
//! [`find_certificate`]), recover PEM text ([`extract_chain_pem`],
//! [`extract_key_pem`]) and, on demand, inspect the chain ([`inspect`]).
//! Every step is a pure function of its input; nothing is cached.

mod accessor;
mod decoder;
mod display;
mod fields;
mod fingerprint;
mod humanize;
mod load;
mod oid;
mod parser;
mod pem;
mod store;
mod util;

pub use accessor::{
    find_certificate, list_certificates, list_certificates_in, resolver_names, EmptyStoreError,
    UnknownResolverError,
};
pub use decoder::{decode, DecodeError};
pub use display::{display_chain, display_text, to_json};
pub use fields::{
    AiaEntry, CertificateInfo, DateTime, DigestAlgorithm, DistinguishedName, Extension,
    ExtensionValue, KeyUsage, PublicKeyInfo, SubjectAltNames, Validity,
};
pub use fingerprint::compute_fingerprint;
pub use humanize::relative_time;
pub use load::{parse_store, read_store, LoadError, MAX_STORE_BYTES};
pub use parser::{inspect, inspect_now, parse_der, MalformedCertificateError};
pub use pem::{extract_chain_pem, extract_key_pem, AttachmentKind, InvalidEncodingError};
pub use store::{
    Account, CertificateEntry, Domain, Registration, RegistrationBody, ResolverRecord, Store,
};

/// Any error produced by acmex-lib.
///
/// Library functions return the specific error type for their step; this
/// enum lets callers that chain several steps propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AcmexError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    EmptyStore(#[from] EmptyStoreError),

    #[error(transparent)]
    UnknownResolver(#[from] UnknownResolverError),

    #[error(transparent)]
    InvalidEncoding(#[from] InvalidEncodingError),

    #[error(transparent)]
    MalformedCertificate(#[from] MalformedCertificateError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
