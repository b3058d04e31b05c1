//! Selecting certificate entries out of a decoded store.

use crate::store::{CertificateEntry, ResolverRecord, Store};

/// The store contains no resolver records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("store contains no certificate resolvers")]
pub struct EmptyStoreError;

/// No resolver record is stored under the requested name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no certificate resolver named '{name}'")]
pub struct UnknownResolverError {
    pub name: String,
}

/// Certificates of the first resolver record, in the order they are stored.
///
/// "First" is document order: resolver keys keep the order in which they
/// appear in the store file.
pub fn list_certificates(store: &Store) -> Result<&[CertificateEntry], EmptyStoreError> {
    let (name, resolver) = store.resolvers.first().ok_or(EmptyStoreError)?;
    if store.len() > 1 {
        tracing::debug!(
            resolver = %name,
            resolvers = store.len(),
            "store has several resolvers, using the first"
        );
    }
    Ok(&resolver.certificates)
}

/// Certificates of the resolver stored under `name`.
pub fn list_certificates_in<'a>(
    store: &'a Store,
    name: &str,
) -> Result<&'a [CertificateEntry], UnknownResolverError> {
    store
        .resolvers
        .get(name)
        .map(|resolver: &ResolverRecord| resolver.certificates.as_slice())
        .ok_or_else(|| UnknownResolverError { name: name.into() })
}

/// Resolver names in document order.
pub fn resolver_names(store: &Store) -> impl Iterator<Item = &str> {
    store.resolvers.keys().map(String::as_str)
}

/// First certificate whose primary domain equals `domain` exactly.
///
/// A miss is `Ok(None)`; only an empty store is an error.
pub fn find_certificate<'a>(
    store: &'a Store,
    domain: &str,
) -> Result<Option<&'a CertificateEntry>, EmptyStoreError> {
    Ok(list_certificates(store)?
        .iter()
        .find(|entry| entry.domain.main == domain))
}
