//! X.509 inspection of PEM certificate chains.

use crate::fields::{
    AiaEntry, CertificateInfo, DateTime, DigestAlgorithm, DistinguishedName, Extension,
    ExtensionValue, KeyUsage, PublicKeyInfo, SubjectAltNames, Validity,
};
use crate::humanize::relative_time;
use crate::oid;
use crate::util;
use ::time::OffsetDateTime;
use x509_parser::pem::Pem;
use x509_parser::prelude::*;

const SECONDS_PER_DAY: i64 = 86_400;

/// A PEM block could not be decoded as an X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed certificate #{index} in chain: {reason}")]
pub struct MalformedCertificateError {
    /// Zero-based position of the block in the PEM text.
    pub index: usize,
    pub reason: String,
}

/// Inspect every certificate of a PEM chain, in the order they appear.
///
/// Relative dates are rendered against `now`. Empty (or whitespace-only)
/// input yields an empty list. Any other text must consist of readable
/// CERTIFICATE blocks: the first block that fails to decode, or text with
/// no block at all, aborts the whole call.
pub fn inspect(
    pem_text: &str,
    now: OffsetDateTime,
) -> Result<Vec<CertificateInfo>, MalformedCertificateError> {
    if pem_text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut certs = Vec::new();
    for (index, block) in Pem::iter_from_buffer(pem_text.as_bytes()).enumerate() {
        let malformed = |reason: String| MalformedCertificateError { index, reason };

        let pem = block.map_err(|e| malformed(format!("invalid PEM block: {}", e)))?;
        if pem.label != "CERTIFICATE" {
            return Err(malformed(format!("expected CERTIFICATE, got {}", pem.label)));
        }
        let cert = parse_der_at(&pem.contents, index, now).map_err(|e| {
            tracing::warn!(index, error = %e.reason, "certificate in chain failed to parse");
            e
        })?;
        certs.push(cert);
    }

    // The PEM reader skips anything it cannot frame, so compare against the
    // BEGIN lines actually present to refuse partial chains.
    let markers = count_begin_markers(pem_text);
    if markers == 0 {
        return Err(MalformedCertificateError {
            index: 0,
            reason: "no PEM block found".to_string(),
        });
    }
    if certs.len() != markers {
        return Err(MalformedCertificateError {
            index: certs.len(),
            reason: format!(
                "unreadable PEM block ({} BEGIN lines, {} blocks decoded)",
                markers,
                certs.len()
            ),
        });
    }
    Ok(certs)
}

fn count_begin_markers(text: &str) -> usize {
    text.lines()
        .filter(|line| line.trim_start().starts_with("-----BEGIN "))
        .count()
}

/// [`inspect`] anchored to the current wall-clock time.
pub fn inspect_now(pem_text: &str) -> Result<Vec<CertificateInfo>, MalformedCertificateError> {
    inspect(pem_text, OffsetDateTime::now_utc())
}

/// Inspect a single DER-encoded certificate.
pub fn parse_der(
    input: &[u8],
    now: OffsetDateTime,
) -> Result<CertificateInfo, MalformedCertificateError> {
    parse_der_at(input, 0, now)
}

fn parse_der_at(
    input: &[u8],
    index: usize,
    now: OffsetDateTime,
) -> Result<CertificateInfo, MalformedCertificateError> {
    let (remaining, x509) =
        X509Certificate::from_der(input).map_err(|e| MalformedCertificateError {
            index,
            reason: format!("invalid DER: {}", e),
        })?;

    // Fingerprints cover the certificate bytes only, not trailing data.
    let cert_len = input.len() - remaining.len();
    let cert_der = input.get(..cert_len).unwrap_or(input);
    build_certificate_info(&x509, cert_der, now).map_err(|reason| MalformedCertificateError {
        index,
        reason,
    })
}

/// Facts gathered from the extensions while building their typed list.
#[derive(Default)]
struct ExtensionSummary {
    key_usage: KeyUsage,
    ext_key_usage: Vec<String>,
    sans: SubjectAltNames,
    is_ca: bool,
    basic_constraints_valid: bool,
    max_path_len: Option<u32>,
    subject_key_id: Option<String>,
    authority_key_id: Option<String>,
    ocsp_servers: Vec<String>,
    issuing_certificate_urls: Vec<String>,
}

fn build_certificate_info(
    x509: &X509Certificate,
    raw_der: &[u8],
    now: OffsetDateTime,
) -> Result<CertificateInfo, String> {
    let tbs = &x509.tbs_certificate;

    let raw_version = tbs.version.0;
    if raw_version > 2 {
        return Err(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            raw_version + 1
        ));
    }

    let now_ts = now.unix_timestamp();
    let not_before = build_datetime(&tbs.validity.not_before, now_ts);
    let not_after = build_datetime(&tbs.validity.not_after, now_ts);
    let validity = Validity {
        days_remaining: (not_after.timestamp - now_ts).div_euclid(SECONDS_PER_DAY),
        is_expired: now_ts > not_after.timestamp,
        not_before,
        not_after,
    };

    let mut summary = ExtensionSummary::default();
    let extensions = tbs
        .extensions()
        .iter()
        .map(|ext| build_extension(ext, &mut summary))
        .collect();

    Ok(CertificateInfo {
        version: raw_version + 1,
        serial: format_serial(tbs.raw_serial()),
        signature_algorithm: format_sig_algorithm(&x509.signature_algorithm),
        signature_hex: hex::encode(&*x509.signature_value.data),
        issuer: build_dn(&tbs.issuer),
        subject: build_dn(&tbs.subject),
        validity,
        public_key: build_public_key_info(&tbs.subject_pki),
        key_usage: summary.key_usage,
        ext_key_usage: summary.ext_key_usage,
        sans: summary.sans,
        is_ca: summary.is_ca,
        basic_constraints_valid: summary.basic_constraints_valid,
        max_path_len: summary.max_path_len,
        subject_key_id: summary.subject_key_id,
        authority_key_id: summary.authority_key_id,
        ocsp_servers: summary.ocsp_servers,
        issuing_certificate_urls: summary.issuing_certificate_urls,
        fingerprint_sha256: crate::compute_fingerprint(raw_der, DigestAlgorithm::Sha256),
        fingerprint_sha1: crate::compute_fingerprint(raw_der, DigestAlgorithm::Sha1),
        extensions,
        raw_der: raw_der.to_vec(),
    })
}

/// Format a serial number as a colon-separated uppercase hex string,
/// stripping leading zero bytes but keeping at least one byte.
fn format_serial(raw: &[u8]) -> String {
    let stripped = match raw.iter().position(|&b| b != 0) {
        Some(pos) => raw.get(pos..).unwrap_or(raw),
        None => raw.get(raw.len().saturating_sub(1)..).unwrap_or(raw),
    };
    util::hex_colon_upper(stripped)
}

fn format_sig_algorithm(algo: &AlgorithmIdentifier) -> String {
    match algo.algorithm.to_id_string().as_str() {
        oid::SHA1_WITH_RSA => "sha1WithRSAEncryption".into(),
        oid::SHA256_WITH_RSA => "sha256WithRSAEncryption".into(),
        oid::SHA384_WITH_RSA => "sha384WithRSAEncryption".into(),
        oid::SHA512_WITH_RSA => "sha512WithRSAEncryption".into(),
        oid::RSASSA_PSS => "rsassaPss".into(),
        oid::ECDSA_WITH_SHA256 => "ecdsa-with-SHA256".into(),
        oid::ECDSA_WITH_SHA384 => "ecdsa-with-SHA384".into(),
        oid::ECDSA_WITH_SHA512 => "ecdsa-with-SHA512".into(),
        oid::ED25519 => "Ed25519".into(),
        oid::ED448 => "Ed448".into(),
        other => other.to_string(),
    }
}

fn build_dn(name: &X509Name) -> DistinguishedName {
    let mut components = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let key = util::oid_short_name(&attr.attr_type().to_id_string());
            let value = attr.as_str().unwrap_or("<binary>").to_string();
            components.push((key, value));
        }
    }
    DistinguishedName::from_components(components)
}

fn build_datetime(asn1_time: &ASN1Time, now_ts: i64) -> DateTime {
    let ts = asn1_time.timestamp();
    let iso = match OffsetDateTime::from_unix_timestamp(ts) {
        Ok(dt) => format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        ),
        Err(_) => format!("{}", ts),
    };
    DateTime {
        iso8601: iso,
        timestamp: ts,
        relative: relative_time(ts, now_ts),
    }
}

fn build_public_key_info(spki: &SubjectPublicKeyInfo) -> PublicKeyInfo {
    let oid_str = spki.algorithm.algorithm.to_id_string();

    let (algorithm, key_size, curve) = match oid_str.as_str() {
        oid::RSA_ENCRYPTION => (
            "RSA".into(),
            rsa_modulus_bits(&spki.subject_public_key.data),
            None,
        ),
        oid::EC_PUBLIC_KEY => {
            let curve_name = extract_ec_curve(&spki.algorithm);
            let key_size = match curve_name.as_str() {
                "P-256" => Some(256),
                "P-384" => Some(384),
                "P-521" => Some(521),
                _ => None,
            };
            ("EC".into(), key_size, Some(curve_name))
        }
        oid::ED25519 => ("Ed25519".into(), Some(256), None),
        oid::ED448 => ("Ed448".into(), Some(448), None),
        _ => (oid_str, None, None),
    };

    PublicKeyInfo {
        algorithm,
        key_size,
        curve,
    }
}

/// Bit length of the RSA modulus, `None` if the key DER does not parse.
fn rsa_modulus_bits(data: &[u8]) -> Option<u32> {
    let (_, parsed) = x509_parser::der_parser::parse_der(data).ok()?;
    let seq = parsed.as_sequence().ok()?;
    let bigint = seq.first().and_then(|m| m.as_bigint().ok())?;
    let bytes = bigint.to_bytes_be().1;
    // Skip leading zero byte used for DER positive integer encoding
    let significant = match bytes.split_first() {
        Some((&0, rest)) if !rest.is_empty() => rest,
        _ => &bytes,
    };
    Some((significant.len() as u32) * 8)
}

fn extract_ec_curve(algo: &AlgorithmIdentifier) -> String {
    if let Some(params) = &algo.parameters {
        if let Ok(oid) = params.as_oid() {
            return match oid.to_id_string().as_str() {
                oid::CURVE_P256 => "P-256".into(),
                oid::CURVE_P384 => "P-384".into(),
                oid::CURVE_P521 => "P-521".into(),
                other => other.to_string(),
            };
        }
    }
    "unknown".into()
}

fn build_extension(ext: &X509Extension, summary: &mut ExtensionSummary) -> Extension {
    let oid = ext.oid.to_id_string();
    let name = extension_oid_to_name(&oid);

    let value = match ext.parsed_extension() {
        ParsedExtension::BasicConstraints(bc) => {
            summary.basic_constraints_valid = true;
            summary.is_ca = bc.ca;
            summary.max_path_len = bc.path_len_constraint;
            ExtensionValue::BasicConstraints {
                ca: bc.ca,
                path_len: bc.path_len_constraint,
            }
        }
        ParsedExtension::KeyUsage(ku) => {
            summary.key_usage = KeyUsage {
                digital_signature: ku.digital_signature(),
                content_commitment: ku.non_repudiation(),
                key_encipherment: ku.key_encipherment(),
                data_encipherment: ku.data_encipherment(),
                key_agreement: ku.key_agreement(),
                cert_sign: ku.key_cert_sign(),
                crl_sign: ku.crl_sign(),
                encipher_only: ku.encipher_only(),
                decipher_only: ku.decipher_only(),
            };
            ExtensionValue::KeyUsage(
                summary
                    .key_usage
                    .labels()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            )
        }
        ParsedExtension::ExtendedKeyUsage(eku) => {
            let mut usages: Vec<String> = [
                (eku.any, "Any Extended Key Usage"),
                (eku.server_auth, "TLS Web Server Authentication"),
                (eku.client_auth, "TLS Web Client Authentication"),
                (eku.code_signing, "Code Signing"),
                (eku.email_protection, "E-mail Protection"),
                (eku.time_stamping, "Time Stamping"),
                (eku.ocsp_signing, "OCSP Signing"),
            ]
            .into_iter()
            .filter_map(|(set, label)| set.then(|| label.to_string()))
            .collect();
            usages.extend(eku.other.iter().map(|oid| oid.to_id_string()));
            summary.ext_key_usage = usages.clone();
            ExtensionValue::ExtendedKeyUsage(usages)
        }
        ParsedExtension::SubjectAlternativeName(san) => {
            let mut entries = Vec::new();
            for gn in &san.general_names {
                match gn {
                    GeneralName::DNSName(name) => summary.sans.dns_names.push(name.to_string()),
                    GeneralName::RFC822Name(email) => {
                        summary.sans.email_addresses.push(email.to_string())
                    }
                    GeneralName::IPAddress(bytes) => {
                        summary.sans.ip_addresses.push(util::format_ip_bytes(bytes))
                    }
                    GeneralName::URI(uri) => summary.sans.uris.push(uri.to_string()),
                    _ => {}
                }
                entries.push(format_general_name(gn));
            }
            ExtensionValue::SubjectAltName(entries)
        }
        ParsedExtension::SubjectKeyIdentifier(ski) => {
            let id = util::hex_colon_upper(ski.0);
            summary.subject_key_id = Some(id.clone());
            ExtensionValue::SubjectKeyIdentifier(id)
        }
        ParsedExtension::AuthorityKeyIdentifier(aki) => {
            let key_id = aki
                .key_identifier
                .as_ref()
                .map(|ki| util::hex_colon_upper(ki.0));
            summary.authority_key_id = key_id.clone();
            ExtensionValue::AuthorityKeyIdentifier(key_id)
        }
        ParsedExtension::AuthorityInfoAccess(aia) => {
            let mut entries = Vec::new();
            for desc in &aia.accessdescs {
                let location = access_location(&desc.access_location);
                let method = match desc.access_method.to_id_string().as_str() {
                    oid::ACCESS_OCSP => {
                        summary.ocsp_servers.push(location.clone());
                        "OCSP".to_string()
                    }
                    oid::ACCESS_CA_ISSUERS => {
                        summary.issuing_certificate_urls.push(location.clone());
                        "CA Issuers".to_string()
                    }
                    other => other.to_string(),
                };
                entries.push(AiaEntry { method, location });
            }
            ExtensionValue::AuthorityInfoAccess(entries)
        }
        ParsedExtension::CRLDistributionPoints(cdp) => {
            let mut uris = Vec::new();
            for point in &cdp.points {
                if let Some(x509_parser::extensions::DistributionPointName::FullName(names)) =
                    &point.distribution_point
                {
                    for gn in names {
                        if let GeneralName::URI(uri) = gn {
                            uris.push(uri.to_string());
                        }
                    }
                }
            }
            ExtensionValue::CrlDistributionPoints(uris)
        }
        ParsedExtension::CertificatePolicies(policies) => ExtensionValue::CertificatePolicies(
            policies
                .iter()
                .map(|p| policy_oid_to_name(&p.policy_id.to_id_string()))
                .collect(),
        ),
        _ => ExtensionValue::Raw(hex::encode(ext.value)),
    };

    Extension {
        oid,
        name,
        critical: ext.critical,
        value,
    }
}

fn extension_oid_to_name(oid_str: &str) -> String {
    match oid_str {
        oid::EXT_SUBJECT_KEY_ID => "Subject Key Identifier".into(),
        oid::EXT_KEY_USAGE => "Key Usage".into(),
        oid::EXT_SUBJECT_ALT_NAME => "Subject Alternative Name".into(),
        oid::EXT_BASIC_CONSTRAINTS => "Basic Constraints".into(),
        oid::EXT_CRL_DISTRIBUTION_POINTS => "CRL Distribution Points".into(),
        oid::EXT_CERTIFICATE_POLICIES => "Certificate Policies".into(),
        oid::EXT_AUTHORITY_KEY_ID => "Authority Key Identifier".into(),
        oid::EXT_EXTENDED_KEY_USAGE => "Extended Key Usage".into(),
        oid::EXT_AUTHORITY_INFO_ACCESS => "Authority Information Access".into(),
        oid::EXT_TLS_FEATURE => "TLS Feature".into(),
        oid::EXT_SCT_LIST => "CT Precertificate SCTs".into(),
        oid::EXT_CT_POISON => "CT Precertificate Poison".into(),
        other => other.to_string(),
    }
}

fn policy_oid_to_name(oid_str: &str) -> String {
    match oid_str {
        oid::POLICY_DOMAIN_VALIDATED => "Domain Validated".into(),
        oid::POLICY_ORGANIZATION_VALIDATED => "Organization Validated".into(),
        other => other.to_string(),
    }
}

fn format_general_name(gn: &GeneralName) -> String {
    match gn {
        GeneralName::DNSName(name) => format!("DNS:{}", name),
        GeneralName::RFC822Name(email) => format!("email:{}", email),
        GeneralName::IPAddress(bytes) => format!("IP:{}", util::format_ip_bytes(bytes)),
        GeneralName::URI(uri) => format!("URI:{}", uri),
        GeneralName::DirectoryName(dn) => format!("DirName:{}", build_dn(dn)),
        other => format!("{:?}", other),
    }
}

/// AIA locations are nearly always URIs; those are shown bare.
fn access_location(gn: &GeneralName) -> String {
    match gn {
        GeneralName::URI(uri) => uri.to_string(),
        other => format_general_name(other),
    }
}
