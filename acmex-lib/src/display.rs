//! Human-readable and JSON formatting of inspected certificates.

use crate::fields::{AiaEntry, CertificateInfo, Extension, ExtensionValue};
use crate::AcmexError;

/// Format one certificate as human-readable text.
///
/// If `show_all` is true, includes the signature bytes and every extension.
pub fn display_text(cert: &CertificateInfo, show_all: bool) -> String {
    let mut out = String::new();

    out.push_str("Certificate:\n");
    out.push_str(&format!("  Version: {} (v{})\n", cert.version, cert.version));
    out.push_str(&format!("  Serial: {}\n", cert.serial));
    out.push_str(&format!("  Signature Algorithm: {}\n", cert.signature_algorithm));
    out.push_str(&format!("  Issuer: {}", cert.issuer_string()));
    if cert.is_self_issued() {
        out.push_str(" (self-issued)");
    }
    out.push('\n');
    out.push_str("  Validity:\n");
    out.push_str(&format!("    Not Before: {}\n", cert.validity.not_before));
    out.push_str(&format!("    Not After:  {}\n", cert.validity.not_after));
    if cert.validity.is_expired {
        out.push_str("    Status: EXPIRED\n");
    } else {
        out.push_str(&format!(
            "    Status: valid, {} day(s) remaining\n",
            cert.validity.days_remaining
        ));
    }
    out.push_str(&format!("  Subject: {}\n", cert.subject_string()));

    out.push_str("  Public Key:\n");
    out.push_str(&format!("    Algorithm: {}", cert.public_key.algorithm));
    if let Some(bits) = cert.public_key.key_size {
        out.push_str(&format!(" ({} bit)", bits));
    }
    if let Some(curve) = &cert.public_key.curve {
        out.push_str(&format!(" [{}]", curve));
    }
    out.push('\n');

    out.push_str(&format!(
        "  CA: {}{}\n",
        cert.is_ca,
        match cert.max_path_len {
            Some(n) => format!(", pathlen:{}", n),
            None => String::new(),
        }
    ));
    if !cert.key_usage.is_empty() {
        out.push_str(&format!(
            "  Key Usage: {}\n",
            cert.key_usage.labels().join(", ")
        ));
    }
    if !cert.ext_key_usage.is_empty() {
        out.push_str(&format!(
            "  Extended Key Usage: {}\n",
            cert.ext_key_usage.join(", ")
        ));
    }

    if !cert.sans.is_empty() {
        out.push_str("  Subject Alternative Names:\n");
        for name in &cert.sans.dns_names {
            out.push_str(&format!("    DNS: {}\n", name));
        }
        for email in &cert.sans.email_addresses {
            out.push_str(&format!("    Email: {}\n", email));
        }
        for ip in &cert.sans.ip_addresses {
            out.push_str(&format!("    IP: {}\n", ip));
        }
        for uri in &cert.sans.uris {
            out.push_str(&format!("    URI: {}\n", uri));
        }
    }

    if let Some(ski) = &cert.subject_key_id {
        out.push_str(&format!("  Subject Key Identifier: {}\n", ski));
    }
    if let Some(aki) = &cert.authority_key_id {
        out.push_str(&format!("  Authority Key Identifier: {}\n", aki));
    }
    for url in &cert.ocsp_servers {
        out.push_str(&format!("  OCSP: {}\n", url));
    }
    for url in &cert.issuing_certificate_urls {
        out.push_str(&format!("  CA Issuers: {}\n", url));
    }

    if show_all && !cert.extensions.is_empty() {
        out.push_str("  Extensions:\n");
        for ext in &cert.extensions {
            format_extension(&mut out, ext);
        }
    }

    out.push_str(&format!("  Fingerprint (SHA-256): {}\n", cert.fingerprint_sha256));

    if show_all && !cert.signature_hex.is_empty() {
        out.push_str(&format!(
            "  Signature: {}...\n",
            cert.signature_hex.get(..40).unwrap_or(&cert.signature_hex)
        ));
    }

    out
}

/// Format a whole chain, numbering certificates from the leaf.
pub fn display_chain(certs: &[CertificateInfo], show_all: bool) -> String {
    certs
        .iter()
        .enumerate()
        .map(|(depth, cert)| format!("[{}] {}", depth, display_text(cert, show_all)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_extension(out: &mut String, ext: &Extension) {
    let critical_str = if ext.critical { " [critical]" } else { "" };
    out.push_str(&format!("    {}{}:", ext.name, critical_str));

    match &ext.value {
        ExtensionValue::BasicConstraints { ca, path_len } => {
            out.push_str(&format!(" CA={}", ca));
            if let Some(n) = path_len {
                out.push_str(&format!(", pathlen:{}", n));
            }
            out.push('\n');
        }
        ExtensionValue::KeyUsage(values)
        | ExtensionValue::ExtendedKeyUsage(values)
        | ExtensionValue::SubjectAltName(values)
        | ExtensionValue::CertificatePolicies(values) => {
            out.push_str(&format!(" {}\n", values.join(", ")));
        }
        ExtensionValue::SubjectKeyIdentifier(hex) => {
            out.push_str(&format!(" {}\n", hex));
        }
        ExtensionValue::AuthorityKeyIdentifier(key_id) => match key_id {
            Some(kid) => out.push_str(&format!(" keyid:{}\n", kid)),
            None => out.push('\n'),
        },
        ExtensionValue::AuthorityInfoAccess(entries) => {
            out.push('\n');
            for AiaEntry { method, location } in entries {
                out.push_str(&format!("      {}: {}\n", method, location));
            }
        }
        ExtensionValue::CrlDistributionPoints(uris) => {
            out.push('\n');
            for uri in uris {
                out.push_str(&format!("      {}\n", uri));
            }
        }
        ExtensionValue::Raw(hex) => {
            if hex.len() <= 40 {
                out.push_str(&format!(" {}\n", hex));
            } else {
                out.push_str(&format!(" {}...\n", hex.get(..40).unwrap_or(hex)));
            }
        }
    }
}

/// Serialize inspected certificates to a pretty-printed JSON array.
pub fn to_json(certs: &[CertificateInfo]) -> Result<String, AcmexError> {
    serde_json::to_string_pretty(certs).map_err(AcmexError::Json)
}
