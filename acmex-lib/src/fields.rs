//! Certificate records produced by inspection.

use serde::Serialize;

/// Digest algorithm for fingerprint computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha1,
}

/// One certificate of an inspected chain, flattened for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateInfo {
    /// Certificate version (1, 2, or 3).
    pub version: u32,
    /// Serial number as a colon-separated hex string.
    pub serial: String,
    /// Signature algorithm name.
    pub signature_algorithm: String,
    /// Raw signature bytes (hex-encoded).
    pub signature_hex: String,
    pub issuer: DistinguishedName,
    pub subject: DistinguishedName,
    pub validity: Validity,
    pub public_key: PublicKeyInfo,
    /// Key Usage flags; all false when the extension is absent.
    pub key_usage: KeyUsage,
    /// Extended Key Usage labels.
    pub ext_key_usage: Vec<String>,
    pub sans: SubjectAltNames,
    pub is_ca: bool,
    /// Whether a Basic Constraints extension was present.
    pub basic_constraints_valid: bool,
    pub max_path_len: Option<u32>,
    pub subject_key_id: Option<String>,
    pub authority_key_id: Option<String>,
    /// OCSP responder URLs from Authority Information Access.
    pub ocsp_servers: Vec<String>,
    /// CA Issuers URLs from Authority Information Access.
    pub issuing_certificate_urls: Vec<String>,
    pub fingerprint_sha256: String,
    pub fingerprint_sha1: String,
    /// Every extension in certificate order.
    pub extensions: Vec<Extension>,

    /// Raw DER bytes of the certificate.
    #[serde(skip)]
    pub raw_der: Vec<u8>,
}

impl CertificateInfo {
    /// Return the subject as a one-line string.
    pub fn subject_string(&self) -> String {
        self.subject.to_oneline()
    }

    /// Return the issuer as a one-line string.
    pub fn issuer_string(&self) -> String {
        self.issuer.to_oneline()
    }

    /// Subject and issuer are the same name (a root, or a self-signed leaf).
    pub fn is_self_issued(&self) -> bool {
        self.subject.components == self.issuer.components
    }
}

/// Distinguished name with ordered components.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DistinguishedName {
    pub common_name: Option<String>,
    pub organization: Vec<String>,
    pub country: Vec<String>,
    /// Ordered list of (attribute_type, value) pairs.
    /// Attribute types use short names where known (e.g., "CN", "O", "C").
    pub components: Vec<(String, String)>,
}

impl DistinguishedName {
    /// Build from ordered components, picking out CN, O and C.
    pub fn from_components(components: Vec<(String, String)>) -> Self {
        let values = |attr: &str| -> Vec<String> {
            components
                .iter()
                .filter(|(k, _)| k == attr)
                .map(|(_, v)| v.clone())
                .collect()
        };
        // The most specific CN is conventionally the last one.
        let common_name = values("CN").pop();
        let organization = values("O");
        let country = values("C");
        DistinguishedName {
            common_name,
            organization,
            country,
            components,
        }
    }

    /// Format as a comma-separated one-line string matching OpenSSL's default format.
    /// Example: "C = US, O = Org, CN = example.com"
    ///
    /// Values containing commas, equals signs, or backslashes are escaped.
    pub fn to_oneline(&self) -> String {
        let mut result = String::new();
        for (i, (k, v)) in self.components.iter().enumerate() {
            if i > 0 {
                result.push_str(", ");
            }
            result.push_str(k);
            result.push_str(" = ");
            for ch in v.chars() {
                match ch {
                    '\\' => result.push_str("\\\\"),
                    ',' => result.push_str("\\,"),
                    '=' => result.push_str("\\="),
                    _ => result.push(ch),
                }
            }
        }
        result
    }
}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_oneline())
    }
}

/// Validity window, rendered against the inspection reference time.
#[derive(Debug, Clone, Serialize)]
pub struct Validity {
    pub not_before: DateTime,
    pub not_after: DateTime,
    /// Whole days from the reference time to notAfter; negative once expired.
    pub days_remaining: i64,
    pub is_expired: bool,
}

/// Date-time representation.
#[derive(Debug, Clone, Serialize)]
pub struct DateTime {
    /// ISO 8601 formatted string.
    pub iso8601: String,
    /// Unix timestamp.
    pub timestamp: i64,
    /// Relative to the reference time, e.g. "in 3 months".
    pub relative: String,
}

impl DateTime {
    /// Format in OpenSSL's default date style: `Feb  3 23:57:06 2026 GMT`.
    pub fn to_openssl(&self) -> String {
        match ::time::OffsetDateTime::from_unix_timestamp(self.timestamp) {
            Ok(dt) => {
                let month = match u8::from(dt.month()) {
                    1 => "Jan",
                    2 => "Feb",
                    3 => "Mar",
                    4 => "Apr",
                    5 => "May",
                    6 => "Jun",
                    7 => "Jul",
                    8 => "Aug",
                    9 => "Sep",
                    10 => "Oct",
                    11 => "Nov",
                    12 => "Dec",
                    _ => "???",
                };
                format!(
                    "{} {:2} {:02}:{:02}:{:02} {} GMT",
                    month,
                    dt.day(),
                    dt.hour(),
                    dt.minute(),
                    dt.second(),
                    dt.year()
                )
            }
            Err(_) => self.iso8601.clone(),
        }
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.to_openssl(), self.relative)
    }
}

/// Public key summary.
#[derive(Debug, Clone, Serialize)]
pub struct PublicKeyInfo {
    /// Algorithm name: "RSA", "EC", "Ed25519", etc.
    pub algorithm: String,
    /// Key size in bits (e.g., 2048 for RSA, 256 for P-256).
    pub key_size: Option<u32>,
    /// Named curve for EC keys (e.g., "P-256", "P-384").
    pub curve: Option<String>,
}

/// Key Usage bits (RFC 5280 section 4.2.1.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyUsage {
    pub digital_signature: bool,
    pub content_commitment: bool,
    pub key_encipherment: bool,
    pub data_encipherment: bool,
    pub key_agreement: bool,
    pub cert_sign: bool,
    pub crl_sign: bool,
    pub encipher_only: bool,
    pub decipher_only: bool,
}

impl KeyUsage {
    /// Names of the bits that are set, in bit order.
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.digital_signature, "Digital Signature"),
            (self.content_commitment, "Non Repudiation"),
            (self.key_encipherment, "Key Encipherment"),
            (self.data_encipherment, "Data Encipherment"),
            (self.key_agreement, "Key Agreement"),
            (self.cert_sign, "Certificate Sign"),
            (self.crl_sign, "CRL Sign"),
            (self.encipher_only, "Encipher Only"),
            (self.decipher_only, "Decipher Only"),
        ]
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.labels().is_empty()
    }
}

/// Subject Alternative Names grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectAltNames {
    pub dns_names: Vec<String>,
    pub email_addresses: Vec<String>,
    pub ip_addresses: Vec<String>,
    pub uris: Vec<String>,
}

impl SubjectAltNames {
    pub fn is_empty(&self) -> bool {
        self.dns_names.is_empty()
            && self.email_addresses.is_empty()
            && self.ip_addresses.is_empty()
            && self.uris.is_empty()
    }
}

/// A certificate extension.
#[derive(Debug, Clone, Serialize)]
pub struct Extension {
    /// OID as a dotted-decimal string.
    pub oid: String,
    /// Human-readable name (or OID string if unknown).
    pub name: String,
    /// Whether this extension is marked critical.
    pub critical: bool,
    /// Parsed extension value.
    pub value: ExtensionValue,
}

/// Strongly-typed extension values.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum ExtensionValue {
    BasicConstraints {
        ca: bool,
        path_len: Option<u32>,
    },
    KeyUsage(Vec<String>),
    ExtendedKeyUsage(Vec<String>),
    SubjectAltName(Vec<String>),
    SubjectKeyIdentifier(String),
    AuthorityKeyIdentifier(Option<String>),
    AuthorityInfoAccess(Vec<AiaEntry>),
    CrlDistributionPoints(Vec<String>),
    CertificatePolicies(Vec<String>),
    /// Fallback for extensions we don't parse into a specific variant.
    Raw(String),
}

/// Authority Information Access entry.
#[derive(Debug, Clone, Serialize)]
pub struct AiaEntry {
    /// Access method: "OCSP" or "CA Issuers".
    pub method: String,
    /// Access location (usually a URI).
    pub location: String,
}
