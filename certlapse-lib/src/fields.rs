//! Certificate data types.

use crate::oid;
use crate::CertlapseError;
use serde::Serialize;
use std::net::IpAddr;
use x509_parser::prelude::*;

/// A parsed X.509 certificate reduced to the fields path validation needs.
///
/// Values are normally produced by [`Certificate::from_der`] or
/// [`Certificate::from_pem`]. The fields are public so a caller can also build
/// one by hand; such a value has no `raw` bytes and is rejected by the
/// verifier with [`crate::VerifyError::NotParsed`].
///
/// Two certificates are equal when their raw DER encodings are equal.
#[derive(Debug, Clone, Default)]
pub struct Certificate {
    /// Certificate version (1, 2, or 3).
    pub version: u32,
    /// Serial number as colon-separated hex.
    pub serial: String,
    /// Subject distinguished name.
    pub subject: DistinguishedName,
    /// Issuer distinguished name.
    pub issuer: DistinguishedName,
    /// DER encoding of the subject name, used for issuer lookup.
    pub raw_subject: Vec<u8>,
    /// DER encoding of the issuer name.
    pub raw_issuer: Vec<u8>,
    /// DER encoding of the whole signed certificate.
    pub raw: Vec<u8>,
    /// DER-encoded SubjectPublicKeyInfo.
    pub public_key: Vec<u8>,
    /// Signature algorithm OID as dotted decimal.
    pub signature_algorithm: String,
    /// BasicConstraints extension, `None` when absent.
    pub basic_constraints: Option<BasicConstraints>,
    /// Extended Key Usage values. Empty means unconstrained.
    pub ext_key_usage: Vec<ExtKeyUsage>,
    /// DNS names from the Subject Alternative Name extension.
    pub dns_names: Vec<String>,
    /// IP addresses from the Subject Alternative Name extension.
    pub ip_addresses: Vec<IpAddr>,
    /// Validity start. Reported, never enforced.
    pub not_before: DateTime,
    /// Validity end. Reported, never enforced.
    pub not_after: DateTime,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Certificate {}

impl std::hash::Hash for Certificate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Certificate {
    /// Whether the BasicConstraints extension marks this certificate as a CA.
    pub fn is_ca(&self) -> bool {
        self.basic_constraints.is_some_and(|bc| bc.is_ca)
    }

    /// Check if the certificate is self-issued (subject == issuer).
    pub fn is_self_issued(&self) -> bool {
        self.raw_subject == self.raw_issuer
    }

    /// Whether `now` (Unix seconds) lies inside NotBefore..=NotAfter.
    ///
    /// Only used for diagnostics; chain verification never calls this.
    pub fn is_within_validity(&self, now: i64) -> bool {
        self.not_before.timestamp <= now && now <= self.not_after.timestamp
    }

    /// Verify that `parent`'s public key produced this certificate's signature.
    pub fn check_signature_from(&self, parent: &Certificate) -> Result<(), CertlapseError> {
        let (_, child) = X509Certificate::from_der(&self.raw)
            .map_err(|e| CertlapseError::DerError(format!("{}", e)))?;
        let (_, spki) = SubjectPublicKeyInfo::from_der(&parent.public_key)
            .map_err(|e| CertlapseError::DerError(format!("issuer public key: {}", e)))?;
        child
            .verify_signature(Some(&spki))
            .map_err(|e| CertlapseError::SignatureError(format!("{}", e)))
    }

    /// Short human-readable identifier: CN, then O, then OU, else "Unknown".
    pub fn short_name(&self) -> String {
        ["CN", "O", "OU"]
            .iter()
            .find_map(|key| self.subject.get(key))
            .map(str::to_string)
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// The BasicConstraints extension (RFC 5280 Section 4.2.1.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BasicConstraints {
    /// cA flag.
    pub is_ca: bool,
    /// pathLenConstraint: the maximum number of non-leaf certificates that
    /// may follow this one in a chain.
    pub max_path_len: Option<u32>,
}

/// An Extended Key Usage purpose.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ExtKeyUsage {
    /// anyExtendedKeyUsage: compatible with every purpose.
    Any,
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
    /// Any other purpose, by dotted-decimal OID.
    Other(String),
}

impl ExtKeyUsage {
    /// Map a dotted-decimal OID to a usage.
    pub fn from_oid(oid_str: &str) -> Self {
        match oid_str {
            oid::EKU_ANY => ExtKeyUsage::Any,
            oid::EKU_SERVER_AUTH => ExtKeyUsage::ServerAuth,
            oid::EKU_CLIENT_AUTH => ExtKeyUsage::ClientAuth,
            oid::EKU_CODE_SIGNING => ExtKeyUsage::CodeSigning,
            oid::EKU_EMAIL_PROTECTION => ExtKeyUsage::EmailProtection,
            oid::EKU_TIME_STAMPING => ExtKeyUsage::TimeStamping,
            oid::EKU_OCSP_SIGNING => ExtKeyUsage::OcspSigning,
            other => ExtKeyUsage::Other(other.to_string()),
        }
    }

    /// The dotted-decimal OID of this usage.
    pub fn oid(&self) -> &str {
        match self {
            ExtKeyUsage::Any => oid::EKU_ANY,
            ExtKeyUsage::ServerAuth => oid::EKU_SERVER_AUTH,
            ExtKeyUsage::ClientAuth => oid::EKU_CLIENT_AUTH,
            ExtKeyUsage::CodeSigning => oid::EKU_CODE_SIGNING,
            ExtKeyUsage::EmailProtection => oid::EKU_EMAIL_PROTECTION,
            ExtKeyUsage::TimeStamping => oid::EKU_TIME_STAMPING,
            ExtKeyUsage::OcspSigning => oid::EKU_OCSP_SIGNING,
            ExtKeyUsage::Other(oid_str) => oid_str,
        }
    }
}

impl std::fmt::Display for ExtKeyUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtKeyUsage::Any => write!(f, "Any Extended Key Usage"),
            ExtKeyUsage::ServerAuth => write!(f, "TLS Web Server Authentication"),
            ExtKeyUsage::ClientAuth => write!(f, "TLS Web Client Authentication"),
            ExtKeyUsage::CodeSigning => write!(f, "Code Signing"),
            ExtKeyUsage::EmailProtection => write!(f, "E-mail Protection"),
            ExtKeyUsage::TimeStamping => write!(f, "Time Stamping"),
            ExtKeyUsage::OcspSigning => write!(f, "OCSP Signing"),
            ExtKeyUsage::Other(oid_str) => write!(f, "{}", oid_str),
        }
    }
}

/// Distinguished name with ordered components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistinguishedName {
    /// Ordered list of (attribute_type, value) pairs.
    /// Attribute types use short names where known (e.g., "CN", "O", "C").
    pub components: Vec<(String, String)>,
}

impl DistinguishedName {
    /// Format as a comma-separated one-line string matching OpenSSL's default format.
    /// Example: "C = US, O = Org, CN = example.com"
    ///
    /// Values containing commas, equals signs, or backslashes are escaped
    /// to prevent ambiguous output.
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

    /// First value for the given short attribute name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_oneline())
    }
}

/// A point in time taken from a certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateTime {
    /// ISO 8601 formatted string.
    pub iso8601: String,
    /// Unix timestamp.
    pub timestamp: i64,
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.iso8601)
    }
}
