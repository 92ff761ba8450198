//! Certificate parsing from PEM and DER formats.

use crate::fields::{BasicConstraints, Certificate, DateTime, DistinguishedName, ExtKeyUsage};
use crate::util;
use crate::CertlapseError;
use std::net::IpAddr;
use x509_parser::prelude::*;

impl Certificate {
    /// Parse a certificate from PEM or DER (auto-detected).
    ///
    /// If the input begins with `-----BEGIN` (after stripping whitespace), it is
    /// treated as PEM. Otherwise it is treated as DER.
    pub fn parse(input: &[u8]) -> Result<Self, CertlapseError> {
        if input.is_empty() {
            return Err(CertlapseError::ParseError("empty input".into()));
        }
        if util::is_pem(input) {
            Self::from_pem(input)
        } else {
            Self::from_der(input)
        }
    }

    /// Parse the first certificate of a PEM document.
    pub fn from_pem(input: &[u8]) -> Result<Self, CertlapseError> {
        let (_, pem) = x509_parser::pem::parse_x509_pem(input)
            .map_err(|e| CertlapseError::PemError(format!("{}", e)))?;

        if !is_certificate_label(&pem.label) {
            return Err(CertlapseError::PemError(format!(
                "expected CERTIFICATE, got {}",
                pem.label
            )));
        }

        Self::from_der(&pem.contents)
    }

    /// Parse a certificate from DER format.
    pub fn from_der(input: &[u8]) -> Result<Self, CertlapseError> {
        let (remaining, x509) = X509Certificate::from_der(input)
            .map_err(|e| CertlapseError::DerError(format!("{}", e)))?;

        // Keep only the certificate itself, not trailing data, so that
        // signature checks and pool membership use the exact encoding.
        let cert_len = input.len() - remaining.len();
        let raw = input.get(..cert_len).unwrap_or(input);
        build_certificate(&x509, raw)
    }
}

/// Parse a PEM-encoded file containing one or more certificates into
/// individual DER-encoded certificates.
pub fn parse_pem_chain(input: &[u8]) -> Result<Vec<Vec<u8>>, CertlapseError> {
    let mut certs = Vec::new();

    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if is_certificate_label(&pem.label) {
                    certs.push(pem.contents);
                }
            }
            Err(e) => {
                // Trailing garbage after valid blocks is tolerated.
                if !certs.is_empty() {
                    break;
                }
                return Err(CertlapseError::PemError(format!(
                    "failed to parse PEM: {}",
                    e
                )));
            }
        }
    }

    if certs.is_empty() {
        return Err(CertlapseError::PemError(
            "no certificates found in PEM input".into(),
        ));
    }

    Ok(certs)
}

fn is_certificate_label(label: &str) -> bool {
    matches!(
        label,
        "CERTIFICATE" | "TRUSTED CERTIFICATE" | "X509 CERTIFICATE"
    )
}

fn build_certificate(x509: &X509Certificate, raw: &[u8]) -> Result<Certificate, CertlapseError> {
    let tbs = &x509.tbs_certificate;

    let raw_version = tbs.version.0;
    if raw_version > 2 {
        return Err(CertlapseError::ParseError(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            raw_version + 1
        )));
    }

    let basic_constraints = x509
        .basic_constraints()
        .map_err(|e| CertlapseError::ParseError(format!("basic constraints: {}", e)))?
        .map(|ext| BasicConstraints {
            is_ca: ext.value.ca,
            max_path_len: ext.value.path_len_constraint,
        });

    let ext_key_usage = match x509
        .extended_key_usage()
        .map_err(|e| CertlapseError::ParseError(format!("extended key usage: {}", e)))?
    {
        Some(ext) => collect_ext_key_usage(ext.value),
        None => Vec::new(),
    };

    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();
    if let Some(san) = x509
        .subject_alternative_name()
        .map_err(|e| CertlapseError::ParseError(format!("subject alternative name: {}", e)))?
    {
        for gn in &san.value.general_names {
            match gn {
                GeneralName::DNSName(name) => dns_names.push(name.to_string()),
                GeneralName::IPAddress(bytes) => {
                    if let Some(ip) = ip_from_bytes(bytes) {
                        ip_addresses.push(ip);
                    }
                }
                _ => {}
            }
        }
    }

    Ok(Certificate {
        version: raw_version + 1,
        serial: util::hex_colon_upper(tbs.raw_serial()),
        subject: build_dn(&tbs.subject),
        issuer: build_dn(&tbs.issuer),
        raw_subject: tbs.subject.as_raw().to_vec(),
        raw_issuer: tbs.issuer.as_raw().to_vec(),
        raw: raw.to_vec(),
        public_key: tbs.subject_pki.raw.to_vec(),
        signature_algorithm: x509.signature_algorithm.algorithm.to_id_string(),
        basic_constraints,
        ext_key_usage,
        dns_names,
        ip_addresses,
        not_before: build_datetime(&tbs.validity.not_before),
        not_after: build_datetime(&tbs.validity.not_after),
    })
}

fn collect_ext_key_usage(eku: &x509_parser::extensions::ExtendedKeyUsage) -> Vec<ExtKeyUsage> {
    let mut usages = Vec::new();
    if eku.any {
        usages.push(ExtKeyUsage::Any);
    }
    if eku.server_auth {
        usages.push(ExtKeyUsage::ServerAuth);
    }
    if eku.client_auth {
        usages.push(ExtKeyUsage::ClientAuth);
    }
    if eku.code_signing {
        usages.push(ExtKeyUsage::CodeSigning);
    }
    if eku.email_protection {
        usages.push(ExtKeyUsage::EmailProtection);
    }
    if eku.time_stamping {
        usages.push(ExtKeyUsage::TimeStamping);
    }
    if eku.ocsp_signing {
        usages.push(ExtKeyUsage::OcspSigning);
    }
    usages.extend(
        eku.other
            .iter()
            .map(|oid| ExtKeyUsage::from_oid(&oid.to_id_string())),
    );
    usages
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from),
        _ => None,
    }
}

pub(crate) fn build_dn(name: &X509Name) -> DistinguishedName {
    let mut components = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let key = util::oid_short_name(&attr.attr_type().to_id_string());
            let value = attr.as_str().unwrap_or("<binary>").to_string();
            components.push((key, value));
        }
    }
    DistinguishedName { components }
}

fn build_datetime(asn1_time: &ASN1Time) -> DateTime {
    let ts = asn1_time.timestamp();
    let iso = match ::time::OffsetDateTime::from_unix_timestamp(ts) {
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
    }
}
