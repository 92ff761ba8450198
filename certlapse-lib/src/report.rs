//! Serializable summaries of a verification outcome.

use crate::fields::Certificate;
use crate::fingerprint::sha256_fingerprint;
use crate::verify::{Chain, VerifyError};
use serde::Serialize;

/// Result of verifying one leaf certificate.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    /// Whether at least one chain survived every check.
    pub is_valid: bool,
    /// The certificate that was verified.
    pub leaf: ChainCertInfo,
    /// Every accepted chain, leaf to root.
    pub chains: Vec<Vec<ChainCertInfo>>,
    /// Failure description (absent when `is_valid` is true).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable failure identifier, see [`VerifyError::kind`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl VerificationReport {
    /// Summarize `outcome` for `leaf`, flagging certificates whose validity
    /// window excludes `now` (Unix seconds).
    pub fn new(leaf: &Certificate, outcome: &Result<Vec<Chain>, VerifyError>, now: i64) -> Self {
        let leaf_info = ChainCertInfo::new(0, leaf, now);
        match outcome {
            Ok(chains) => VerificationReport {
                is_valid: !chains.is_empty(),
                leaf: leaf_info,
                chains: chains
                    .iter()
                    .map(|chain| {
                        chain
                            .iter()
                            .enumerate()
                            .map(|(depth, cert)| ChainCertInfo::new(depth, cert, now))
                            .collect()
                    })
                    .collect(),
                error: None,
                error_kind: None,
            },
            Err(e) => VerificationReport {
                is_valid: false,
                leaf: leaf_info,
                chains: Vec::new(),
                error: Some(e.to_string()),
                error_kind: Some(e.kind()),
            },
        }
    }

    /// Whether any certificate in an accepted chain is outside its validity window.
    pub fn has_lapsed_certificates(&self) -> bool {
        self.chains.iter().flatten().any(|c| c.outside_validity)
    }
}

impl std::fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [short_name], [serial], [OK/FAIL], [optional reason]
        write!(f, "{}, {}, ", self.leaf.short_name, self.leaf.serial)?;
        if self.is_valid {
            write!(f, "OK")?;
            if self.has_lapsed_certificates() {
                write!(f, " (outside validity window, ignored)")?;
            }
        } else {
            write!(f, "FAIL")?;
            if let Some(error) = &self.error {
                write!(f, ", {}", error)?;
            }
        }
        Ok(())
    }
}

/// Information about a certificate in a verified chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainCertInfo {
    /// Position in chain (0 = leaf).
    pub depth: usize,
    /// Subject distinguished name.
    pub subject: String,
    /// Issuer distinguished name.
    pub issuer: String,
    /// Short human-readable name derived from CN, O, or OU.
    pub short_name: String,
    /// Serial number as colon-separated hex.
    pub serial: String,
    /// Validity start (ISO 8601).
    pub not_before: String,
    /// Validity end (ISO 8601).
    pub not_after: String,
    /// True when the report time falls outside the validity window.
    pub outside_validity: bool,
    /// SHA-256 fingerprint of the DER encoding.
    pub fingerprint: String,
}

impl ChainCertInfo {
    fn new(depth: usize, cert: &Certificate, now: i64) -> Self {
        ChainCertInfo {
            depth,
            subject: cert.subject.to_oneline(),
            issuer: cert.issuer.to_oneline(),
            short_name: cert.short_name(),
            serial: cert.serial.clone(),
            not_before: cert.not_before.iso8601.clone(),
            not_after: cert.not_after.iso8601.clone(),
            outside_validity: !cert.is_within_validity(now),
            fingerprint: sha256_fingerprint(&cert.raw),
        }
    }
}
