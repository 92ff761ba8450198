//! Certificate chain verification that never consults validity dates.
//!
//! [`verify`] performs path validation the way a TLS client would (signature
//! chain to a trusted root, basic constraints, path length, extended key
//! usage, hostname) but ignores NotBefore/NotAfter entirely. It exists to
//! confirm that a certificate installed during a rotation is structurally
//! trustworthy even while its validity window and the wall clock disagree.
//!
//! Roots come from [`VerifyOptions::roots`] or, when none are given, from the
//! process-wide system store cache ([`system_roots`]).

mod chain;
mod hostname;
mod system_roots;
mod usage;

use crate::fields::{Certificate, ExtKeyUsage};
use crate::pool::CertPool;
use crate::CertlapseError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub use chain::{build_chains, MAX_ISSUER_CHECKS};
pub use hostname::match_hostname;
pub use system_roots::{
    find_system_ca_bundle, load_system_roots, system_roots, RootsCache, RootsLoader, RootsResult,
};
pub use usage::filter_by_usage;

/// A verified certificate chain, leaf first, ending at a trusted root.
pub type Chain = Vec<Arc<Certificate>>;

/// Why a certificate failed verification.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The certificate carries no raw DER bytes, so no signature can be checked.
    #[error("certificate is missing its DER encoding; parse it with Certificate::from_der")]
    NotParsed,

    /// No roots were supplied and the system trust store could not be loaded.
    #[error("failed to load system roots and no roots provided: {source}")]
    SystemRootsUnavailable { source: Arc<CertlapseError> },

    /// No cycle-free signing path leads from the leaf to a trusted root.
    #[error("unable to find a chain to a trusted root for issuer: {issuer}")]
    NoPathFound { issuer: String },

    /// Chains to a trusted root exist, but none permits the requested usages.
    #[error(
        "certificate specifies an incompatible key usage (requested: {})",
        join(.requested)
    )]
    IncompatibleUsage { requested: Vec<ExtKeyUsage> },

    /// The requested name is not covered by the leaf certificate.
    #[error("hostname '{hostname}' does not match certificate names: [{}]", join(.names))]
    HostnameMismatch { hostname: String, names: Vec<String> },
}

impl VerifyError {
    /// Stable machine-readable identifier for this failure.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::NotParsed => "not_parsed",
            VerifyError::SystemRootsUnavailable { .. } => "system_roots_unavailable",
            VerifyError::NoPathFound { .. } => "no_path_found",
            VerifyError::IncompatibleUsage { .. } => "incompatible_usage",
            VerifyError::HostnameMismatch { .. } => "hostname_mismatch",
        }
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Options controlling verification.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Name to check against the leaf's SAN entries. Empty skips the check.
    pub dns_name: String,
    /// Untrusted certificates usable as path-building material.
    pub intermediates: CertPool,
    /// Trust anchors. `None` uses the system trust store.
    pub roots: Option<Arc<CertPool>>,
    /// Acceptable extended key usages. Empty means server authentication.
    pub key_usages: Vec<ExtKeyUsage>,
}

impl Certificate {
    /// Verify this certificate. See [`verify`].
    pub fn verify(&self, options: &VerifyOptions) -> Result<Vec<Chain>, VerifyError> {
        verify(self, options)
    }
}

/// Verify `leaf` and return every chain that survives all checks.
///
/// Checks run in this order, stopping at the first failure:
/// 1. the leaf must have been parsed from DER ([`VerifyError::NotParsed`]);
/// 2. roots are resolved from `options.roots` or the system store
///    ([`VerifyError::SystemRootsUnavailable`]);
/// 3. all chains to a root are built ([`VerifyError::NoPathFound`]);
/// 4. chains are filtered by key usage ([`VerifyError::IncompatibleUsage`]);
/// 5. if `options.dns_name` is set, it must match the leaf
///    ([`VerifyError::HostnameMismatch`]).
///
/// NotBefore/NotAfter are never checked. Certificates outside their
/// validity window are only logged.
pub fn verify(leaf: &Certificate, options: &VerifyOptions) -> Result<Vec<Chain>, VerifyError> {
    if leaf.raw.is_empty() {
        return Err(VerifyError::NotParsed);
    }

    let roots = match &options.roots {
        Some(roots) => Arc::clone(roots),
        None => system_roots().map_err(|source| VerifyError::SystemRootsUnavailable { source })?,
    };

    let leaf = Arc::new(leaf.clone());
    let max_depth = options.intermediates.len() + roots.len() + 1;
    let candidates = build_chains(&leaf, &options.intermediates, &roots, max_depth)?;

    let chains = filter_by_usage(candidates, &options.key_usages);
    if chains.is_empty() {
        return Err(VerifyError::IncompatibleUsage {
            requested: usage::effective_usages(&options.key_usages),
        });
    }

    if !options.dns_name.is_empty() {
        match_hostname(&leaf, &options.dns_name)?;
    }

    log_validity_window(&chains);
    debug!(subject = %leaf.subject, chains = chains.len(), "verification succeeded");
    Ok(chains)
}

/// Verify a peer chain as presented in a TLS handshake.
///
/// The first element is the leaf and the rest are treated as intermediates;
/// `server_name` is the hostname the connection was made to.
pub fn verify_peer_chain<C: AsRef<[u8]>>(
    peer_chain: &[C],
    server_name: &str,
    roots: Option<Arc<CertPool>>,
) -> Result<Vec<Chain>, CertlapseError> {
    let (leaf_der, rest) = peer_chain
        .split_first()
        .ok_or_else(|| CertlapseError::ParseError("empty peer certificate chain".into()))?;

    let leaf = Certificate::from_der(leaf_der.as_ref())?;
    let mut intermediates = CertPool::new();
    for der in rest {
        intermediates.add_der(der.as_ref())?;
    }

    let options = VerifyOptions {
        dns_name: server_name.to_string(),
        intermediates,
        roots,
        key_usages: Vec::new(),
    };
    Ok(verify(&leaf, &options)?)
}

/// Resolve a named purpose string to an Extended Key Usage.
///
/// Accepts OpenSSL's `-purpose` names or a dotted-decimal OID.
pub fn resolve_purpose(name: &str) -> Option<ExtKeyUsage> {
    match name {
        "sslserver" => Some(ExtKeyUsage::ServerAuth),
        "sslclient" => Some(ExtKeyUsage::ClientAuth),
        "smimesign" | "smimeencrypt" => Some(ExtKeyUsage::EmailProtection),
        "codesign" => Some(ExtKeyUsage::CodeSigning),
        "timestampsign" => Some(ExtKeyUsage::TimeStamping),
        "ocsphelper" => Some(ExtKeyUsage::OcspSigning),
        "any" => Some(ExtKeyUsage::Any),
        oid if is_dotted_oid(oid) => Some(ExtKeyUsage::from_oid(oid)),
        _ => None,
    }
}

fn is_dotted_oid(s: &str) -> bool {
    let mut arcs = 0;
    for arc in s.split('.') {
        if arc.is_empty() || !arc.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        arcs += 1;
    }
    arcs >= 2
}

/// Warn about accepted certificates whose validity window excludes now.
fn log_validity_window(chains: &[Chain]) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    let mut seen = HashSet::new();
    for cert in chains.iter().flatten() {
        if seen.insert(&cert.raw) && !cert.is_within_validity(now) {
            warn!(
                subject = %cert.subject,
                not_before = %cert.not_before,
                not_after = %cert.not_after,
                "accepted certificate outside its validity window"
            );
        }
    }
}
