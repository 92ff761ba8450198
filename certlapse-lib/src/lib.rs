//! certlapse-lib: X.509 chain verification that ignores certificate expiry.
//!
//! Builds every signing path from a leaf certificate to a trusted root,
//! filters the paths by extended key usage, and checks the requested hostname,
//! exactly as a conventional verifier would, except that NotBefore/NotAfter
//! are never consulted. This is meant for certificate rotation windows, where
//! a freshly installed certificate must be confirmed trustworthy even though
//! the wall clock and its validity window briefly disagree.

mod fields;
mod fingerprint;
mod oid;
mod parser;
mod pool;
mod report;
mod util;
pub mod verify;

pub use fields::{BasicConstraints, Certificate, DateTime, DistinguishedName, ExtKeyUsage};
pub use fingerprint::sha256_fingerprint;
pub use parser::parse_pem_chain;
pub use pool::CertPool;
pub use report::{ChainCertInfo, VerificationReport};
pub use verify::{
    build_chains, filter_by_usage, find_system_ca_bundle, load_system_roots, match_hostname,
    resolve_purpose, system_roots, verify, verify_peer_chain, Chain, RootsCache,
    RootsLoader, RootsResult, VerifyError, VerifyOptions, MAX_ISSUER_CHECKS,
};

/// Errors returned by certlapse-lib.
#[derive(Debug, thiserror::Error)]
pub enum CertlapseError {
    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("Signature verification failed: {0}")]
    SignatureError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}
