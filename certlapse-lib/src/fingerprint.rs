//! Certificate fingerprint (digest) computation.

use crate::util;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 fingerprint of DER-encoded certificate bytes.
///
/// Returns a colon-separated uppercase hex string (e.g., "AB:CD:EF:...").
pub fn sha256_fingerprint(der_bytes: &[u8]) -> String {
    util::hex_colon_upper(&Sha256::digest(der_bytes))
}
