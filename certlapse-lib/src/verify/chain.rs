//! Certificate chain building via DFS path finding.
//!
//! Given a leaf certificate, a pool of untrusted intermediates, and a pool of
//! roots, enumerates every cycle-free signing path from the leaf to a root
//! using depth-first search with backtracking. Validity dates play no part in
//! deciding whether a certificate may issue another.

use super::{Chain, VerifyError};
use crate::fields::Certificate;
use crate::pool::CertPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Upper bound on candidate issuer evaluations in one [`build_chains`] call.
///
/// A pool of certificates that share a subject and key can all sign each
/// other, which makes the number of simple paths grow factorially. Once the
/// budget is spent the search stops and returns whatever chains it already
/// found.
pub const MAX_ISSUER_CHECKS: usize = 100;

/// Enumerate every chain from `leaf` to a certificate in `roots`.
///
/// A candidate issuer is accepted when its subject matches the current
/// certificate's issuer, it is marked as a CA, its pathLenConstraint allows
/// the intermediates already below it, and its key verifies the current
/// certificate's signature. A certificate never appears twice in one chain,
/// and no chain grows beyond `max_depth` certificates. At most
/// [`MAX_ISSUER_CHECKS`] candidates are evaluated, and each signature is
/// verified at most once.
///
/// If `roots` already contains `leaf`, the only chain is `[leaf]`.
pub fn build_chains(
    leaf: &Arc<Certificate>,
    intermediates: &CertPool,
    roots: &CertPool,
    max_depth: usize,
) -> Result<Vec<Chain>, VerifyError> {
    if roots.contains(leaf) {
        debug!(subject = %leaf.subject, "leaf is itself a trusted root");
        return Ok(vec![vec![Arc::clone(leaf)]]);
    }

    let mut search = Search {
        intermediates,
        roots,
        max_depth,
        checks_left: MAX_ISSUER_CHECKS,
        exhausted: false,
        signatures: HashMap::new(),
        chains: Vec::new(),
    };
    let mut path = vec![Arc::clone(leaf)];
    search.extend_path(&mut path);

    if search.exhausted {
        warn!(
            subject = %leaf.subject,
            budget = MAX_ISSUER_CHECKS,
            chains = search.chains.len(),
            "chain search stopped after exhausting its issuer check budget"
        );
    }

    if search.chains.is_empty() {
        return Err(VerifyError::NoPathFound {
            issuer: leaf.issuer.to_oneline(),
        });
    }

    debug!(
        subject = %leaf.subject,
        chains = search.chains.len(),
        "built candidate chains"
    );
    Ok(search.chains)
}

/// State of one DFS over the candidate issuer graph.
struct Search<'a> {
    intermediates: &'a CertPool,
    roots: &'a CertPool,
    max_depth: usize,
    checks_left: usize,
    exhausted: bool,
    /// Signature outcomes keyed by (child DER, issuer DER).
    signatures: HashMap<(Vec<u8>, Vec<u8>), bool>,
    chains: Vec<Chain>,
}

impl Search<'_> {
    /// `path` is the chain under construction, leaf first; every complete
    /// chain found below it is pushed onto `self.chains`.
    fn extend_path(&mut self, path: &mut Chain) {
        let Some(current) = path.last().cloned() else {
            return;
        };
        if path.len() >= self.max_depth {
            trace!(depth = path.len(), "depth limit reached");
            return;
        }

        for candidate in candidate_issuers(&current, self.intermediates, self.roots) {
            if path.iter().any(|c| c.raw == candidate.raw) {
                continue;
            }
            if self.checks_left == 0 {
                self.exhausted = true;
                return;
            }
            self.checks_left -= 1;

            if let Err(reason) = self.check_issuer(&current, &candidate, path.len() - 1) {
                trace!(
                    child = %current.subject,
                    candidate = %candidate.subject,
                    %reason,
                    "rejected candidate issuer"
                );
                continue;
            }

            path.push(Arc::clone(&candidate));
            if self.roots.contains(&candidate) {
                self.chains.push(path.clone());
            } else {
                self.extend_path(path);
            }
            path.pop();
        }
    }

    /// Decide whether `issuer` may sign `child` with `intermediates_below`
    /// non-leaf certificates already between the leaf and `issuer`.
    fn check_issuer(
        &mut self,
        child: &Certificate,
        issuer: &Certificate,
        intermediates_below: usize,
    ) -> Result<(), String> {
        if !issuer.is_ca() {
            return Err("not a CA".into());
        }
        if let Some(max) = issuer.basic_constraints.and_then(|bc| bc.max_path_len) {
            if intermediates_below > max as usize {
                return Err(format!(
                    "path length constraint violated (pathlen={}, intermediates below={})",
                    max, intermediates_below
                ));
            }
        }

        let key = (child.raw.clone(), issuer.raw.clone());
        if let Some(&verified) = self.signatures.get(&key) {
            return if verified {
                Ok(())
            } else {
                Err("signature mismatch (cached)".into())
            };
        }
        let outcome = child.check_signature_from(issuer);
        self.signatures.insert(key, outcome.is_ok());
        outcome.map_err(|e| e.to_string())
    }
}

/// Certificates from either pool whose subject matches `cert`'s issuer.
/// Roots come first; a certificate present in both pools is listed once.
fn candidate_issuers(
    cert: &Certificate,
    intermediates: &CertPool,
    roots: &CertPool,
) -> Vec<Arc<Certificate>> {
    let mut candidates = roots.find_potential_parents(cert);
    for parent in intermediates.find_potential_parents(cert) {
        if !candidates.iter().any(|c| c.raw == parent.raw) {
            candidates.push(parent);
        }
    }
    candidates
}
