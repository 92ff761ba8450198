//! Extended Key Usage filtering of candidate chains.

use super::Chain;
use crate::fields::{Certificate, ExtKeyUsage};
use std::sync::Arc;

/// Keep the chains that permit at least one of the `requested` usages.
///
/// An empty request means server authentication. Requesting
/// [`ExtKeyUsage::Any`] accepts every chain. Otherwise each chain is walked
/// from the root toward the leaf, crossing out requested usages that a
/// certificate's EKU list does not include. Certificates without an EKU
/// list, or whose list contains anyExtendedKeyUsage, constrain nothing.
/// A chain whose working set empties is dropped.
pub fn filter_by_usage(chains: Vec<Chain>, requested: &[ExtKeyUsage]) -> Vec<Chain> {
    let requested = effective_usages(requested);
    if requested.contains(&ExtKeyUsage::Any) {
        return chains;
    }
    chains
        .into_iter()
        .filter(|chain| chain_permits_usages(chain, &requested))
        .collect()
}

/// The usages actually checked for a request.
pub(crate) fn effective_usages(requested: &[ExtKeyUsage]) -> Vec<ExtKeyUsage> {
    if requested.is_empty() {
        vec![ExtKeyUsage::ServerAuth]
    } else {
        requested.to_vec()
    }
}

fn chain_permits_usages(chain: &[Arc<Certificate>], requested: &[ExtKeyUsage]) -> bool {
    if chain.is_empty() {
        return false;
    }

    let mut remaining: Vec<&ExtKeyUsage> = requested.iter().collect();
    for cert in chain.iter().rev() {
        let declared = &cert.ext_key_usage;
        if declared.is_empty() || declared.contains(&ExtKeyUsage::Any) {
            continue;
        }
        remaining.retain(|usage| declared.contains(usage));
        if remaining.is_empty() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert_with(usages: &[ExtKeyUsage]) -> Arc<Certificate> {
        Arc::new(Certificate {
            raw: vec![usages.len() as u8],
            ext_key_usage: usages.to_vec(),
            ..Default::default()
        })
    }

    #[test]
    fn empty_request_means_server_auth() {
        assert_eq!(effective_usages(&[]), vec![ExtKeyUsage::ServerAuth]);
        assert_eq!(
            effective_usages(&[ExtKeyUsage::ClientAuth]),
            vec![ExtKeyUsage::ClientAuth]
        );
    }

    #[test]
    fn unconstrained_chain_permits_everything() {
        let chain = vec![cert_with(&[]), cert_with(&[])];
        assert!(chain_permits_usages(&chain, &[ExtKeyUsage::CodeSigning]));
    }

    #[test]
    fn intermediate_restriction_removes_usage() {
        let chain = vec![
            cert_with(&[ExtKeyUsage::ServerAuth]),
            cert_with(&[ExtKeyUsage::ClientAuth]),
            cert_with(&[]),
        ];
        assert!(!chain_permits_usages(&chain, &[ExtKeyUsage::ServerAuth]));
    }

    #[test]
    fn one_surviving_usage_is_enough() {
        let chain = vec![
            cert_with(&[ExtKeyUsage::ClientAuth]),
            cert_with(&[ExtKeyUsage::ServerAuth, ExtKeyUsage::ClientAuth]),
        ];
        assert!(chain_permits_usages(
            &chain,
            &[ExtKeyUsage::ServerAuth, ExtKeyUsage::ClientAuth]
        ));
    }

    #[test]
    fn any_usage_certificate_constrains_nothing() {
        let chain = vec![
            cert_with(&[ExtKeyUsage::Any]),
            cert_with(&[ExtKeyUsage::Any, ExtKeyUsage::ClientAuth]),
        ];
        assert!(chain_permits_usages(&chain, &[ExtKeyUsage::ServerAuth]));
    }

    #[test]
    fn single_certificate_chain_uses_the_same_rule() {
        let restricted = vec![cert_with(&[ExtKeyUsage::EmailProtection])];
        assert!(!chain_permits_usages(&restricted, &[ExtKeyUsage::ServerAuth]));
        let open = vec![cert_with(&[])];
        assert!(chain_permits_usages(&open, &[ExtKeyUsage::ServerAuth]));
    }

    #[test]
    fn requesting_any_keeps_every_chain() {
        let chains = vec![vec![cert_with(&[ExtKeyUsage::ClientAuth])]];
        assert_eq!(filter_by_usage(chains, &[ExtKeyUsage::Any]).len(), 1);
    }

    #[test]
    fn empty_chain_is_never_permitted() {
        assert!(!chain_permits_usages(&[], &[ExtKeyUsage::ServerAuth]));
    }
}
