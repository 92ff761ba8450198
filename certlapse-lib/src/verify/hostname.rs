//! Hostname and IP address matching against a leaf certificate's SAN entries.

use super::VerifyError;
use crate::fields::Certificate;
use std::net::IpAddr;

/// Check that `dns_name` is one of the names the leaf certificate covers.
///
/// DNS names compare case-insensitively, ignoring a single trailing dot, and
/// a SAN entry may use one wildcard as its entire left-most label. If
/// `dns_name` is an IP address (optionally bracketed) it is compared with
/// the SAN IP entries instead.
pub fn match_hostname(leaf: &Certificate, dns_name: &str) -> Result<(), VerifyError> {
    let unbracketed = dns_name
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(dns_name);

    if let Ok(ip) = unbracketed.parse::<IpAddr>() {
        if leaf.ip_addresses.contains(&ip) {
            return Ok(());
        }
        return Err(VerifyError::HostnameMismatch {
            hostname: dns_name.to_string(),
            names: leaf.ip_addresses.iter().map(IpAddr::to_string).collect(),
        });
    }

    if leaf
        .dns_names
        .iter()
        .any(|pattern| hostname_matches(pattern, dns_name))
    {
        return Ok(());
    }

    Err(VerifyError::HostnameMismatch {
        hostname: dns_name.to_string(),
        names: leaf.dns_names.clone(),
    })
}

/// Match a single SAN DNS pattern against a hostname (RFC 6125 wildcards).
pub(crate) fn hostname_matches(pattern: &str, hostname: &str) -> bool {
    let pattern = pattern.strip_suffix('.').unwrap_or(pattern).to_ascii_lowercase();
    let hostname = hostname
        .strip_suffix('.')
        .unwrap_or(hostname)
        .to_ascii_lowercase();
    if pattern.is_empty() || hostname.is_empty() {
        return false;
    }

    match pattern.strip_prefix("*.") {
        Some(suffix) => {
            if suffix.is_empty() || suffix.contains('*') {
                return false;
            }
            match hostname.split_once('.') {
                Some((label, rest)) => !label.is_empty() && rest == suffix,
                None => false,
            }
        }
        None => !pattern.contains('*') && pattern == hostname,
    }
}
