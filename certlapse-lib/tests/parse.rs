#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Parsing certificates and loading pools from PEM.

mod common;

use certlapse_lib::*;
use common::*;
use rcgen::ExtendedKeyUsagePurpose;
use std::net::IpAddr;
use std::path::PathBuf;

#[test]
fn leaf_fields_are_extracted() {
    let pki = SimplePki::new();
    let leaf = pki
        .intermediate
        .issue(leaf_params("api.example.com", &["api.example.com", "10.0.0.7"]));
    let cert = leaf.parsed();

    assert_eq!(cert.version, 3);
    assert_eq!(cert.short_name(), "api.example.com");
    assert_eq!(cert.subject.get("O"), Some("certlapse tests"));
    assert_eq!(
        cert.issuer.to_oneline(),
        "O = certlapse tests, CN = Test Intermediate"
    );
    assert!(!cert.is_ca());
    assert!(!cert.is_self_issued());
    assert_eq!(cert.dns_names, vec!["api.example.com".to_string()]);
    assert_eq!(
        cert.ip_addresses,
        vec!["10.0.0.7".parse::<IpAddr>().unwrap()]
    );
    assert_eq!(cert.ext_key_usage, vec![ExtKeyUsage::ServerAuth]);
    assert_eq!(cert.not_before.iso8601, "2020-01-01T00:00:00Z");
    assert_eq!(cert.not_after.iso8601, "2090-01-01T00:00:00Z");
    assert_eq!(cert.raw, leaf.der());
}

#[test]
fn ca_fields_are_extracted() {
    let root = Issued::self_signed(constrained_ca_params("Path Root", 2));
    let cert = root.parsed();
    assert!(cert.is_ca());
    assert!(cert.is_self_issued());
    assert_eq!(
        cert.basic_constraints,
        Some(BasicConstraints {
            is_ca: true,
            max_path_len: Some(2),
        })
    );
    assert!(cert.ext_key_usage.is_empty());
}

#[test]
fn any_and_unknown_ekus_are_kept() {
    let root = Issued::self_signed(with_ekus(
        ca_params("Mixed"),
        vec![
            ExtendedKeyUsagePurpose::Any,
            ExtendedKeyUsagePurpose::Other(vec![1, 3, 6, 1, 4, 1, 11129, 2, 4, 4]),
        ],
    ));
    let cert = root.parsed();
    assert!(cert.ext_key_usage.contains(&ExtKeyUsage::Any));
    assert!(cert
        .ext_key_usage
        .contains(&ExtKeyUsage::Other("1.3.6.1.4.1.11129.2.4.4".into())));
}

#[test]
fn parse_detects_pem_and_der() {
    let pki = SimplePki::new();
    let from_pem = Certificate::parse(pki.leaf.pem().as_bytes()).unwrap();
    let from_der = Certificate::parse(&pki.leaf.der()).unwrap();
    assert_eq!(from_pem, from_der);
    assert!(matches!(
        Certificate::parse(b""),
        Err(CertlapseError::ParseError(_))
    ));
}

#[test]
fn signature_check_uses_the_parent_key() {
    let pki = SimplePki::new();
    let leaf = pki.leaf.parsed();
    assert!(leaf.check_signature_from(&pki.intermediate.parsed()).is_ok());
    assert!(matches!(
        leaf.check_signature_from(&pki.root.parsed()),
        Err(CertlapseError::SignatureError(_))
    ));
}

#[test]
fn pem_chain_splits_into_der_blocks() {
    let pki = SimplePki::new();
    let bundle = format!("{}\n{}", pki.leaf.pem(), pki.intermediate.pem());
    let blocks = parse_pem_chain(bundle.as_bytes()).unwrap();
    assert_eq!(blocks, vec![pki.leaf.der(), pki.intermediate.der()]);
}

#[test]
fn pool_deduplicates_and_indexes_by_subject() {
    let pki = SimplePki::new();
    let bundle = format!(
        "{}\n{}\n{}",
        pki.root.pem(),
        pki.intermediate.pem(),
        pki.root.pem()
    );
    let pool = CertPool::from_pem(bundle.as_bytes()).unwrap();
    assert_eq!(pool.len(), 2);
    assert!(pool.contains(&pki.root.parsed()));
    assert!(!pool.contains(&pki.leaf.parsed()));

    let parents = pool.find_potential_parents(&pki.leaf.parsed());
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].short_name(), "Test Intermediate");
}

struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "certlapse-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        ScratchDir(dir)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

#[test]
fn pool_loads_a_capath_directory() {
    let pki = SimplePki::new();
    let other = Issued::self_signed(ca_params("Other Root"));
    let dir = ScratchDir::new("capath");

    std::fs::write(dir.0.join("root.pem"), pki.root.pem()).unwrap();
    std::fs::write(dir.0.join("a1b2c3d4.0"), other.pem()).unwrap();
    std::fs::write(dir.0.join("notes.txt"), pki.intermediate.pem()).unwrap();

    let mut pool = CertPool::new();
    let added = pool.add_pem_directory(&dir.0).unwrap();
    assert_eq!(added, 2);
    assert!(pool.contains(&pki.root.parsed()));
    assert!(pool.contains(&other.parsed()));
    assert!(!pool.contains(&pki.intermediate.parsed()));
}

#[test]
fn pool_file_errors_name_the_path() {
    let err = CertPool::from_pem_file(std::path::Path::new("/nonexistent/certlapse/roots.pem"))
        .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/certlapse/roots.pem"));
}
