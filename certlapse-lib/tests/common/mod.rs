//! Throwaway PKI generation for integration tests.

#![allow(dead_code)]

use certlapse_lib::{CertPool, Certificate};
use rcgen::{
    date_time_ymd, BasicConstraints, CertificateParams, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose,
};
use std::sync::Arc;

/// A generated certificate together with its private key.
pub struct Issued {
    pub cert: rcgen::Certificate,
    pub key: KeyPair,
}

impl Issued {
    /// Self-sign `params` with a fresh key.
    pub fn self_signed(params: CertificateParams) -> Self {
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        Issued { cert, key }
    }

    /// Issue `params` under this certificate with a fresh key.
    pub fn issue(&self, params: CertificateParams) -> Issued {
        self.issue_with_key(params, KeyPair::generate().unwrap())
    }

    /// Issue `params` under this certificate for an existing key.
    pub fn issue_with_key(&self, params: CertificateParams, key: KeyPair) -> Issued {
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        Issued { cert, key }
    }

    pub fn der(&self) -> Vec<u8> {
        self.cert.der().to_vec()
    }

    pub fn pem(&self) -> String {
        self.cert.pem()
    }

    pub fn parsed(&self) -> Certificate {
        Certificate::from_der(&self.der()).unwrap()
    }
}

fn named(mut params: CertificateParams, common_name: &str) -> CertificateParams {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, "certlapse tests");
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    params.not_before = date_time_ymd(2020, 1, 1);
    params.not_after = date_time_ymd(2090, 1, 1);
    params
}

/// Parameters for an unconstrained CA.
pub fn ca_params(common_name: &str) -> CertificateParams {
    let mut params = named(CertificateParams::new(Vec::new()).unwrap(), common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    params
}

/// Parameters for a CA limited to `path_len` intermediates below it.
pub fn constrained_ca_params(common_name: &str, path_len: u8) -> CertificateParams {
    let mut params = ca_params(common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Constrained(path_len));
    params
}

/// Parameters for a TLS server leaf covering `names`.
pub fn leaf_params(common_name: &str, names: &[&str]) -> CertificateParams {
    let sans: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    let mut params = named(CertificateParams::new(sans).unwrap(), common_name);
    params.is_ca = IsCa::ExplicitNoCa;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    params
}

/// Restrict `params` to the given extended key usages.
pub fn with_ekus(
    mut params: CertificateParams,
    ekus: Vec<ExtendedKeyUsagePurpose>,
) -> CertificateParams {
    params.extended_key_usages = ekus;
    params
}

/// Give `params` a validity window that ended in 2021.
pub fn expired(mut params: CertificateParams) -> CertificateParams {
    params.not_before = date_time_ymd(2020, 1, 1);
    params.not_after = date_time_ymd(2021, 1, 1);
    params
}

/// Give `params` a validity window that starts in 2090.
pub fn not_yet_valid(mut params: CertificateParams) -> CertificateParams {
    params.not_before = date_time_ymd(2090, 1, 1);
    params.not_after = date_time_ymd(2091, 1, 1);
    params
}

pub fn pool_of(certs: &[&Issued]) -> CertPool {
    let mut pool = CertPool::new();
    for issued in certs {
        pool.add_der(&issued.der()).unwrap();
    }
    pool
}

pub fn roots_of(certs: &[&Issued]) -> Option<Arc<CertPool>> {
    Some(Arc::new(pool_of(certs)))
}

/// Common names along a chain, leaf first.
pub fn names(chain: &[Arc<Certificate>]) -> Vec<String> {
    chain.iter().map(|c| c.short_name()).collect()
}

/// A root, one intermediate, and a leaf for `www.example.com`.
pub struct SimplePki {
    pub root: Issued,
    pub intermediate: Issued,
    pub leaf: Issued,
}

impl SimplePki {
    pub fn new() -> Self {
        let root = Issued::self_signed(ca_params("Test Root"));
        let intermediate = root.issue(ca_params("Test Intermediate"));
        let leaf = intermediate.issue(leaf_params("www.example.com", &["www.example.com"]));
        SimplePki {
            root,
            intermediate,
            leaf,
        }
    }
}
