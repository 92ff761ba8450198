//! Searchable collections of certificates.
//!
//! A [`CertPool`] plays one of two roles during verification: the
//! intermediates supplied alongside a leaf (path-building material only), or
//! the roots that anchor a chain. Lookup is by raw subject name so that
//! candidate issuers can be found from a certificate's raw issuer name.

use crate::fields::Certificate;
use crate::CertlapseError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A set of certificates indexed by subject.
#[derive(Clone, Default)]
pub struct CertPool {
    certs: Vec<Arc<Certificate>>,
    /// Map from raw DER-encoded subject name to indices into `certs`.
    by_subject: HashMap<Vec<u8>, Vec<usize>>,
}

impl std::fmt::Debug for CertPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertPool")
            .field("count", &self.certs.len())
            .finish()
    }
}

impl CertPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool from a PEM bundle (e.g., a CA certificates file).
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, CertlapseError> {
        let mut pool = CertPool::new();
        pool.add_pem_bundle(pem_data)?;
        Ok(pool)
    }

    /// Create a pool from a PEM file path.
    pub fn from_pem_file(path: &Path) -> Result<Self, CertlapseError> {
        let data = std::fs::read(path).map_err(|e| {
            CertlapseError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Self::from_pem(&data)
    }

    /// Add a certificate. Returns false if an identical certificate is
    /// already present.
    pub fn add_cert(&mut self, cert: impl Into<Arc<Certificate>>) -> bool {
        let cert = cert.into();
        if self.contains(&cert) {
            return false;
        }
        self.by_subject
            .entry(cert.raw_subject.clone())
            .or_default()
            .push(self.certs.len());
        self.certs.push(cert);
        true
    }

    /// Parse and add a DER-encoded certificate.
    pub fn add_der(&mut self, der: &[u8]) -> Result<(), CertlapseError> {
        let cert = Certificate::from_der(der)?;
        self.add_cert(cert);
        Ok(())
    }

    /// Add all certificates from a PEM bundle. Returns the number of
    /// certificates actually added (skipping those that fail to parse).
    pub fn add_pem_bundle(&mut self, pem_data: &[u8]) -> Result<usize, CertlapseError> {
        let certs = crate::parser::parse_pem_chain(pem_data)?;
        let mut added = 0;
        for cert_der in certs {
            match Certificate::from_der(&cert_der) {
                Ok(cert) => {
                    if self.add_cert(cert) {
                        added += 1;
                    }
                }
                Err(e) => tracing::debug!(error = %e, "skipping unparseable bundle entry"),
            }
        }
        Ok(added)
    }

    /// Load certificates from a directory of PEM files (like OpenSSL's -CApath).
    ///
    /// Reads all `.pem`, `.crt`, `.cer`, and OpenSSL hash-linked files in the
    /// directory. Hash-linked files follow the pattern `XXXXXXXX.N` where N is
    /// a single digit (e.g., `a1b2c3d4.0`).
    pub fn add_pem_directory(&mut self, dir: &Path) -> Result<usize, CertlapseError> {
        let mut total = 0;
        let entries = std::fs::read_dir(dir).map_err(|e| {
            CertlapseError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", dir.display(), e),
            ))
        })?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_pem_cert_file(&path) {
                if let Ok(data) = std::fs::read(&path) {
                    if let Ok(added) = self.add_pem_bundle(&data) {
                        total += added;
                    }
                }
            }
        }
        Ok(total)
    }

    /// Certificates whose subject matches `cert`'s issuer name.
    pub fn find_potential_parents(&self, cert: &Certificate) -> Vec<Arc<Certificate>> {
        self.by_subject
            .get(&cert.raw_issuer)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|&i| self.certs.get(i).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether exactly this certificate (same DER bytes) is in the pool.
    pub fn contains(&self, cert: &Certificate) -> bool {
        self.by_subject.get(&cert.raw_subject).is_some_and(|indices| {
            indices
                .iter()
                .filter_map(|&i| self.certs.get(i))
                .any(|c| c.raw == cert.raw)
        })
    }

    /// Number of certificates in the pool.
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Iterate over the pool in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Certificate>> {
        self.certs.iter()
    }
}

/// Check if a file looks like a PEM certificate file for pool loading.
///
/// Matches `.pem`, `.crt`, `.cer` extensions and OpenSSL hash-linked files
/// (`XXXXXXXX.N` where the extension is a single digit).
fn is_pem_cert_file(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e,
        None => return false,
    };
    matches!(ext, "pem" | "crt" | "cer")
        || (ext.len() == 1 && ext.bytes().next().is_some_and(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pem_cert_file_extensions() {
        assert!(is_pem_cert_file(Path::new("/etc/ssl/certs/ca.pem")));
        assert!(is_pem_cert_file(Path::new("root.crt")));
        assert!(is_pem_cert_file(Path::new("a1b2c3d4.0")));
        assert!(!is_pem_cert_file(Path::new("a1b2c3d4.10")));
        assert!(!is_pem_cert_file(Path::new("README")));
        assert!(!is_pem_cert_file(Path::new("key.der")));
    }

    #[test]
    fn empty_pool_finds_nothing() {
        let pool = CertPool::new();
        let cert = Certificate::default();
        assert!(pool.is_empty());
        assert!(!pool.contains(&cert));
        assert!(pool.find_potential_parents(&cert).is_empty());
    }

    #[test]
    fn adding_the_same_certificate_twice_is_a_no_op() {
        let mut pool = CertPool::new();
        let cert = Certificate {
            raw: vec![1, 2, 3],
            raw_subject: vec![9],
            ..Default::default()
        };
        assert!(pool.add_cert(cert.clone()));
        assert!(!pool.add_cert(cert.clone()));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&cert));
    }
}
