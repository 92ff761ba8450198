//! Process-wide cache of the operating system's trusted root certificates.
//!
//! The system store is loaded at most once per process. Concurrent first
//! callers block on the same [`OnceLock`] until the single load finishes, and
//! every caller then sees the same `Arc`, whether it holds the pool or the
//! load error. A failed load is never retried.

use crate::pool::CertPool;
use crate::CertlapseError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Well-known CA bundle file paths, in order of preference.
pub(crate) const KNOWN_CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL/CentOS/Fedora
    "/etc/ssl/ca-bundle.pem",             // openSUSE
    "/etc/ssl/cert.pem",                  // macOS, Alpine
];

/// Well-known CA certificate directory paths.
pub(crate) const KNOWN_CA_DIR_PATHS: &[&str] = &["/etc/ssl/certs"];

/// Outcome of loading a root pool, shared by every caller.
pub type RootsResult = Result<Arc<CertPool>, Arc<CertlapseError>>;

/// Signature of a root pool loader.
pub type RootsLoader = fn() -> Result<CertPool, CertlapseError>;

/// A lazily loaded, memoized root pool.
///
/// The process-wide system store is one instance of this type; tests build
/// their own with an instrumented loader.
pub struct RootsCache<F = RootsLoader> {
    cell: OnceLock<RootsResult>,
    loader: F,
}

impl<F> RootsCache<F> {
    /// Create a cache that will call `loader` on first use.
    pub const fn new(loader: F) -> Self {
        Self {
            cell: OnceLock::new(),
            loader,
        }
    }
}

impl<F> RootsCache<F>
where
    F: Fn() -> Result<CertPool, CertlapseError>,
{
    /// Return the cached pool, loading it first if nobody has yet.
    pub fn get(&self) -> RootsResult {
        self.cell
            .get_or_init(|| match (self.loader)() {
                Ok(pool) => {
                    info!(count = pool.len(), "loaded system root certificates");
                    Ok(Arc::new(pool))
                }
                Err(e) => {
                    warn!(error = %e, "failed to load system root certificates");
                    Err(Arc::new(e))
                }
            })
            .clone()
    }
}

static SYSTEM_ROOTS: RootsCache = RootsCache::new(load_system_roots as RootsLoader);

/// The operating system's trusted roots, loaded once per process.
pub fn system_roots() -> RootsResult {
    SYSTEM_ROOTS.get()
}

/// Load the system trust store.
///
/// Uses `openssl-probe` and environment variables to find the CA bundle,
/// matching the same locations OpenSSL searches:
/// 1. `SSL_CERT_FILE` environment variable
/// 2. Path discovered by `openssl-probe`
/// 3. Well-known bundle file paths ([`KNOWN_CA_BUNDLE_PATHS`])
/// 4. `SSL_CERT_DIR` environment variable
/// 5. Directory discovered by `openssl-probe`
/// 6. Well-known certificate directories ([`KNOWN_CA_DIR_PATHS`])
pub fn load_system_roots() -> Result<CertPool, CertlapseError> {
    let mut pool = CertPool::new();

    if let Some(bundle_path) = find_system_ca_bundle() {
        match std::fs::read(&bundle_path).map(|data| pool.add_pem_bundle(&data)) {
            Ok(Ok(added)) => {
                debug!(path = %bundle_path.display(), added, "read CA bundle");
                if added > 0 {
                    return Ok(pool);
                }
            }
            Ok(Err(e)) => debug!(path = %bundle_path.display(), error = %e, "unusable CA bundle"),
            Err(e) => debug!(path = %bundle_path.display(), error = %e, "unreadable CA bundle"),
        }
    }

    let probe = openssl_probe::probe();
    let dir_candidates = std::env::var("SSL_CERT_DIR")
        .ok()
        .into_iter()
        .map(PathBuf::from)
        .chain(probe.cert_dir)
        .chain(KNOWN_CA_DIR_PATHS.iter().map(PathBuf::from));

    for dir in dir_candidates {
        if let Ok(added) = pool.add_pem_directory(&dir) {
            debug!(path = %dir.display(), added, "read CA directory");
            if added > 0 {
                return Ok(pool);
            }
        }
    }

    Err(CertlapseError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "no system trust store found",
    )))
}

/// Find the system CA bundle path (same location OpenSSL uses).
///
/// Checks, in order:
/// 1. `SSL_CERT_FILE` environment variable
/// 2. Path discovered by `openssl-probe`
/// 3. Well-known bundle file paths ([`KNOWN_CA_BUNDLE_PATHS`])
pub fn find_system_ca_bundle() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SSL_CERT_FILE") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Some(p);
        }
    }

    if let Some(file) = openssl_probe::probe().cert_file {
        if file.exists() {
            return Some(file);
        }
    }

    KNOWN_CA_BUNDLE_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}
