#![no_main]

use certlapse_lib::{verify, CertPool, Certificate, VerifyOptions};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

// Split the input on a sentinel into DER blobs: the first is the leaf, the
// last is the root, everything between is an intermediate.
const SEPARATOR: &[u8] = b"\xff\xfe\xfd\xfc";

fuzz_target!(|data: &[u8]| {
    let mut parts = Vec::new();
    let mut rest = data;
    while let Some(pos) = rest.windows(SEPARATOR.len()).position(|w| w == SEPARATOR) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + SEPARATOR.len()..];
    }
    parts.push(rest);

    let Some((leaf_der, others)) = parts.split_first() else {
        return;
    };
    let Ok(leaf) = Certificate::from_der(leaf_der) else {
        return;
    };

    let mut intermediates = CertPool::new();
    let mut roots = CertPool::new();
    if let Some((root_der, middle)) = others.split_last() {
        let _ = roots.add_der(root_der);
        for der in middle {
            let _ = intermediates.add_der(der);
        }
    }

    // Chain building, usage filtering and hostname matching must terminate
    // without panicking on arbitrary certificate graphs.
    let options = VerifyOptions {
        dns_name: "fuzz.example.com".into(),
        intermediates,
        roots: Some(Arc::new(roots)),
        key_usages: Vec::new(),
    };
    let _ = verify(&leaf, &options);
});
