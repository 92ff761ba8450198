#![no_main]

use certlapse_lib::{parse_pem_chain, sha256_fingerprint, Certificate};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing must never panic, regardless of input.
    if let Ok(cert) = Certificate::parse(data) {
        let _ = cert.subject.to_oneline();
        let _ = cert.issuer.to_oneline();
        let _ = cert.short_name();
        let _ = cert.is_ca();
        let _ = cert.is_within_validity(0);
        let _ = sha256_fingerprint(&cert.raw);
        for usage in &cert.ext_key_usage {
            let _ = usage.to_string();
        }
    }
    let _ = parse_pem_chain(data);
});
