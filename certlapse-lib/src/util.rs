//! Shared encoding utilities.

use crate::oid;

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub(crate) fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Map a distinguished-name attribute OID to its OpenSSL short name.
pub(crate) fn oid_short_name(oid_str: &str) -> String {
    match oid_str {
        oid::COMMON_NAME => "CN".into(),
        oid::SURNAME => "SN".into(),
        oid::SERIAL_NUMBER => "serialNumber".into(),
        oid::COUNTRY => "C".into(),
        oid::LOCALITY => "L".into(),
        oid::STATE_OR_PROVINCE => "ST".into(),
        oid::STREET_ADDRESS => "street".into(),
        oid::ORGANIZATION => "O".into(),
        oid::ORGANIZATIONAL_UNIT => "OU".into(),
        oid::EMAIL_ADDRESS => "emailAddress".into(),
        oid::DOMAIN_COMPONENT => "DC".into(),
        other => other.to_string(),
    }
}

/// Returns true if the input looks like PEM (starts with `-----BEGIN`
/// after optional leading whitespace).
pub(crate) fn is_pem(input: &[u8]) -> bool {
    input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .and_then(|start| input.get(start..))
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colon_upper_formats_bytes() {
        assert_eq!(hex_colon_upper(&[0x0a, 0xff, 0x10]), "0A:FF:10");
        assert_eq!(hex_colon_upper(&[]), "");
    }

    #[test]
    fn is_pem_skips_leading_whitespace() {
        assert!(is_pem(b"\n  -----BEGIN CERTIFICATE-----"));
        assert!(!is_pem(&[0x30, 0x82, 0x01]));
        assert!(!is_pem(b"   "));
    }

    #[test]
    fn short_names_fall_back_to_oid() {
        assert_eq!(oid_short_name("2.5.4.3"), "CN");
        assert_eq!(oid_short_name("1.2.3.4"), "1.2.3.4");
    }
}
