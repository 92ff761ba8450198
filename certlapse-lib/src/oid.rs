//! OID string constants used when reading certificates.

// ── X.509 Distinguished Name attributes (RFC 4519 / X.520) ──────────────

pub const COMMON_NAME: &str = "2.5.4.3";
pub const SURNAME: &str = "2.5.4.4";
pub const SERIAL_NUMBER: &str = "2.5.4.5";
pub const COUNTRY: &str = "2.5.4.6";
pub const LOCALITY: &str = "2.5.4.7";
pub const STATE_OR_PROVINCE: &str = "2.5.4.8";
pub const STREET_ADDRESS: &str = "2.5.4.9";
pub const ORGANIZATION: &str = "2.5.4.10";
pub const ORGANIZATIONAL_UNIT: &str = "2.5.4.11";
pub const EMAIL_ADDRESS: &str = "1.2.840.113549.1.9.1"; // PKCS#9
pub const DOMAIN_COMPONENT: &str = "0.9.2342.19200300.100.1.25";

// ── Extended Key Usage values (RFC 5280 Section 4.2.1.12) ────────────────

pub const EKU_SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";
pub const EKU_CLIENT_AUTH: &str = "1.3.6.1.5.5.7.3.2";
pub const EKU_CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";
pub const EKU_EMAIL_PROTECTION: &str = "1.3.6.1.5.5.7.3.4";
pub const EKU_TIME_STAMPING: &str = "1.3.6.1.5.5.7.3.8";
pub const EKU_OCSP_SIGNING: &str = "1.3.6.1.5.5.7.3.9";
pub const EKU_ANY: &str = "2.5.29.37.0";
