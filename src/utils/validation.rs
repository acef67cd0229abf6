use crate::utils::error::{Result, TfvarsError};
use regex::Regex;
use std::net::IpAddr;
use std::sync::OnceLock;

pub use crate::domain::ports::Validate;

pub const MAX_IDENTIFIER_LEN: usize = 63;

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| Regex::new(r"^[a-z0-9_-]+$").expect("identifier pattern compiles"))
}

/// Service names and subdomains: 1-63 chars of `[a-z0-9_-]`.
pub fn validate_service_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_IDENTIFIER_LEN {
        return false;
    }
    identifier_regex().is_match(name)
}

pub fn is_valid_port(port: i64) -> bool {
    (1..=65_535).contains(&port)
}

/// IPv4 or IPv6 address with an optional prefix length.
pub fn validate_source_ip(token: &str) -> bool {
    let (addr, prefix) = match token.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (token, None),
    };

    let Ok(ip) = addr.parse::<IpAddr>() else {
        return false;
    };

    let max_prefix = if ip.is_ipv4() { 32 } else { 128 };
    match prefix {
        None => true,
        Some(prefix) => prefix
            .parse::<u8>()
            .map(|bits| bits <= max_prefix)
            .unwrap_or(false),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(TfvarsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(TfvarsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TfvarsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}
