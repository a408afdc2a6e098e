//! Input validation for domains and IP allow-list entries

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

static LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("valid label regex")
});

static TLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2,63}$|^xn--[A-Za-z0-9-]{1,59}$").expect("valid tld regex"));

/// Validate a host name that can be used as the proxy's server name
///
/// `localhost` is accepted for local test setups; everything else needs at
/// least two labels and an alphabetic top-level label.
pub fn validate_domain_name(domain: &str) -> Result<(), ValidationError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(ValidationError::EmptyDomain);
    }
    if domain.eq_ignore_ascii_case("localhost") {
        return Ok(());
    }
    let invalid = |reason| ValidationError::InvalidDomain {
        value: domain.to_string(),
        reason,
    };
    if domain.len() > 253 {
        return Err(invalid("longer than 253 characters"));
    }

    let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
    if labels.len() < 2 {
        return Err(invalid("needs at least one dot"));
    }
    if labels.iter().any(|label| !LABEL.is_match(label)) {
        return Err(invalid("contains an invalid label"));
    }
    match labels.last() {
        Some(tld) if TLD.is_match(tld) => Ok(()),
        _ => Err(invalid("invalid top-level domain")),
    }
}

/// Validate a single IP address or a CIDR block (`10.0.0.0/8`, `2001:db8::/32`)
pub fn validate_ip_or_cidr(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let invalid = || ValidationError::InvalidIp {
        value: value.to_string(),
    };

    match value.split_once('/') {
        Some((addr, prefix)) => {
            let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
            let max = if addr.is_ipv4() { 32 } else { 128 };
            let prefix: u8 = prefix.parse().map_err(|_| ValidationError::InvalidPrefix {
                value: value.to_string(),
                max,
            })?;
            if prefix > max {
                return Err(ValidationError::InvalidPrefix {
                    value: value.to_string(),
                    max,
                });
            }
            Ok(())
        }
        None => value.parse::<IpAddr>().map(|_| ()).map_err(|_| invalid()),
    }
}
