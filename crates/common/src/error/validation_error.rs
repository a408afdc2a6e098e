//! Input validation errors

use thiserror::Error;

/// Rejected operator input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Domain name must not be empty")]
    EmptyDomain,

    #[error("Invalid domain name '{value}': {reason}")]
    InvalidDomain { value: String, reason: &'static str },

    #[error("Invalid IP address or CIDR: {value}")]
    InvalidIp { value: String },

    #[error("Invalid prefix length in '{value}' (maximum {max})")]
    InvalidPrefix { value: String, max: u8 },
}
