//! Utilities shared by the wizard

pub mod validation;

pub use validation::{validate_domain_name, validate_ip_or_cidr};
