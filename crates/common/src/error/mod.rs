//! Error types
//!
//! One file per concept, mirroring the split between persistence and input validation

mod config_error;
mod validation_error;

pub use config_error::ConfigError;
pub use validation_error::ValidationError;
