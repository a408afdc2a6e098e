//! Interactive configuration state machines
//!
//! Every configurator borrows a [`WizardContext`] for its collaborators and
//! mutates the `DeploymentConfig` it is handed, saving after each settled
//! step.

pub mod access_control;
pub mod certificate;
mod context;
mod direct_mode;
pub mod ip_restrictions;
mod nginx_mode;
mod setup;

pub use access_control::{AccessControlConfigurator, AccessState, WaitOutcome};
pub use certificate::{CertificateEngine, CertificateState, offered_modes};
pub use context::{ArtifactProbe, DEFAULT_POLL_INTERVAL, FsProbe, WizardContext};
pub use direct_mode::configure_direct_mode;
pub use ip_restrictions::IpRestrictionConfigurator;
pub use nginx_mode::NginxModeConfigurator;
pub use setup::{SetupWizard, select_project_path};

use starter_common::util::validate_domain_name;

pub(crate) fn domain_validator(value: &str) -> Result<(), String> {
    validate_domain_name(value.trim()).map_err(|e| e.to_string())
}
