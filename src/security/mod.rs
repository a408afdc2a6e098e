//! Security collaborators
//!
//! The wizard only sees the traits below. Process-backed implementations run
//! certbot (through docker), openssl and htpasswd; every failure comes back as
//! a `ToolError` carrying the captured output.

mod basic_auth;
mod certificate_authority;
mod client_certs;
pub mod ip_restrictions;
mod lets_encrypt;

pub use basic_auth::BasicAuthManager;
pub use certificate_authority::OpenSslAuthority;
pub use client_certs::ClientCertManager;
pub use ip_restrictions::{IpList, IpRestrictionError};
pub use lets_encrypt::{CERTBOT_TEMP_CONTAINER, LetsEncryptManager, certbot_args};

use crate::error::ToolError;
use crate::prompt::Prompter;
use std::path::{Path, PathBuf};

/// How the issuer proves control of the domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChallengeMode {
    /// Temporary listener on port 80
    Standalone,
    /// Token served by the running nginx-edge proxy
    Webroot,
}

/// Automated public CA issuance
pub trait CertificateIssuer {
    fn request_certificate(
        &self,
        domain: &str,
        mode: ChallengeMode,
        staging: bool,
    ) -> Result<(), ToolError>;
}

/// Paths of a freshly generated server certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCertificate {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Local certificate generation
pub trait CertificateAuthority {
    /// Whether the generation tool is installed
    fn is_available(&self) -> bool;

    fn generate_self_signed(
        &self,
        output_dir: &Path,
        domain: &str,
    ) -> Result<ServerCertificate, ToolError>;
}

/// Material produced for one client certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCertInfo {
    pub name: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    /// PKCS#12 bundle for importing into browsers
    pub bundle_path: PathBuf,
}

pub trait ClientCertGenerator {
    fn generate_client_cert(&self, name: &str) -> Result<ClientCertInfo, ToolError>;
}

/// Interactive password-file creation
pub trait HtpasswdGenerator {
    /// Ask for users through `prompter` and write the file to `path`
    fn generate_htpasswd(&self, path: &Path, prompter: &mut dyn Prompter) -> Result<(), ToolError>;
}

/// Optional collaborators handed to the configurators
///
/// Any of them may be absent; the affected sub-flow is then skipped with a
/// warning instead of failing.
#[derive(Default, Clone, Copy)]
pub struct SecurityManagers<'a> {
    pub lets_encrypt: Option<&'a dyn CertificateIssuer>,
    pub certificate_authority: Option<&'a dyn CertificateAuthority>,
    pub client_certs: Option<&'a dyn ClientCertGenerator>,
    pub basic_auth: Option<&'a dyn HtpasswdGenerator>,
}
