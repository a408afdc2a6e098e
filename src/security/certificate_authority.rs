//! openssl backed certificate generation

use super::{CertificateAuthority, ServerCertificate};
use crate::error::ToolError;
use crate::system::{run_command, run_with_spinner};
use std::path::{Path, PathBuf};

const CERT_VALIDITY_DAYS: &str = "3650";
const CA_SUBJECT: &str = "/CN=TeddyCloudStarter CA";

/// Wrapper around the `openssl` binary
#[derive(Debug, Clone, Default)]
pub struct OpenSslAuthority;

impl OpenSslAuthority {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn run(&self, message: &str, args: &[String]) -> Result<(), ToolError> {
        run_with_spinner(message, "openssl", args)?.into_result("openssl")?;
        Ok(())
    }

    /// Create the local CA in `ca_dir` unless it already exists
    ///
    /// Returns the certificate and key paths.
    pub fn ensure_ca(&self, ca_dir: &Path) -> Result<(PathBuf, PathBuf), ToolError> {
        let cert = ca_dir.join("ca.crt");
        let key = ca_dir.join("ca.key");
        if cert.is_file() && key.is_file() {
            return Ok((cert, key));
        }

        std::fs::create_dir_all(ca_dir)
            .map_err(|e| ToolError::io(format!("Failed to create {}", ca_dir.display()), e))?;
        let args = vec![
            "req".to_string(),
            "-x509".to_string(),
            "-new".to_string(),
            "-nodes".to_string(),
            "-newkey".to_string(),
            "rsa:4096".to_string(),
            "-days".to_string(),
            CERT_VALIDITY_DAYS.to_string(),
            "-keyout".to_string(),
            key.display().to_string(),
            "-out".to_string(),
            cert.display().to_string(),
            "-subj".to_string(),
            CA_SUBJECT.to_string(),
        ];
        self.run("Creating certificate authority...", &args)?;
        tracing::info!(ca_dir = %ca_dir.display(), "certificate authority created");
        Ok((cert, key))
    }
}

/// Arguments for a self-signed server certificate valid for `domain`
fn self_signed_args(cert: &Path, key: &Path, domain: &str) -> Vec<String> {
    vec![
        "req".to_string(),
        "-x509".to_string(),
        "-nodes".to_string(),
        "-newkey".to_string(),
        "rsa:2048".to_string(),
        "-days".to_string(),
        CERT_VALIDITY_DAYS.to_string(),
        "-keyout".to_string(),
        key.display().to_string(),
        "-out".to_string(),
        cert.display().to_string(),
        "-subj".to_string(),
        format!("/CN={domain}"),
        "-addext".to_string(),
        format!("subjectAltName=DNS:{domain}"),
    ]
}

impl CertificateAuthority for OpenSslAuthority {
    fn is_available(&self) -> bool {
        run_command("openssl", &["version"])
            .map(|output| output.success())
            .unwrap_or(false)
    }

    fn generate_self_signed(
        &self,
        output_dir: &Path,
        domain: &str,
    ) -> Result<ServerCertificate, ToolError> {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            ToolError::io(format!("Failed to create {}", output_dir.display()), e)
        })?;

        let cert_path = output_dir.join("server.crt");
        let key_path = output_dir.join("server.key");
        let args = self_signed_args(&cert_path, &key_path, domain);
        self.run(
            &format!("Generating self-signed certificate for {domain}..."),
            &args,
        )?;

        tracing::info!(domain, cert = %cert_path.display(), "self-signed certificate generated");
        Ok(ServerCertificate {
            cert_path,
            key_path,
        })
    }
}
