//! Client certificates signed by the local CA

use super::certificate_authority::OpenSslAuthority;
use super::{ClientCertGenerator, ClientCertInfo};
use crate::error::ToolError;
use std::path::{Path, PathBuf};

/// Issues client certificates under `client_certs_dir`
///
/// Layout: `ca/` holds the CA, `clients/` the per-client key, certificate and
/// PKCS#12 bundle.
pub struct ClientCertManager {
    base_dir: PathBuf,
    authority: OpenSslAuthority,
}

impl ClientCertManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            authority: OpenSslAuthority::new(),
        }
    }

    pub fn ca_dir(&self) -> PathBuf {
        self.base_dir.join("ca")
    }

    pub fn clients_dir(&self) -> PathBuf {
        self.base_dir.join("clients")
    }
}

/// File stem for a certificate name: keeps `[A-Za-z0-9_-]`, maps the rest to `_`
fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "client".to_string()
    } else {
        stem
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

impl ClientCertGenerator for ClientCertManager {
    fn generate_client_cert(&self, name: &str) -> Result<ClientCertInfo, ToolError> {
        let (ca_cert, ca_key) = self.authority.ensure_ca(&self.ca_dir())?;

        let clients_dir = self.clients_dir();
        std::fs::create_dir_all(&clients_dir).map_err(|e| {
            ToolError::io(format!("Failed to create {}", clients_dir.display()), e)
        })?;

        let stem = file_stem(name);
        let key_path = clients_dir.join(format!("{stem}.key"));
        let csr_path = clients_dir.join(format!("{stem}.csr"));
        let cert_path = clients_dir.join(format!("{stem}.crt"));
        let bundle_path = clients_dir.join(format!("{stem}.p12"));

        let request = vec![
            "req".to_string(),
            "-new".to_string(),
            "-nodes".to_string(),
            "-newkey".to_string(),
            "rsa:2048".to_string(),
            "-keyout".to_string(),
            path_arg(&key_path),
            "-out".to_string(),
            path_arg(&csr_path),
            "-subj".to_string(),
            format!("/CN={}", name.trim()),
        ];
        self.authority
            .run(&format!("Creating key for {name}..."), &request)?;

        let sign = vec![
            "x509".to_string(),
            "-req".to_string(),
            "-in".to_string(),
            path_arg(&csr_path),
            "-CA".to_string(),
            path_arg(&ca_cert),
            "-CAkey".to_string(),
            path_arg(&ca_key),
            "-CAcreateserial".to_string(),
            "-days".to_string(),
            "3650".to_string(),
            "-out".to_string(),
            path_arg(&cert_path),
        ];
        self.authority
            .run(&format!("Signing certificate for {name}..."), &sign)?;

        let export = vec![
            "pkcs12".to_string(),
            "-export".to_string(),
            "-out".to_string(),
            path_arg(&bundle_path),
            "-inkey".to_string(),
            path_arg(&key_path),
            "-in".to_string(),
            path_arg(&cert_path),
            "-certfile".to_string(),
            path_arg(&ca_cert),
            "-passout".to_string(),
            "pass:".to_string(),
        ];
        self.authority.run("Exporting PKCS#12 bundle...", &export)?;

        if let Err(e) = std::fs::remove_file(&csr_path) {
            tracing::debug!(path = %csr_path.display(), error = %e, "could not remove CSR");
        }

        tracing::info!(name, cert = %cert_path.display(), "client certificate issued");
        Ok(ClientCertInfo {
            name: name.trim().to_string(),
            cert_path,
            key_path,
            bundle_path,
        })
    }
}
