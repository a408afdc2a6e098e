//! Template processing for the nginx edge configuration

use crate::error::{Error, Result};
use starter_common::{DeploymentConfig, SecurityType, TEDDYCLOUD_SERVICE};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DEFAULT_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tpl/nginx-edge.conf.template"
));

/// Certificate paths as seen from inside the nginx-edge container
const CONTAINER_CERT_DIR: &str = "/etc/nginx/certificates";
const CONTAINER_HTPASSWD: &str = "/etc/nginx/security/.htpasswd";
const CONTAINER_CLIENT_CA: &str = "/etc/nginx/client_certs/ca/ca.crt";

/// Template processor for the reverse proxy configuration
pub struct TemplateProcessor {
    template_path: Option<PathBuf>,
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateProcessor {
    pub fn new() -> Self {
        Self {
            template_path: None,
        }
    }

    /// Use a template from disk instead of the embedded one
    pub fn with_template_path(template_path: PathBuf) -> Self {
        Self {
            template_path: Some(template_path),
        }
    }

    /// Render the configuration for `config`
    pub fn render(&self, config: &DeploymentConfig) -> Result<String> {
        let template = self.load_template()?;
        let placeholders = create_placeholders(config);
        Ok(process_template(&template, &placeholders))
    }

    /// Render and write to `output_path`, creating parent directories
    pub fn generate_config(&self, config: &DeploymentConfig, output_path: &Path) -> Result<()> {
        let processed = self.render(config)?;
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, processed)?;
        tracing::info!(path = %output_path.display(), "proxy configuration written");
        Ok(())
    }

    fn load_template(&self) -> Result<String> {
        match &self.template_path {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                Error::custom(format!(
                    "Failed to read template from {}: {e}",
                    path.display()
                ))
            }),
            None => Ok(DEFAULT_TEMPLATE.to_string()),
        }
    }
}

fn create_placeholders(config: &DeploymentConfig) -> HashMap<&'static str, String> {
    let nginx = &config.nginx;
    let security = &nginx.security;
    let mut placeholders = HashMap::new();

    let server_name = if nginx.domain.is_empty() {
        "_".to_string()
    } else {
        nginx.domain.clone()
    };
    placeholders.insert("SERVER_NAME", server_name);
    placeholders.insert("UPSTREAM", TEDDYCLOUD_SERVICE.to_string());

    // nginx refuses to start on a missing certificate file, so the live
    // path is only referenced once certbot has issued it
    let (cert, key) = if nginx.serves_letsencrypt() {
        (
            format!("/etc/letsencrypt/live/{}/fullchain.pem", nginx.domain),
            format!("/etc/letsencrypt/live/{}/privkey.pem", nginx.domain),
        )
    } else {
        (
            format!("{CONTAINER_CERT_DIR}/server.crt"),
            format!("{CONTAINER_CERT_DIR}/server.key"),
        )
    };
    placeholders.insert("SSL_CERTIFICATE", cert);
    placeholders.insert("SSL_CERTIFICATE_KEY", key);

    let geo = if security.allowed_ips.is_empty() {
        "        default 1;".to_string()
    } else {
        std::iter::once("        default 0;".to_string())
            .chain(security.allowed_ips.iter().map(|ip| format!("        {ip} 1;")))
            .collect::<Vec<_>>()
            .join("\n")
    };
    placeholders.insert("ALLOWED_IPS_GEO", geo);

    let client_cert = if security.kind == SecurityType::ClientCert {
        format!(
            "        ssl_client_certificate {CONTAINER_CLIENT_CA};\n        ssl_verify_client on;\n"
        )
    } else {
        String::new()
    };
    placeholders.insert("CLIENT_CERT_VERIFY", client_cert);

    placeholders.insert("BASIC_AUTH", basic_auth_block(config));
    placeholders
}

/// Basic auth directives, with `satisfy any` when bypass addresses are set
fn basic_auth_block(config: &DeploymentConfig) -> String {
    let security = &config.nginx.security;
    if security.kind != SecurityType::BasicAuth {
        return String::new();
    }

    let mut lines = Vec::new();
    if !security.auth_bypass_ips.is_empty() {
        lines.push("            satisfy any;".to_string());
        for ip in &security.auth_bypass_ips {
            lines.push(format!("            allow {ip};"));
        }
        lines.push("            deny all;".to_string());
    }
    lines.push("            auth_basic \"TeddyCloud\";".to_string());
    lines.push(format!("            auth_basic_user_file {CONTAINER_HTPASSWD};"));
    lines.join("\n")
}

fn process_template(template: &str, placeholders: &HashMap<&'static str, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in placeholders {
        let placeholder = format!("{{{{{key}}}}}");
        result = result.replace(&placeholder, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use starter_common::{DeploymentMode, HttpsMode};

    fn proxied(domain: &str, https_mode: HttpsMode) -> DeploymentConfig {
        let mut config = DeploymentConfig::default();
        config.mode = DeploymentMode::Proxied;
        config.nginx.domain = domain.to_string();
        config.nginx.https_mode = https_mode;
        config
    }

    #[test]
    fn test_all_placeholders_replaced() {
        let rendered = TemplateProcessor::new()
            .render(&proxied("box.example.org", HttpsMode::SelfSigned))
            .unwrap();
        assert!(!rendered.contains("{{"));
        assert!(rendered.contains("server_name box.example.org;"));
        assert!(rendered.contains("ssl_certificate /etc/nginx/certificates/server.crt;"));
        assert!(rendered.contains("default 1;"));
    }

    #[test]
    fn test_letsencrypt_before_issuance_serves_fallback_certificate() {
        let rendered = TemplateProcessor::new()
            .render(&proxied("box.example.org", HttpsMode::Letsencrypt))
            .unwrap();
        assert!(rendered.contains("ssl_certificate /etc/nginx/certificates/server.crt;"));
        assert!(rendered.contains("ssl_certificate_key /etc/nginx/certificates/server.key;"));
        assert!(!rendered.contains("/etc/letsencrypt/live/"));
        assert!(rendered.contains("location /.well-known/acme-challenge/"));
    }

    #[test]
    fn test_letsencrypt_uses_live_certificates_once_issued() {
        let mut config = proxied("box.example.org", HttpsMode::Letsencrypt);
        config.nginx.letsencrypt_issued = true;

        let rendered = TemplateProcessor::new().render(&config).unwrap();
        assert!(rendered.contains(
            "ssl_certificate /etc/letsencrypt/live/box.example.org/fullchain.pem;"
        ));
        assert!(rendered.contains("location /.well-known/acme-challenge/"));
    }

    #[test]
    fn test_basic_auth_with_bypass() {
        let mut config = proxied("box.example.org", HttpsMode::SelfSigned);
        config.nginx.security.kind = SecurityType::BasicAuth;
        config.nginx.security.auth_bypass_ips = vec!["192.168.1.0/24".to_string()];
        config.nginx.security.allowed_ips = vec!["10.0.0.0/8".to_string()];

        let rendered = TemplateProcessor::new().render(&config).unwrap();
        assert!(rendered.contains("satisfy any;"));
        assert!(rendered.contains("allow 192.168.1.0/24;"));
        assert!(rendered.contains("auth_basic_user_file /etc/nginx/security/.htpasswd;"));
        assert!(rendered.contains("10.0.0.0/8 1;"));
        assert!(rendered.contains("default 0;"));
    }

    #[test]
    fn test_stale_bypass_ignored_without_basic_auth() {
        let mut config = proxied("box.example.org", HttpsMode::SelfSigned);
        config.nginx.security.kind = SecurityType::ClientCert;
        config.nginx.security.auth_bypass_ips = vec!["192.168.1.10".to_string()];

        let rendered = TemplateProcessor::new().render(&config).unwrap();
        assert!(!rendered.contains("satisfy any;"));
        assert!(rendered.contains("ssl_verify_client on;"));
    }

    #[test]
    fn test_template_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.conf.template");
        std::fs::write(&path, "server_name {{SERVER_NAME}};\n").unwrap();

        let rendered = TemplateProcessor::with_template_path(path)
            .render(&proxied("box.example.org", HttpsMode::SelfSigned))
            .unwrap();
        assert_eq!(rendered, "server_name box.example.org;\n");

        let missing = TemplateProcessor::with_template_path(dir.path().join("missing"));
        assert!(missing.render(&DeploymentConfig::default()).is_err());
    }
}
