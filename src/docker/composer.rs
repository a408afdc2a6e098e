//! docker-compose.yml generator

use crate::error::Result;
use serde_json::{Value, json};
use starter_common::{DeploymentConfig, NGINX_EDGE_SERVICE, TEDDYCLOUD_SERVICE};
use std::fs;
use std::path::Path;

const TEDDYCLOUD_IMAGE: &str = "ghcr.io/toniebox-reverse-engineering/teddycloud:latest";
const NGINX_IMAGE: &str = "nginx:stable-alpine";

/// Named volumes shared with the certbot container, kept unprefixed so
/// `docker run -v certbot_conf:...` and compose see the same volume
const CERTBOT_VOLUMES: [&str; 3] = ["certbot_conf", "certbot_www", "certbot_logs"];

const TEDDYCLOUD_VOLUMES: [(&str, &str); 7] = [
    ("certs", "/teddycloud/certs"),
    ("config", "/teddycloud/config"),
    ("content", "/teddycloud/data/content"),
    ("library", "/teddycloud/data/library"),
    ("custom_img", "/teddycloud/data/www/custom_img"),
    ("firmware", "/teddycloud/data/firmware"),
    ("cache", "/teddycloud/data/cache"),
];

/// Docker Compose manifest generator
pub struct DockerComposeGenerator<'a> {
    config: &'a DeploymentConfig,
}

impl<'a> DockerComposeGenerator<'a> {
    pub fn new(config: &'a DeploymentConfig) -> Self {
        Self { config }
    }

    /// Render the manifest as YAML
    pub fn generate(&self) -> Result<String> {
        let mut compose = json!({
            "name": "teddycloudstarter",
            "services": {},
            "volumes": {},
        });

        compose["services"][TEDDYCLOUD_SERVICE] = self.teddycloud_service();
        for (volume, _) in TEDDYCLOUD_VOLUMES {
            compose["volumes"][volume] = json!({});
        }

        if self.config.is_proxied() {
            compose["services"][NGINX_EDGE_SERVICE] = self.nginx_edge_service();
            for volume in CERTBOT_VOLUMES {
                compose["volumes"][volume] = json!({ "name": volume });
            }
        }

        Ok(serde_yaml::to_string(&compose)?)
    }

    fn teddycloud_service(&self) -> Value {
        let volumes: Vec<String> = TEDDYCLOUD_VOLUMES
            .iter()
            .map(|(volume, target)| format!("{volume}:{target}"))
            .collect();

        let mut service = json!({
            "image": TEDDYCLOUD_IMAGE,
            "container_name": TEDDYCLOUD_SERVICE,
            "hostname": TEDDYCLOUD_SERVICE,
            "restart": "unless-stopped",
            "volumes": volumes,
        });

        if self.config.is_proxied() {
            // Only reachable through the edge proxy
            service["expose"] = json!(["80", "443"]);
        } else {
            let ports = &self.config.ports;
            service["ports"] = json!([
                format!("{}:80", ports.admin_http),
                format!("{}:8443", ports.admin_https),
                format!("{}:443", ports.teddycloud),
            ]);
        }
        service
    }

    fn nginx_edge_service(&self) -> Value {
        json!({
            "image": NGINX_IMAGE,
            "container_name": NGINX_EDGE_SERVICE,
            "restart": "unless-stopped",
            "depends_on": [TEDDYCLOUD_SERVICE],
            "ports": ["80:80", "443:443"],
            "volumes": [
                "./configurations/nginx-edge.conf:/etc/nginx/nginx.conf:ro",
                "./server_certs:/etc/nginx/certificates:ro",
                "./security:/etc/nginx/security:ro",
                "./client_certs:/etc/nginx/client_certs:ro",
                "certbot_conf:/etc/letsencrypt:ro",
                "certbot_www:/var/www/certbot:ro",
            ],
        })
    }

    /// Write the manifest to `output_path`, creating parent directories
    pub fn save_to_file(&self, output_path: &Path) -> Result<()> {
        let content = self.generate()?;
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, content)?;
        tracing::info!(path = %output_path.display(), "compose manifest written");
        Ok(())
    }
}
