//! Let's Encrypt issuance through the certbot container

use super::{CertificateIssuer, ChallengeMode};
use crate::docker::{DockerManager, ServiceController, ServiceState};
use crate::error::ToolError;
use crate::system::run_with_spinner;
use starter_common::NGINX_EDGE_SERVICE;

const CERTBOT_IMAGE: &str = "certbot/certbot:latest";
const WEBROOT_PATH: &str = "/var/www/certbot";

/// Name of the one-shot standalone certbot container
pub const CERTBOT_TEMP_CONTAINER: &str = "certbot-temp";

/// Build the `docker` argument list for one certbot run
pub fn certbot_args(
    domain: &str,
    mode: ChallengeMode,
    staging: bool,
    email: Option<&str>,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["run".into(), "--rm".into()];
    if mode == ChallengeMode::Standalone {
        args.extend([
            "--name".into(),
            CERTBOT_TEMP_CONTAINER.into(),
            "-p".into(),
            "80:80".into(),
        ]);
    }
    for volume in [
        "certbot_conf:/etc/letsencrypt",
        "certbot_www:/var/www/certbot",
        "certbot_logs:/var/log/letsencrypt",
    ] {
        args.push("-v".into());
        args.push(volume.into());
    }
    args.push(CERTBOT_IMAGE.into());
    args.push("certonly".into());

    match mode {
        ChallengeMode::Standalone => args.push("--standalone".into()),
        ChallengeMode::Webroot => {
            args.extend(["--webroot".into(), "-w".into(), WEBROOT_PATH.into()]);
        }
    }
    args.extend(["-d".into(), domain.to_string()]);

    match email {
        Some(email) if !email.is_empty() => args.extend(["--email".into(), email.to_string()]),
        _ => args.push("--register-unsafely-without-email".into()),
    }
    if staging {
        args.push("--staging".into());
    }
    args.extend(["--agree-tos".into(), "--non-interactive".into()]);
    args
}

/// certbot runner; webroot requests need the edge proxy up
pub struct LetsEncryptManager<S = DockerManager> {
    services: S,
    email: Option<String>,
}

impl<S: ServiceController> LetsEncryptManager<S> {
    pub fn new(services: S) -> Self {
        Self {
            services,
            email: None,
        }
    }

    /// Registration address passed to certbot
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    fn ensure_edge_running(&self) -> Result<(), ToolError> {
        let state = self.services.service_status(NGINX_EDGE_SERVICE);
        if state != ServiceState::Running {
            tracing::info!(%state, "starting nginx-edge for webroot challenge");
            self.services.start_service(NGINX_EDGE_SERVICE)?;
        }
        Ok(())
    }
}

impl<S: ServiceController> CertificateIssuer for LetsEncryptManager<S> {
    fn request_certificate(
        &self,
        domain: &str,
        mode: ChallengeMode,
        staging: bool,
    ) -> Result<(), ToolError> {
        if mode == ChallengeMode::Webroot {
            self.ensure_edge_running()?;
        }

        let args = certbot_args(domain, mode, staging, self.email.as_deref());
        let environment = if staging { "staging" } else { "production" };
        tracing::info!(domain, %mode, environment, "requesting certificate");

        run_with_spinner(
            &format!("Requesting Let's Encrypt certificate ({environment}) for {domain}..."),
            "docker",
            &args,
        )?
        .into_result("certbot")?;

        tracing::info!(domain, environment, "certificate issued");
        Ok(())
    }
}
