//! Certificate strategy engine
//!
//! Settles `nginx.https_mode`. During setup the engine walks
//! `ChoosingMode -> {RequestingAutoCert, GeneratingSelfSigned, AwaitingUserCert} -> Settled`,
//! with Let's Encrypt failures falling back to self-signed and self-signed
//! failures falling back to user-provided. After setup it performs in-place
//! mode switches, reverting to the previous mode when a switch fails.

use super::WizardContext;
use crate::docker::ServiceState;
use crate::prompt::{Choice, choose};
use crate::security::{CERTBOT_TEMP_CONTAINER, ChallengeMode};
use starter_common::{DeploymentConfig, HttpsMode, NGINX_EDGE_SERVICE};

/// Domain used for self-signed certificates when none is configured
pub const FALLBACK_DOMAIN: &str = "localhost";

/// States of the initial HTTPS setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateState {
    ChoosingMode,
    RequestingAutoCert,
    GeneratingSelfSigned,
    AwaitingUserCert,
    Settled(HttpsMode),
    /// Operator backed out before any mode was ever settled
    Abandoned,
}

/// How far the setup-time Let's Encrypt attempt got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutoCertOutcome {
    /// Production certificate is in the certbot volume
    Issued,
    /// Mode kept, certificate still to be requested
    Deferred,
    Failed,
}

impl CertificateState {
    fn is_terminal(self) -> bool {
        matches!(self, CertificateState::Settled(_) | CertificateState::Abandoned)
    }
}

/// Modes offered for `domain` and the default among them
///
/// Let's Encrypt is only offered for publicly resolvable domains.
pub fn offered_modes(resolvable: bool) -> (Vec<HttpsMode>, HttpsMode) {
    if resolvable {
        (HttpsMode::selectable().to_vec(), HttpsMode::Letsencrypt)
    } else {
        (
            vec![HttpsMode::SelfSigned, HttpsMode::UserProvided],
            HttpsMode::SelfSigned,
        )
    }
}

pub struct CertificateEngine<'c, 'a> {
    ctx: &'c mut WizardContext<'a>,
}

impl<'c, 'a> CertificateEngine<'c, 'a> {
    pub fn new(ctx: &'c mut WizardContext<'a>) -> Self {
        Self { ctx }
    }

    /// Run the setup state machine until a mode is settled
    ///
    /// Returns `None` when the operator cancelled the first choice and no
    /// mode had been configured before.
    pub fn settle(&mut self, config: &mut DeploymentConfig) -> Option<HttpsMode> {
        let mut state = CertificateState::ChoosingMode;
        while !state.is_terminal() {
            let next = self.step(state, config);
            tracing::debug!(from = ?state, to = ?next, "certificate state transition");
            state = next;
        }

        match state {
            CertificateState::Settled(mode) => {
                config.nginx.https_mode = mode;
                tracing::info!(%mode, "HTTPS mode settled");
                self.ctx.persist(config);
                Some(mode)
            }
            _ => None,
        }
    }

    fn step(&mut self, state: CertificateState, config: &mut DeploymentConfig) -> CertificateState {
        match state {
            CertificateState::ChoosingMode => self.choose_mode(config),
            CertificateState::RequestingAutoCert => {
                let domain = config.nginx.domain.clone();
                match self.letsencrypt_setup(&domain) {
                    AutoCertOutcome::Issued => {
                        config.nginx.letsencrypt_issued = true;
                        CertificateState::Settled(HttpsMode::Letsencrypt)
                    }
                    AutoCertOutcome::Deferred => {
                        config.nginx.letsencrypt_issued = false;
                        self.ensure_fallback_certificate(config);
                        CertificateState::Settled(HttpsMode::Letsencrypt)
                    }
                    AutoCertOutcome::Failed => {
                        self.ctx
                            .prompter
                            .info("Switching to self-signed certificates mode...");
                        CertificateState::GeneratingSelfSigned
                    }
                }
            }
            CertificateState::GeneratingSelfSigned => self.generate_self_signed(config),
            CertificateState::AwaitingUserCert => {
                let dir = config.server_certs_dir();
                self.ctx.prompter.info(&format!(
                    "Place your certificate and key as server.crt and server.key in {}",
                    dir.display()
                ));
                CertificateState::Settled(HttpsMode::UserProvided)
            }
            terminal => terminal,
        }
    }

    fn choose_mode(&mut self, config: &DeploymentConfig) -> CertificateState {
        let resolvable = self.ctx.checker.domain_resolvable(&config.nginx.domain);
        let (modes, default) = offered_modes(resolvable);

        match choose(
            &mut *self.ctx.prompter,
            "How would you like to handle HTTPS?",
            &modes,
            default,
        ) {
            Some(HttpsMode::Letsencrypt) => CertificateState::RequestingAutoCert,
            Some(HttpsMode::SelfSigned) => CertificateState::GeneratingSelfSigned,
            Some(HttpsMode::UserProvided) => CertificateState::AwaitingUserCert,
            Some(HttpsMode::None) | None => match config.nginx.https_mode {
                HttpsMode::None => CertificateState::Abandoned,
                current => CertificateState::Settled(current),
            },
        }
    }

    fn generate_self_signed(&mut self, config: &mut DeploymentConfig) -> CertificateState {
        let domain = self.domain_or_fallback(config);
        self.show_self_signed_info(&domain);

        let Some(authority) = self.ctx.managers.certificate_authority else {
            self.ctx
                .prompter
                .error("Certificate Authority manager not available. Cannot generate certificates.");
            self.ctx.prompter.warn("Falling back to custom certificate mode.");
            return CertificateState::AwaitingUserCert;
        };
        if !authority.is_available() {
            self.ctx
                .prompter
                .error("OpenSSL is not available. Cannot generate self-signed certificate.");
            self.ctx.prompter.warn("Falling back to custom certificate mode.");
            return CertificateState::AwaitingUserCert;
        }

        match authority.generate_self_signed(&config.server_certs_dir(), &domain) {
            Ok(cert) => {
                self.ctx.prompter.success(&format!(
                    "Self-signed certificate generated: {}",
                    cert.cert_path.display()
                ));
                CertificateState::Settled(HttpsMode::SelfSigned)
            }
            Err(e) => {
                self.ctx
                    .report_failure("Failed to generate self-signed certificate", &e);
                let choices = [
                    Choice::new("try_again", "Try generating the self-signed certificate again"),
                    Choice::new(
                        "switch_to_custom",
                        "Switch to custom certificate mode (provide your own certificates)",
                    ),
                ];
                match self
                    .ctx
                    .prompter
                    .select("What would you like to do?", &choices, "try_again")
                    .as_deref()
                {
                    Some("try_again") => CertificateState::GeneratingSelfSigned,
                    _ => {
                        self.ctx
                            .prompter
                            .info("Switching to custom certificates mode...");
                        CertificateState::AwaitingUserCert
                    }
                }
            }
        }
    }

    /// Let's Encrypt during setup, standalone challenge
    ///
    /// A production failure after a successful staging run keeps the mode
    /// with the certificate still pending.
    fn letsencrypt_setup(&mut self, domain: &str) -> AutoCertOutcome {
        let Some(issuer) = self.ctx.managers.lets_encrypt else {
            self.ctx
                .prompter
                .error("Let's Encrypt manager not available. Cannot request certificates.");
            return AutoCertOutcome::Failed;
        };

        if !self.ctx.checker.domain_resolvable(domain) {
            self.show_not_resolvable(domain);
            return AutoCertOutcome::Failed;
        }

        self.ctx.prompter.panel(
            "Let's Encrypt Requirements",
            &[
                "To use Let's Encrypt, you need:".to_string(),
                "1. A public domain name pointing to this server".to_string(),
                "2. Public internet access on ports 80 and 443".to_string(),
                "3. This server must be reachable from the internet".to_string(),
            ],
        );
        if self
            .ctx
            .prompter
            .confirm("Do you meet these requirements?", true)
            != Some(true)
        {
            return AutoCertOutcome::Failed;
        }

        if !self.port_80_ready() {
            return AutoCertOutcome::Failed;
        }

        if self.ctx.prompter.confirm(
            "Would you like to test if Let's Encrypt can issue a certificate for your domain?",
            true,
        ) != Some(true)
        {
            self.ctx.prompter.info(
                "Skipping the test. The certificate can be requested once the services are running.",
            );
            return AutoCertOutcome::Deferred;
        }

        self.ctx
            .prompter
            .info("Requesting Let's Encrypt certificate (staging) using standalone mode...");
        if let Err(e) = issuer.request_certificate(domain, ChallengeMode::Standalone, true) {
            self.ctx.report_failure(
                "Staging certificate request failed. Your domain may not be properly configured for Let's Encrypt",
                &e,
            );
            return AutoCertOutcome::Failed;
        }
        self.ctx.prompter.success(
            "Staging certificate request successful! Your domain is properly configured for Let's Encrypt.",
        );

        if self
            .ctx
            .prompter
            .confirm("Do you want to proceed with requesting production certificates?", true)
            != Some(true)
        {
            self.ctx.prompter.warn(
                "Production certificate request skipped. The certificate can be requested once the services are running.",
            );
            return AutoCertOutcome::Deferred;
        }

        self.ctx
            .prompter
            .info("Requesting Let's Encrypt certificate (production) using standalone mode...");
        match issuer.request_certificate(domain, ChallengeMode::Standalone, false) {
            Ok(()) => {
                self.ctx.prompter.success(
                    "Production certificate request successful! Your Let's Encrypt certificate is ready to use.",
                );
                AutoCertOutcome::Issued
            }
            Err(e) => {
                self.ctx.report_failure(
                    "Production certificate request failed. You may need to try again later",
                    &e,
                );
                AutoCertOutcome::Deferred
            }
        }
    }

    /// Port 80 check with operator override
    fn port_80_ready(&mut self) -> bool {
        if self.ctx.checker.port_available(80) {
            return true;
        }
        self.ctx.prompter.warn("Warning: Port 80 appears to be in use");
        self.ctx
            .prompter
            .info("Let's Encrypt requires port 80 to be available for domain verification");
        self.ctx.prompter.confirm(
            "Would you like to proceed anyway? (Certbot will attempt to bind to port 80)",
            false,
        ) == Some(true)
    }

    /// Switch an existing deployment to Let's Encrypt
    ///
    /// Regenerates the proxy and compose manifests for the webroot challenge
    /// before issuing; the proxy keeps serving the `server_certs` certificate
    /// until the live one exists. Any failure restores `previous` and
    /// returns `false`.
    pub fn switch_to_letsencrypt(
        &mut self,
        config: &mut DeploymentConfig,
        previous: HttpsMode,
    ) -> bool {
        let domain = config.nginx.domain.clone();
        if domain.is_empty() {
            self.ctx
                .prompter
                .warn("No domain set. Let's Encrypt requires a valid domain.");
            self.keep_previous(previous);
            return false;
        }
        if !self.ctx.checker.domain_resolvable(&domain) {
            self.show_not_resolvable(&domain);
            self.keep_previous(previous);
            return false;
        }

        let edge_running = self
            .ctx
            .services
            .is_some_and(|services| services.service_status(NGINX_EDGE_SERVICE) == ServiceState::Running);
        // A running edge proxy holds port 80 itself and serves the challenge
        if !edge_running && !self.port_80_ready() {
            self.keep_previous(previous);
            return false;
        }

        let Some(issuer) = self.ctx.managers.lets_encrypt else {
            self.ctx
                .prompter
                .error("Let's Encrypt manager not available. Cannot request certificates.");
            self.keep_previous(previous);
            return false;
        };
        let Some(artifacts) = self.ctx.artifacts else {
            self.ctx
                .prompter
                .error("Configuration generator not available. Cannot prepare nginx for Let's Encrypt.");
            self.keep_previous(previous);
            return false;
        };

        config.nginx.https_mode = HttpsMode::Letsencrypt;
        config.nginx.letsencrypt_issued = false;
        self.ensure_fallback_certificate(config);

        self.ctx
            .prompter
            .info("Regenerating nginx configuration for Let's Encrypt...");
        if let Err(e) = artifacts.regenerate_proxy_config(config) {
            tracing::warn!(error = %e, "proxy configuration regeneration failed");
            self.ctx
                .prompter
                .error(&format!("Failed to regenerate nginx configuration: {e}"));
            self.restore_mode(config, previous);
            return false;
        }

        self.ctx
            .prompter
            .info("Regenerating docker-compose configuration...");
        if let Err(e) = artifacts.regenerate_compose_config(config) {
            tracing::warn!(error = %e, "compose regeneration failed");
            self.ctx
                .prompter
                .error(&format!("Failed to regenerate docker-compose configuration: {e}"));
            self.restore_mode(config, previous);
            return false;
        }

        if let Some(services) = self.ctx.services {
            if let Err(e) = services.remove_container(CERTBOT_TEMP_CONTAINER) {
                tracing::debug!(error = %e, "could not remove stale certbot container");
            }
            if edge_running {
                self.ctx
                    .prompter
                    .info("Restarting nginx-edge to apply new configuration...");
                if let Err(e) = services.restart_service(NGINX_EDGE_SERVICE) {
                    self.ctx
                        .report_failure("Warning: Failed to restart nginx-edge", &e);
                }
            }
        }

        self.ctx
            .prompter
            .info("Requesting Let's Encrypt certificate in webroot mode...");
        if let Err(e) = issuer.request_certificate(&domain, ChallengeMode::Webroot, false) {
            self.ctx.report_failure("Certificate request failed", &e);
            self.restore_mode(config, previous);
            return false;
        }

        self.ctx.prompter.success(&format!(
            "Let's Encrypt certificate obtained for {domain}"
        ));
        self.activate_issued_certificate(config);
        true
    }

    /// Request the Let's Encrypt certificate of a deployment already in
    /// Let's Encrypt mode, through the running proxy
    ///
    /// Used when issuance was skipped or failed during setup, and after a
    /// domain change. A failure leaves the mode alone.
    pub fn request_pending_certificate(&mut self, config: &mut DeploymentConfig) -> bool {
        if config.nginx.https_mode != HttpsMode::Letsencrypt {
            self.ctx.prompter.warn(&format!(
                "Certificates are only requested in letsencrypt mode. Current HTTPS mode: {}",
                config.nginx.https_mode
            ));
            return false;
        }
        let domain = config.nginx.domain.clone();
        if domain.is_empty() {
            self.ctx
                .prompter
                .warn("No domain set. Let's Encrypt requires a valid domain.");
            return false;
        }
        if !self.ctx.checker.domain_resolvable(&domain) {
            self.show_not_resolvable(&domain);
            return false;
        }
        let Some(issuer) = self.ctx.managers.lets_encrypt else {
            self.ctx
                .prompter
                .error("Let's Encrypt manager not available. Cannot request certificates.");
            return false;
        };

        if !config.nginx.letsencrypt_issued {
            self.ensure_fallback_certificate(config);
        }
        self.ctx
            .prompter
            .info("Requesting Let's Encrypt certificate in webroot mode...");
        if let Err(e) = issuer.request_certificate(&domain, ChallengeMode::Webroot, false) {
            self.ctx.report_failure("Certificate request failed", &e);
            if !config.nginx.letsencrypt_issued {
                self.ctx.prompter.info(&format!(
                    "nginx keeps serving the certificate in {} until a request succeeds.",
                    config.server_certs_dir().display()
                ));
            }
            return false;
        }

        self.ctx.prompter.success(&format!(
            "Let's Encrypt certificate obtained for {domain}"
        ));
        self.activate_issued_certificate(config);
        true
    }

    /// Point the proxy at the live certificate and reload it
    fn activate_issued_certificate(&mut self, config: &mut DeploymentConfig) {
        config.nginx.letsencrypt_issued = true;
        self.ctx.persist(config);

        let Some(artifacts) = self.ctx.artifacts else {
            return;
        };
        if let Err(e) = artifacts.regenerate_proxy_config(config) {
            tracing::warn!(error = %e, "proxy configuration regeneration failed");
            self.ctx
                .prompter
                .error(&format!("Failed to regenerate nginx configuration: {e}"));
            return;
        }
        if let Some(services) = self.ctx.services {
            self.ctx
                .prompter
                .info("Restarting nginx-edge to load the Let's Encrypt certificate...");
            if let Err(e) = services.restart_service(NGINX_EDGE_SERVICE) {
                self.ctx
                    .report_failure("Warning: Failed to restart nginx-edge", &e);
            }
        }
    }

    /// Make sure `server_certs` holds a certificate nginx can start with
    pub(crate) fn ensure_fallback_certificate(&mut self, config: &DeploymentConfig) {
        let cert = config.server_certs_dir().join("server.crt");
        if self.ctx.probe.exists(&cert) {
            return;
        }
        self.ctx.prompter.info(
            "Generating a temporary self-signed certificate for nginx until Let's Encrypt issues one...",
        );
        self.regenerate_self_signed_quietly(config);
    }

    fn keep_previous(&mut self, previous: HttpsMode) {
        self.ctx.prompter.error(&format!(
            "Failed to switch to Let's Encrypt. Keeping {previous} mode."
        ));
    }

    /// Put `previous` back and regenerate artifacts for it, best effort
    fn restore_mode(&mut self, config: &mut DeploymentConfig, previous: HttpsMode) {
        config.nginx.https_mode = previous;
        config.nginx.letsencrypt_issued = false;
        if let Some(artifacts) = self.ctx.artifacts {
            let restored = artifacts
                .regenerate_proxy_config(config)
                .and_then(|_| artifacts.regenerate_compose_config(config));
            if let Err(e) = restored {
                tracing::warn!(error = %e, "could not regenerate artifacts for restored mode");
            }
        }
        tracing::info!(mode = %previous, "HTTPS mode restored");
        self.keep_previous(previous);
    }

    /// Switch an existing deployment to self-signed
    ///
    /// The mode is kept even when generation is impossible; the operator is
    /// told to provide the certificate manually.
    pub fn switch_to_self_signed(&mut self, config: &mut DeploymentConfig) {
        config.nginx.https_mode = HttpsMode::SelfSigned;
        config.nginx.letsencrypt_issued = false;
        self.ctx
            .prompter
            .success("HTTPS mode updated to self_signed");

        let domain = self.domain_or_fallback(config);
        self.show_self_signed_info(&domain);
        let certs_dir = config.server_certs_dir();

        match self.ctx.managers.certificate_authority {
            None => self
                .ctx
                .prompter
                .error("Certificate Authority manager not available. Cannot generate certificates."),
            Some(authority) if !authority.is_available() => {
                self.ctx
                    .prompter
                    .error("OpenSSL is not available. Cannot generate self-signed certificate.");
                self.ctx.prompter.warn(
                    "Proceeding with self-signed mode, but you will need to provide certificates manually.",
                );
            }
            Some(authority) => match authority.generate_self_signed(&certs_dir, &domain) {
                Ok(_) => self.ctx.prompter.success(&format!(
                    "Self-signed certificate successfully generated for {domain}"
                )),
                Err(e) => {
                    self.ctx
                        .report_failure("Failed to generate self-signed certificate", &e);
                    self.ctx.prompter.warn(&format!(
                        "You will need to manually provide certificates in {}",
                        certs_dir.display()
                    ));
                }
            },
        }
        self.ctx.persist(config);
    }

    /// Regenerate the self-signed certificate without prompting
    pub fn regenerate_self_signed_quietly(&mut self, config: &DeploymentConfig) {
        let domain = if config.nginx.domain.is_empty() {
            FALLBACK_DOMAIN.to_string()
        } else {
            config.nginx.domain.clone()
        };
        match self.ctx.managers.certificate_authority {
            Some(authority) if authority.is_available() => {
                match authority.generate_self_signed(&config.server_certs_dir(), &domain) {
                    Ok(_) => self.ctx.prompter.success(&format!(
                        "Self-signed certificate generated for {domain}"
                    )),
                    Err(e) => self
                        .ctx
                        .report_failure("Failed to generate self-signed certificate", &e),
                }
            }
            _ => self.ctx.prompter.warn(&format!(
                "Provide a certificate for {domain} in {}",
                config.server_certs_dir().display()
            )),
        }
    }

    fn domain_or_fallback(&mut self, config: &mut DeploymentConfig) -> String {
        if config.nginx.domain.is_empty() {
            self.ctx
                .prompter
                .warn("No domain set. Using localhost as fallback.");
            config.nginx.domain = FALLBACK_DOMAIN.to_string();
        }
        config.nginx.domain.clone()
    }

    fn show_self_signed_info(&mut self, domain: &str) {
        self.ctx.prompter.panel(
            "Self-Signed Certificate Generation",
            &[
                format!("A self-signed certificate will be generated for '{domain}'."),
                "This certificate will not be trusted by browsers, but is suitable for testing and development."
                    .to_string(),
            ],
        );
    }

    pub(crate) fn show_not_resolvable(&mut self, domain: &str) {
        tracing::info!(domain, "domain not publicly resolvable");
        self.ctx.prompter.panel(
            "Let's Encrypt Not Available",
            &[
                format!("The domain \"{domain}\" could not be resolved using public DNS servers (Quad9)."),
                "Let's Encrypt requires a publicly resolvable domain to issue certificates.".to_string(),
                "You can use self-signed or custom certificates for your setup.".to_string(),
            ],
        );
    }
}
