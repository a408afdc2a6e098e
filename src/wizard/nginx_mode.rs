//! Deployment config mutator for nginx mode
//!
//! Sequences the certificate engine, the access control configurator and the
//! IP restriction configurator during setup, and provides the in-place
//! modification entry points used after setup.

use super::access_control::AccessControlConfigurator;
use super::certificate::{CertificateEngine, offered_modes};
use super::ip_restrictions::IpRestrictionConfigurator;
use super::{WizardContext, domain_validator};
use crate::prompt::{Validator, choose};
use starter_common::{DeploymentConfig, DeploymentMode, HttpsMode};

pub struct NginxModeConfigurator<'c, 'a> {
    ctx: &'c mut WizardContext<'a>,
}

impl<'c, 'a> NginxModeConfigurator<'c, 'a> {
    pub fn new(ctx: &'c mut WizardContext<'a>) -> Self {
        Self { ctx }
    }

    /// Configure nginx mode from scratch
    ///
    /// Returns `false` when the operator backed out; `config` is then left
    /// exactly as it was.
    pub fn configure(&mut self, config: &mut DeploymentConfig) -> bool {
        let snapshot = config.clone();
        if self.configure_inner(config) {
            return true;
        }
        *config = snapshot;
        self.ctx.persist(config);
        tracing::info!("nginx mode configuration abandoned");
        false
    }

    fn configure_inner(&mut self, config: &mut DeploymentConfig) -> bool {
        if !config.has_project_path() {
            self.ctx
                .prompter
                .warn("Project path not set. Using current directory.");
        }

        let mut ports_busy = false;
        for port in [80, 443] {
            if !self.ctx.checker.port_available(port) {
                self.ctx.prompter.warn(&format!(
                    "Port {port} appears to be in use. This is required for Nginx."
                ));
                ports_busy = true;
            }
        }
        if ports_busy
            && self
                .ctx
                .prompter
                .confirm("Do you want to continue anyway?", false)
                != Some(true)
        {
            return false;
        }

        if config.nginx.domain.is_empty() {
            let Some(domain) = self.prompt_domain("") else {
                return false;
            };
            config.nginx.domain = domain;
        }

        config.mode = DeploymentMode::Proxied;
        if CertificateEngine::new(&mut *self.ctx).settle(config).is_none() {
            return false;
        }

        AccessControlConfigurator::new(&mut *self.ctx).configure(config);
        IpRestrictionConfigurator::new(&mut *self.ctx).configure(config);
        true
    }

    fn prompt_domain(&mut self, current: &str) -> Option<String> {
        let validator: Validator<'_> = &domain_validator;
        self.ctx
            .prompter
            .text(
                "Enter the domain name for your TeddyCloud instance:",
                current,
                Some(validator),
            )
            .map(|domain| domain.trim().to_lowercase())
    }

    /// Change the HTTPS mode of an existing deployment
    ///
    /// Picking the current mode again changes nothing.
    pub fn modify_https_mode(&mut self, config: &mut DeploymentConfig) {
        let current = config.nginx.https_mode;
        self.ctx
            .prompter
            .info(&format!("Current HTTPS mode: {current}"));

        let resolvable = !config.nginx.domain.is_empty()
            && self.ctx.checker.domain_resolvable(&config.nginx.domain);
        let (modes, _) = offered_modes(resolvable);
        if !resolvable {
            self.ctx.prompter.info(
                "Let's Encrypt is not offered because the domain is not publicly resolvable.",
            );
        }

        let default = if modes.contains(&current) {
            current
        } else {
            HttpsMode::SelfSigned
        };
        let Some(selected) = choose(
            &mut *self.ctx.prompter,
            "How would you like to handle HTTPS?",
            &modes,
            default,
        ) else {
            return;
        };

        if selected == current {
            self.ctx.prompter.info("HTTPS mode unchanged.");
            return;
        }
        tracing::info!(from = %current, to = %selected, "changing HTTPS mode");

        match selected {
            HttpsMode::Letsencrypt => {
                CertificateEngine::new(&mut *self.ctx).switch_to_letsencrypt(config, current);
            }
            HttpsMode::SelfSigned => {
                CertificateEngine::new(&mut *self.ctx).switch_to_self_signed(config);
            }
            HttpsMode::UserProvided => {
                config.nginx.https_mode = HttpsMode::UserProvided;
                config.nginx.letsencrypt_issued = false;
                self.ctx
                    .prompter
                    .success("HTTPS mode updated to user_provided");
                self.ctx.prompter.info(&format!(
                    "Place your certificate and key as server.crt and server.key in {}",
                    config.server_certs_dir().display()
                ));
                self.ctx.persist(config);
            }
            HttpsMode::None => {}
        }
    }

    /// Change the domain; a Let's Encrypt deployment whose new domain is not
    /// publicly resolvable drops to self-signed without asking
    pub fn modify_domain(&mut self, config: &mut DeploymentConfig) {
        let current = config.nginx.domain.clone();
        let shown: &str = if current.is_empty() { "Not set" } else { &current };
        self.ctx
            .prompter
            .info(&format!("Current domain name: {shown}"));

        let Some(domain) = self.prompt_domain(&current) else {
            return;
        };
        if domain == current {
            self.ctx.prompter.info("Domain name unchanged.");
            return;
        }

        config.nginx.domain = domain.clone();
        // an issued certificate belongs to the old domain
        config.nginx.letsencrypt_issued = false;
        tracing::info!(from = %current, to = %domain, "domain changed");
        self.ctx
            .prompter
            .success(&format!("Domain name updated to {domain}"));

        if config.nginx.https_mode == HttpsMode::Letsencrypt {
            if self.ctx.checker.domain_resolvable(&domain) {
                CertificateEngine::new(&mut *self.ctx).ensure_fallback_certificate(config);
                self.ctx.prompter.info(&format!(
                    "Request the Let's Encrypt certificate for {domain} from the certificate menu option."
                ));
            } else {
                CertificateEngine::new(&mut *self.ctx).show_not_resolvable(&domain);
                config.nginx.https_mode = HttpsMode::SelfSigned;
                tracing::info!(domain = %domain, "downgraded to self-signed");
                self.ctx
                    .prompter
                    .success("HTTPS mode updated to self-signed certificates.");
                CertificateEngine::new(&mut *self.ctx).regenerate_self_signed_quietly(config);
            }
        }
        self.ctx.persist(config);
    }

    /// Request the pending Let's Encrypt certificate through the running proxy
    pub fn request_certificate(&mut self, config: &mut DeploymentConfig) {
        CertificateEngine::new(&mut *self.ctx).request_pending_certificate(config);
    }

    /// Re-run the access control configurator with the current type as default
    pub fn modify_security_settings(&mut self, config: &mut DeploymentConfig) {
        self.ctx.prompter.info(&format!(
            "Current security type: {}",
            config.nginx.security.kind
        ));
        AccessControlConfigurator::new(&mut *self.ctx).configure(config);
        self.ctx
            .prompter
            .info("IP address restrictions can be configured in the dedicated menu option.");
    }

    pub fn modify_ip_restrictions(&mut self, config: &mut DeploymentConfig) {
        self.ctx.prompter.info("Configure IP Address Filtering");
        let allowed = &config.nginx.security.allowed_ips;
        if allowed.is_empty() {
            self.ctx
                .prompter
                .info("No IP restrictions currently active");
        } else {
            self.ctx
                .prompter
                .info(&format!("Current allowed IPs: {}", allowed.join(", ")));
        }
        IpRestrictionConfigurator::new(&mut *self.ctx).edit_allowed(config);
    }

    /// Only applies while basic auth is the security type
    pub fn configure_auth_bypass_ips(&mut self, config: &mut DeploymentConfig) {
        IpRestrictionConfigurator::new(&mut *self.ctx).edit_auth_bypass(config);
    }
}
