//! Top-level setup flow

use super::WizardContext;
use super::certificate::CertificateEngine;
use super::direct_mode::configure_direct_mode;
use super::nginx_mode::NginxModeConfigurator;
use crate::prompt::{Choice, Prompter, Validator};
use starter_common::{ConfigSink, DeploymentConfig, DeploymentMode, HttpsMode};
use std::path::{Path, PathBuf};

fn path_validator(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("Path cannot be empty".to_string())
    } else {
        Ok(())
    }
}

/// Ask for the project directory, create it and record it in `config`
///
/// Cancelling keeps `default_dir`.
pub fn select_project_path(
    prompter: &mut dyn Prompter,
    store: &dyn ConfigSink,
    config: &mut DeploymentConfig,
    default_dir: &Path,
) -> PathBuf {
    prompter.info("Please select a directory for your TeddyCloud project");
    prompter.info(
        "This directory will be used to store all TeddyCloudStarter related data like certificates, and configuration files.",
    );

    let validator: Validator<'_> = &path_validator;
    let default_text = default_dir.display().to_string();
    let mut path = match prompter.text("Project directory:", &default_text, Some(validator)) {
        Some(value) => PathBuf::from(value.trim()),
        None => {
            prompter.warn(&format!(
                "No path selected. Using current directory: {}",
                default_dir.display()
            ));
            default_dir.to_path_buf()
        }
    };

    if let Err(e) = std::fs::create_dir_all(&path) {
        tracing::warn!(path = %path.display(), error = %e, "could not create project directory");
        prompter.error(&format!("Could not create {}: {e}", path.display()));
        path = default_dir.to_path_buf();
    }
    if let Ok(canonical) = path.canonicalize() {
        path = canonical;
    }

    config.set_project_path(&path);
    prompter.success(&format!("Project path set to: {}", path.display()));
    if let Err(e) = store.save(config) {
        tracing::warn!(error = %e, "failed to save configuration");
        prompter.error(&format!("Failed to save configuration: {e}"));
    }
    path
}

pub struct SetupWizard<'c, 'a> {
    ctx: &'c mut WizardContext<'a>,
}

impl<'c, 'a> SetupWizard<'c, 'a> {
    pub fn new(ctx: &'c mut WizardContext<'a>) -> Self {
        Self { ctx }
    }

    /// Deployment mode, its configuration, artifacts and service start
    pub fn run(&mut self, config: &mut DeploymentConfig) -> bool {
        self.ctx.prompter.info("Starting TeddyCloud setup wizard...");

        if !self.select_deployment_mode(config) {
            self.ctx
                .prompter
                .warn("Setup cancelled. The configuration was not changed.");
            return false;
        }

        self.ctx.persist(config);
        self.ctx
            .prompter
            .success("Configuration completed successfully!");

        self.regenerate(config);
        self.offer_service_start(config);
        true
    }

    /// Returns `false` when no mode was configured
    pub fn select_deployment_mode(&mut self, config: &mut DeploymentConfig) -> bool {
        let choices = [
            Choice::new(
                "direct",
                "Direct mode (Simplest, all services on one machine)",
            ),
            Choice::new("nginx", "Nginx mode (Advanced, uses nginx for routing)"),
        ];
        let default = config.mode.to_string();
        let Some(selected) = self
            .ctx
            .prompter
            .select("Select a deployment mode:", &choices, &default)
        else {
            return false;
        };

        let configured = if selected == "nginx" {
            NginxModeConfigurator::new(&mut *self.ctx).configure(config)
        } else {
            configure_direct_mode(&mut *self.ctx, config);
            true
        };

        if configured {
            self.ctx
                .prompter
                .success(&format!("Deployment mode set to: {}", config.mode));
        }
        configured
    }

    /// Write the compose manifest and, in nginx mode, the proxy configuration
    pub fn regenerate(&mut self, config: &DeploymentConfig) -> bool {
        let Some(artifacts) = self.ctx.artifacts else {
            self.ctx
                .prompter
                .warn("Configuration generator not available. Skipping file generation.");
            return false;
        };

        self.ctx.prompter.info("Generating configuration files...");
        let mut ok = true;
        match artifacts.regenerate_compose_config(config) {
            Ok(path) => self.ctx.prompter.success(&format!(
                "Successfully generated {}",
                path.display()
            )),
            Err(e) => {
                tracing::warn!(error = %e, "compose generation failed");
                self.ctx
                    .prompter
                    .error(&format!("Failed to generate docker-compose.yml: {e}"));
                ok = false;
            }
        }

        if config.mode == DeploymentMode::Proxied {
            match artifacts.regenerate_proxy_config(config) {
                Ok(path) => self.ctx.prompter.success(&format!(
                    "Successfully generated {}",
                    path.display()
                )),
                Err(e) => {
                    tracing::warn!(error = %e, "proxy configuration generation failed");
                    self.ctx
                        .prompter
                        .error(&format!("Failed to generate nginx configuration files: {e}"));
                    ok = false;
                }
            }
        }
        ok
    }

    /// Start the services, then request a still pending Let's Encrypt
    /// certificate through the now running proxy
    pub fn offer_service_start(&mut self, config: &mut DeploymentConfig) {
        let Some(services) = self.ctx.services else {
            return;
        };
        if self.ctx.prompter.confirm(
            "Want to start/restart services with the new configuration?",
            true,
        ) != Some(true)
        {
            return;
        }
        if let Err(e) = services.start_all() {
            self.ctx.report_failure("Failed to start services", &e);
            return;
        }
        self.ctx.prompter.success("Services started");

        if config.is_proxied()
            && config.nginx.https_mode == HttpsMode::Letsencrypt
            && !config.nginx.letsencrypt_issued
            && self
                .ctx
                .prompter
                .confirm("Request the Let's Encrypt certificate now?", true)
                == Some(true)
        {
            CertificateEngine::new(&mut *self.ctx).request_pending_certificate(config);
        }
    }
}
