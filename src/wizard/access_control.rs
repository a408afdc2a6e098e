//! Access control configurator
//!
//! Settles `nginx.security.type` through
//! `ChoosingType -> {NoAuth, BasicAuth, ClientCert} -> Settled`. The basic
//! auth path blocks until the password file exists or the operator asks to
//! return to the type selection. Initial setup and later modification run the
//! same machine.

use super::WizardContext;
use crate::error::ToolError;
use crate::prompt::{Choice, Validator, choose};
use starter_common::{DeploymentConfig, SecurityType};
use std::path::Path;

/// Suggested name of the first client certificate
pub const DEFAULT_CLIENT_CERT_NAME: &str = "TeddyCloudClient01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    ChoosingType,
    NoAuth,
    BasicAuth,
    ClientCert,
    Settled(SecurityType),
}

/// How the wait for the password file ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Found,
    ReturnToMenu,
}

fn validate_cert_name(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("Certificate name cannot be empty".to_string())
    } else {
        Ok(())
    }
}

pub struct AccessControlConfigurator<'c, 'a> {
    ctx: &'c mut WizardContext<'a>,
}

impl<'c, 'a> AccessControlConfigurator<'c, 'a> {
    pub fn new(ctx: &'c mut WizardContext<'a>) -> Self {
        Self { ctx }
    }

    /// Run until a security type is settled, then persist it
    pub fn configure(&mut self, config: &mut DeploymentConfig) -> SecurityType {
        let mut state = AccessState::ChoosingType;
        let settled = loop {
            state = match state {
                AccessState::ChoosingType => self.choose_type(config.nginx.security.kind),
                AccessState::NoAuth => AccessState::Settled(SecurityType::None),
                AccessState::BasicAuth => self.basic_auth(config),
                AccessState::ClientCert => self.client_cert(config),
                AccessState::Settled(kind) => break kind,
            };
            tracing::debug!(?state, "access control transition");
        };

        config.nginx.security.kind = settled;
        tracing::info!(security_type = %settled, "security type settled");
        self.ctx.persist(config);
        settled
    }

    fn choose_type(&mut self, current: SecurityType) -> AccessState {
        match choose(
            &mut *self.ctx.prompter,
            "How would you like to secure your TeddyCloud instance?",
            &SecurityType::all(),
            current,
        ) {
            Some(SecurityType::None) => AccessState::NoAuth,
            Some(SecurityType::BasicAuth) => AccessState::BasicAuth,
            Some(SecurityType::ClientCert) => AccessState::ClientCert,
            None => AccessState::Settled(current),
        }
    }

    fn basic_auth(&mut self, config: &DeploymentConfig) -> AccessState {
        let choices = [
            Choice::new("generate", "Generate .htpasswd file with the wizard"),
            Choice::new("provide", "I'll provide my own .htpasswd file"),
        ];
        let Some(option) = self.ctx.prompter.select(
            "How would you like to handle the .htpasswd file?",
            &choices,
            "generate",
        ) else {
            return AccessState::ChoosingType;
        };

        let security_dir = config.security_dir();
        if let Err(e) = std::fs::create_dir_all(&security_dir) {
            tracing::warn!(path = %security_dir.display(), error = %e, "could not create security directory");
        }
        let htpasswd = config.htpasswd_path();

        if option == "generate" {
            self.generate_htpasswd(&htpasswd);
        } else {
            self.ctx.prompter.info(&format!(
                "Remember to place your .htpasswd file at {}",
                htpasswd.display()
            ));
        }

        match self.wait_for_file(&htpasswd) {
            WaitOutcome::Found => AccessState::Settled(SecurityType::BasicAuth),
            WaitOutcome::ReturnToMenu => AccessState::ChoosingType,
        }
    }

    fn generate_htpasswd(&mut self, path: &Path) {
        let Some(generator) = self.ctx.managers.basic_auth else {
            self.ctx
                .prompter
                .error("Basic auth manager not available. Cannot generate .htpasswd file.");
            self.ctx.prompter.info(&format!(
                "Please create the .htpasswd file manually at {}",
                path.display()
            ));
            return;
        };

        self.ctx
            .prompter
            .info("Let's create a .htpasswd file with your users and passwords.");
        match generator.generate_htpasswd(path, &mut *self.ctx.prompter) {
            Ok(()) => self.ctx.prompter.success(&format!(
                ".htpasswd file successfully created at {}",
                path.display()
            )),
            Err(ToolError::Cancelled { .. }) => self
                .ctx
                .prompter
                .warn("No users entered. The .htpasswd file was not created."),
            Err(e) => {
                self.ctx.report_failure("Failed to create .htpasswd file", &e);
                self.ctx
                    .prompter
                    .info("You may need to create it manually.");
            }
        }
    }

    /// Block until `path` exists or the operator returns to the menu
    ///
    /// Polls every `poll_interval` with no timeout. A cancelled confirmation
    /// keeps waiting.
    pub fn wait_for_file(&mut self, path: &Path) -> WaitOutcome {
        if self.ctx.probe.exists(path) {
            self.ctx
                .prompter
                .success(".htpasswd file found and ready to use.");
            return WaitOutcome::Found;
        }

        self.ctx
            .prompter
            .warn(".htpasswd file not found. You must add it to continue.");
        self.ctx.prompter.info(&format!(
            "Waiting for .htpasswd file to be added at {}",
            path.display()
        ));
        tracing::info!(path = %path.display(), "waiting for password file");

        loop {
            self.ctx.probe.sleep(self.ctx.poll_interval);
            if self.ctx.probe.exists(path) {
                self.ctx
                    .prompter
                    .success(".htpasswd file found! Continuing...");
                return WaitOutcome::Found;
            }

            self.ctx.prompter.warn(&format!(
                "Still waiting for .htpasswd file at: {}",
                path.display()
            ));
            if self
                .ctx
                .prompter
                .confirm("Do you want to return to the security selection menu?", false)
                == Some(true)
            {
                self.ctx
                    .prompter
                    .info("Returning to security selection menu...");
                return WaitOutcome::ReturnToMenu;
            }
        }
    }

    fn client_cert(&mut self, config: &DeploymentConfig) -> AccessState {
        let choices = [
            Choice::new("generate", "Generate certificates for me"),
            Choice::new("provide", "I'll provide my own certificates"),
        ];
        let Some(source) = self.ctx.prompter.select(
            "How would you like to handle client certificates?",
            &choices,
            "generate",
        ) else {
            return AccessState::ChoosingType;
        };

        if source != "generate" {
            self.ctx.prompter.info(&format!(
                "Place the CA certificate that signed your client certificates at {}",
                config.client_certs_dir().join("ca").join("ca.crt").display()
            ));
            return AccessState::Settled(SecurityType::ClientCert);
        }

        let validator: Validator<'_> = &validate_cert_name;
        let Some(name) = self.ctx.prompter.text(
            "Enter a name for the client certificate:",
            DEFAULT_CLIENT_CERT_NAME,
            Some(validator),
        ) else {
            return AccessState::Settled(SecurityType::ClientCert);
        };

        match self.ctx.managers.client_certs {
            None => self
                .ctx
                .prompter
                .error("Client certificate manager not available. Cannot generate certificates."),
            Some(generator) => match generator.generate_client_cert(&name) {
                Ok(info) => {
                    self.ctx
                        .prompter
                        .success("Client certificate successfully created.");
                    self.ctx.prompter.panel(
                        &format!("Client certificate {}", info.name),
                        &[
                            format!("Certificate: {}", info.cert_path.display()),
                            format!("Key:         {}", info.key_path.display()),
                            format!("Bundle:      {}", info.bundle_path.display()),
                        ],
                    );
                }
                Err(e) => self
                    .ctx
                    .report_failure("Failed to create client certificate. Please try again", &e),
            },
        }
        AccessState::Settled(SecurityType::ClientCert)
    }
}
