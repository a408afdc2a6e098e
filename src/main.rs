//! TeddyCloud setup wizard
//!
//! Loads the deployment configuration, wires the process-backed
//! collaborators into a `WizardContext` and dispatches the subcommand.

mod cli;

use anyhow::{Context, bail};
use clap::Parser;
use cli::{Cli, Commands, ModifyTarget};
use starter_common::{ConfigSink, ConfigStore, DeploymentConfig};
use std::path::PathBuf;
use teddycloud_starter::docker::DockerManager;
use teddycloud_starter::observability::{LogSettings, init_observability};
use teddycloud_starter::prompt::{DialoguerPrompter, Prompter, choose};
use teddycloud_starter::security::{
    BasicAuthManager, ClientCertManager, LetsEncryptManager, OpenSslAuthority, SecurityManagers,
};
use teddycloud_starter::system::{NetworkProbe, check_environment};
use teddycloud_starter::template::DeploymentArtifacts;
use teddycloud_starter::wizard::{
    FsProbe, NginxModeConfigurator, SetupWizard, WizardContext, select_project_path,
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let guard = init_observability(&LogSettings {
        debug: cli.debug,
        log_dir: cli.log_dir.clone(),
    })?;
    if guard.writes_to_file() {
        info!(version = env!("CARGO_PKG_VERSION"), "teddycloud-starter starting");
    }

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let store = ConfigStore::new(&config_path);
    let mut config = store
        .load()
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    info!(path = %config_path.display(), mode = %config.mode, "configuration loaded");

    let mut prompter = DialoguerPrompter::new();
    match cli.command.clone().unwrap_or(Commands::Setup) {
        Commands::Setup => {
            prompter.clear();
            prompter.header("TeddyCloud Setup Wizard");
            if !config.has_project_path() {
                let cwd = std::env::current_dir().context("Failed to read current directory")?;
                select_project_path(&mut prompter, &store, &mut config, &cwd);
            }
            let collaborators = Collaborators::for_config(&config, cli.email.as_deref());
            let mut ctx = collaborators.context(&mut prompter, &store);
            SetupWizard::new(&mut ctx).run(&mut config);
        }
        Commands::Modify { target } => {
            if !config.is_proxied() {
                bail!("Modification is only available for nginx mode deployments. Run setup first.");
            }
            prompter.header("Modify nginx configuration");
            let collaborators = Collaborators::for_config(&config, cli.email.as_deref());
            let mut ctx = collaborators.context(&mut prompter, &store);
            run_modify(&mut ctx, &mut config, target);
        }
        Commands::Regenerate => {
            let collaborators = Collaborators::for_config(&config, cli.email.as_deref());
            let mut ctx = collaborators.context(&mut prompter, &store);
            if !SetupWizard::new(&mut ctx).regenerate(&config) {
                bail!("Failed to regenerate configuration files");
            }
        }
        Commands::Show => show_configuration(&mut prompter, &config, &config_path),
        Commands::Check => {
            let report = check_environment(&NetworkProbe::default(), &config.ports);
            let lines: Vec<String> = report.items.iter().map(|item| item.line()).collect();
            prompter.panel("Environment check", &lines);
            if !report.all_critical_ok {
                bail!(report.summary_message());
            }
            prompter.success(report.summary_message());
        }
    }

    Ok(())
}

fn default_config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine the home directory")?;
    Ok(home.join(".teddycloudstarter").join("config.json"))
}

/// Process-backed implementations of every wizard collaborator
struct Collaborators {
    checker: NetworkProbe,
    probe: FsProbe,
    authority: OpenSslAuthority,
    client_certs: ClientCertManager,
    basic_auth: BasicAuthManager,
    lets_encrypt: LetsEncryptManager,
    artifacts: DeploymentArtifacts,
    services: DockerManager,
}

impl Collaborators {
    fn for_config(config: &DeploymentConfig, email: Option<&str>) -> Self {
        let mut lets_encrypt = LetsEncryptManager::new(DockerManager::new(config.compose_file()));
        if let Some(email) = email {
            lets_encrypt = lets_encrypt.with_email(email);
        }
        Self {
            checker: NetworkProbe::default(),
            probe: FsProbe,
            authority: OpenSslAuthority::new(),
            client_certs: ClientCertManager::new(config.client_certs_dir()),
            basic_auth: BasicAuthManager::new(),
            lets_encrypt,
            artifacts: DeploymentArtifacts::default(),
            services: DockerManager::new(config.compose_file()),
        }
    }

    fn context<'a>(
        &'a self,
        prompter: &'a mut dyn Prompter,
        store: &'a dyn ConfigSink,
    ) -> WizardContext<'a> {
        let managers = SecurityManagers {
            lets_encrypt: Some(&self.lets_encrypt),
            certificate_authority: Some(&self.authority),
            client_certs: Some(&self.client_certs),
            basic_auth: Some(&self.basic_auth),
        };
        WizardContext::new(prompter, &self.checker, &self.probe, store)
            .with_managers(managers)
            .with_artifacts(&self.artifacts)
            .with_services(&self.services)
    }
}

fn run_modify(ctx: &mut WizardContext<'_>, config: &mut DeploymentConfig, target: Option<ModifyTarget>) {
    let target = match target {
        Some(target) => target,
        None => match choose(
            &mut *ctx.prompter,
            "What would you like to modify?",
            &ModifyTarget::ALL,
            ModifyTarget::Https,
        ) {
            Some(target) => target,
            None => return,
        },
    };
    info!(?target, "modifying nginx configuration");

    let before = config.clone();
    {
        let mut configurator = NginxModeConfigurator::new(&mut *ctx);
        match target {
            ModifyTarget::Https => configurator.modify_https_mode(config),
            ModifyTarget::Domain => configurator.modify_domain(config),
            ModifyTarget::Security => configurator.modify_security_settings(config),
            ModifyTarget::IpRestrictions => configurator.modify_ip_restrictions(config),
            ModifyTarget::AuthBypass => configurator.configure_auth_bypass_ips(config),
            ModifyTarget::Certificate => configurator.request_certificate(config),
        }
    }

    if *config == before {
        return;
    }
    let mut wizard = SetupWizard::new(ctx);
    if wizard.regenerate(config) {
        wizard.offer_service_start(config);
    }
}

fn show_configuration(prompter: &mut dyn Prompter, config: &DeploymentConfig, path: &std::path::Path) {
    let or_unset = |value: &str| {
        if value.is_empty() {
            "Not set".to_string()
        } else {
            value.to_string()
        }
    };
    let project = config
        .environment
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "Not set".to_string());

    let mut lines = vec![
        format!("Configuration file: {}", path.display()),
        format!("Project path: {project}"),
        format!("Deployment mode: {}", config.mode),
    ];
    if config.is_proxied() {
        let security = &config.nginx.security;
        lines.push(format!("Domain: {}", or_unset(&config.nginx.domain)));
        lines.push(format!("HTTPS mode: {}", config.nginx.https_mode));
        lines.push(format!("Security type: {}", security.kind));
        lines.push(format!(
            "Allowed IPs: {}",
            or_unset(&security.allowed_ips.join(", "))
        ));
        lines.push(format!(
            "Auth bypass IPs: {}",
            or_unset(&security.auth_bypass_ips.join(", "))
        ));
    } else {
        let ports = &config.ports;
        lines.push(format!("Admin HTTP port: {}", ports.admin_http));
        lines.push(format!("Admin HTTPS port: {}", ports.admin_https));
        lines.push(format!("TeddyCloud port: {}", ports.teddycloud));
    }
    prompter.panel("Current configuration", &lines);
}
