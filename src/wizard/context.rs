//! Collaborators shared by every configurator

use crate::docker::ServiceController;
use crate::error::ToolError;
use crate::prompt::Prompter;
use crate::security::SecurityManagers;
use crate::system::PreconditionChecker;
use crate::template::ArtifactRegenerator;
use starter_common::{ConfigSink, DeploymentConfig};
use std::path::Path;
use std::time::Duration;

/// Default interval of the wait-for-file loop
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// File existence probe and clock used by the wait loop
pub trait ArtifactProbe {
    fn exists(&self, path: &Path) -> bool;

    fn sleep(&self, interval: Duration);
}

/// Real filesystem and thread sleep
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

impl ArtifactProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn sleep(&self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

/// Everything a configurator may call out to
///
/// The configuration itself is never stored here; it is passed to each
/// operation by mutable reference.
pub struct WizardContext<'a> {
    pub prompter: &'a mut dyn Prompter,
    pub checker: &'a dyn PreconditionChecker,
    pub managers: SecurityManagers<'a>,
    pub artifacts: Option<&'a dyn ArtifactRegenerator>,
    pub services: Option<&'a dyn ServiceController>,
    pub probe: &'a dyn ArtifactProbe,
    pub store: &'a dyn ConfigSink,
    pub poll_interval: Duration,
}

impl<'a> WizardContext<'a> {
    pub fn new(
        prompter: &'a mut dyn Prompter,
        checker: &'a dyn PreconditionChecker,
        probe: &'a dyn ArtifactProbe,
        store: &'a dyn ConfigSink,
    ) -> Self {
        Self {
            prompter,
            checker,
            managers: SecurityManagers::default(),
            artifacts: None,
            services: None,
            probe,
            store,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_managers(mut self, managers: SecurityManagers<'a>) -> Self {
        self.managers = managers;
        self
    }

    pub fn with_artifacts(mut self, artifacts: &'a dyn ArtifactRegenerator) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn with_services(mut self, services: &'a dyn ServiceController) -> Self {
        self.services = Some(services);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Save after a settled transition; failures are reported, never fatal
    pub fn persist(&mut self, config: &DeploymentConfig) -> bool {
        match self.store.save(config) {
            Ok(()) => {
                tracing::debug!("configuration saved");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save configuration");
                self.prompter
                    .error(&format!("Failed to save configuration: {e}"));
                false
            }
        }
    }

    /// Show a tool failure together with whatever the tool printed
    pub fn report_failure(&mut self, message: &str, err: &ToolError) {
        tracing::warn!(error = %err, "{message}");
        self.prompter.error(&format!("{message}: {err}"));
        if let Some((stdout, stderr)) = err.output() {
            let lines: Vec<String> = stdout
                .lines()
                .chain(stderr.lines())
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect();
            if !lines.is_empty() {
                self.prompter.panel("Tool output", &lines);
            }
        }
    }
}
