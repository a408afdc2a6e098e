//! Container runtime adapter
//!
//! Generates the compose manifest and starts or restarts the fixed set of
//! named services through the docker CLI.

mod composer;

pub use composer::DockerComposeGenerator;

use crate::error::ToolError;
use crate::system::{command_exists, run_command, run_with_spinner};
use std::path::{Path, PathBuf};

/// Runtime state of a named container
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ServiceState {
    Running,
    /// Container exists but is not running (exited, created, paused, ...)
    Stopped,
    NotFound,
    /// docker could not be queried
    Unknown,
}

/// Start, restart and query the deployment's services
pub trait ServiceController {
    fn service_status(&self, name: &str) -> ServiceState;

    fn start_service(&self, name: &str) -> Result<(), ToolError>;

    fn restart_service(&self, name: &str) -> Result<(), ToolError>;

    /// Force-remove a leftover container, absence is not an error
    fn remove_container(&self, name: &str) -> Result<(), ToolError>;

    /// Bring up every service of the deployment
    fn start_all(&self) -> Result<(), ToolError>;
}

/// docker CLI backed controller bound to one compose manifest
#[derive(Debug, Clone)]
pub struct DockerManager {
    compose_file: PathBuf,
}

impl DockerManager {
    pub fn new(compose_file: impl Into<PathBuf>) -> Self {
        Self {
            compose_file: compose_file.into(),
        }
    }

    pub fn compose_file(&self) -> &Path {
        &self.compose_file
    }

    /// Check whether docker and the compose plugin are usable
    pub fn is_available(&self) -> bool {
        command_exists("docker")
            && run_command("docker", &["compose", "version"])
                .map(|output| output.success())
                .unwrap_or(false)
    }

    fn compose_args(&self, tail: &[&str]) -> Vec<String> {
        let mut args = vec![
            "compose".to_string(),
            "-f".to_string(),
            self.compose_file.display().to_string(),
        ];
        args.extend(tail.iter().map(|arg| arg.to_string()));
        args
    }
}

/// Map the `{{.State}}` column of `docker ps` to a state
fn parse_state(stdout: &str) -> ServiceState {
    match stdout.lines().map(str::trim).find(|line| !line.is_empty()) {
        None => ServiceState::NotFound,
        Some(state) if state.eq_ignore_ascii_case("running") => ServiceState::Running,
        Some(_) => ServiceState::Stopped,
    }
}

impl ServiceController for DockerManager {
    fn service_status(&self, name: &str) -> ServiceState {
        let filter = format!("name=^/?{name}$");
        match run_command(
            "docker",
            &["ps", "-a", "--filter", filter.as_str(), "--format", "{{.State}}"],
        ) {
            Ok(output) if output.success() => parse_state(&output.stdout),
            Ok(_) | Err(_) => ServiceState::Unknown,
        }
    }

    fn start_service(&self, name: &str) -> Result<(), ToolError> {
        let args = self.compose_args(&["up", "-d", name]);
        run_with_spinner(&format!("Starting {name}..."), "docker", &args)?
            .into_result("docker compose")?;
        tracing::info!(service = name, "service started");
        Ok(())
    }

    fn restart_service(&self, name: &str) -> Result<(), ToolError> {
        let args = self.compose_args(&["restart", name]);
        run_with_spinner(&format!("Restarting {name}..."), "docker", &args)?
            .into_result("docker compose")?;
        tracing::info!(service = name, "service restarted");
        Ok(())
    }

    fn remove_container(&self, name: &str) -> Result<(), ToolError> {
        let output = run_command("docker", &["rm", "-f", name])?;
        if !output.success() && !output.stderr.contains("No such container") {
            return output.into_result("docker rm").map(|_| ());
        }
        Ok(())
    }

    fn start_all(&self) -> Result<(), ToolError> {
        let args = self.compose_args(&["up", "-d"]);
        run_with_spinner("Starting services...", "docker", &args)?.into_result("docker compose")?;
        tracing::info!(compose_file = %self.compose_file.display(), "services started");
        Ok(())
    }
}
