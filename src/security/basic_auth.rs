//! .htpasswd generation with bcrypt hashes

use super::HtpasswdGenerator;
use crate::error::ToolError;
use crate::prompt::{Prompter, Validator};
use crate::system::{command_exists, run_command};
use std::path::Path;

const HTTPD_IMAGE: &str = "httpd:2.4-alpine";

/// Where the `htpasswd` binary comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HtpasswdTool {
    Local,
    Docker,
}

/// Collects users interactively and hashes them with `htpasswd -nbB`
#[derive(Debug, Default)]
pub struct BasicAuthManager;

impl BasicAuthManager {
    pub fn new() -> Self {
        Self
    }

    fn tool(&self) -> Option<HtpasswdTool> {
        if command_exists("htpasswd") {
            Some(HtpasswdTool::Local)
        } else if command_exists("docker") {
            Some(HtpasswdTool::Docker)
        } else {
            None
        }
    }

    /// One `user:hash` line
    fn hash_entry(&self, tool: HtpasswdTool, user: &str, password: &str) -> Result<String, ToolError> {
        let output = match tool {
            HtpasswdTool::Local => run_command("htpasswd", &["-nbB", user, password])?,
            HtpasswdTool::Docker => run_command(
                "docker",
                &["run", "--rm", HTTPD_IMAGE, "htpasswd", "-nbB", user, password],
            )?,
        }
        .into_result("htpasswd")?;

        find_entry(&output.stdout, user).ok_or_else(|| ToolError::Failed {
            tool: "htpasswd".to_string(),
            code: Some(0),
            stdout: output.stdout.clone(),
            stderr: "no entry in output".to_string(),
        })
    }
}

/// The `user:hash` line for `user` in htpasswd output
fn find_entry(stdout: &str, user: &str) -> Option<String> {
    let prefix = format!("{}:", user.trim());
    stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(&prefix))
        .map(str::to_string)
}

/// Usernames may not be empty or contain ':'
pub(crate) fn validate_username(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        Err("Username cannot be empty".to_string())
    } else if value.contains(':') || value.chars().any(char::is_whitespace) {
        Err("Username cannot contain ':' or spaces".to_string())
    } else {
        Ok(())
    }
}

impl HtpasswdGenerator for BasicAuthManager {
    fn generate_htpasswd(&self, path: &Path, prompter: &mut dyn Prompter) -> Result<(), ToolError> {
        let tool = self.tool().ok_or_else(|| ToolError::unavailable("htpasswd"))?;
        if tool == HtpasswdTool::Docker {
            prompter.info("htpasswd not found locally, using the httpd docker image");
        }

        let validator: Validator<'_> = &validate_username;
        let mut entries: Vec<String> = Vec::new();
        loop {
            let Some(user) = prompter.text("Enter username:", "", Some(validator)) else {
                break;
            };
            let user = user.trim().to_string();
            if entries.iter().any(|entry| entry.starts_with(&format!("{user}:"))) {
                prompter.warn(&format!("User {user} was already added"));
                continue;
            }
            let Some(password) = prompter.password(&format!("Password for {user}:")) else {
                break;
            };
            if password.is_empty() {
                prompter.warn("Password cannot be empty");
                continue;
            }

            entries.push(self.hash_entry(tool, &user, &password)?);
            prompter.success(&format!("User {user} added"));

            if prompter.confirm("Add another user?", false) != Some(true) {
                break;
            }
        }

        if entries.is_empty() {
            return Err(ToolError::Cancelled {
                what: ".htpasswd generation".to_string(),
            });
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ToolError::io(format!("Failed to create {}", parent.display()), e))?;
        }
        let mut content = entries.join("\n");
        content.push('\n');
        std::fs::write(path, content)
            .map_err(|e| ToolError::io(format!("Failed to write {}", path.display()), e))?;

        tracing::info!(path = %path.display(), users = entries.len(), ".htpasswd written");
        Ok(())
    }
}
