//! Scripted prompter and in-memory collaborators for driving the wizard
#![allow(dead_code)]

use starter_common::{ConfigError, ConfigSink, DeploymentConfig, DeploymentMode};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;
use teddycloud_starter::docker::{ServiceController, ServiceState};
use teddycloud_starter::error::{Error, Result, ToolError};
use teddycloud_starter::prompt::{Choice, Level, Prompter, Validator};
use teddycloud_starter::security::{
    CertificateAuthority, CertificateIssuer, ChallengeMode, ClientCertGenerator, ClientCertInfo,
    HtpasswdGenerator, SecurityManagers, ServerCertificate,
};
use teddycloud_starter::system::PreconditionChecker;
use teddycloud_starter::template::ArtifactRegenerator;
use teddycloud_starter::wizard::{ArtifactProbe, WizardContext};

/// One scripted operator answer
#[derive(Debug, Clone)]
pub enum Answer {
    Select(&'static str),
    Confirm(bool),
    Text(&'static str),
    Password(&'static str),
    Cancel,
}

/// Replays answers in order; an exhausted script behaves like a cancel
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    /// Every question asked, in order
    pub questions: Vec<String>,
    /// Choice ids offered by each select
    pub offered: Vec<Vec<String>>,
    pub messages: Vec<(Level, String)>,
    pub panels: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    pub fn confirm_count(&self) -> usize {
        self.questions.iter().filter(|q| q.starts_with("confirm:")).count()
    }

    pub fn has_message(&self, level: Level, needle: &str) -> bool {
        self.messages
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }

    fn next(&mut self, question: String) -> Option<Answer> {
        self.questions.push(question);
        self.answers.pop_front()
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&mut self, question: &str, choices: &[Choice], _default_id: &str) -> Option<String> {
        self.offered
            .push(choices.iter().map(|choice| choice.id.clone()).collect());
        match self.next(format!("select: {question}"))? {
            Answer::Select(id) => {
                assert!(
                    choices.iter().any(|choice| choice.id == id),
                    "{id} not offered for {question}"
                );
                Some(id.to_string())
            }
            Answer::Cancel => None,
            other => panic!("expected a select answer for {question}, got {other:?}"),
        }
    }

    fn confirm(&mut self, question: &str, _default: bool) -> Option<bool> {
        match self.next(format!("confirm: {question}"))? {
            Answer::Confirm(value) => Some(value),
            Answer::Cancel => None,
            other => panic!("expected a confirm answer for {question}, got {other:?}"),
        }
    }

    fn text(
        &mut self,
        question: &str,
        _default: &str,
        validator: Option<Validator<'_>>,
    ) -> Option<String> {
        match self.next(format!("text: {question}"))? {
            Answer::Text(value) => {
                if let Some(validator) = validator {
                    if let Err(e) = validator(value) {
                        panic!("scripted answer {value:?} rejected: {e}");
                    }
                }
                Some(value.to_string())
            }
            Answer::Cancel => None,
            other => panic!("expected a text answer for {question}, got {other:?}"),
        }
    }

    fn password(&mut self, question: &str) -> Option<String> {
        match self.next(format!("password: {question}"))? {
            Answer::Password(value) => Some(value.to_string()),
            Answer::Cancel => None,
            other => panic!("expected a password answer for {question}, got {other:?}"),
        }
    }

    fn notify(&mut self, level: Level, message: &str) {
        self.messages.push((level, message.to_string()));
    }

    fn panel(&mut self, title: &str, _lines: &[String]) {
        self.panels.push(title.to_string());
    }
}

fn failed(tool: &str) -> ToolError {
    ToolError::Failed {
        tool: tool.to_string(),
        code: Some(1),
        stdout: String::new(),
        stderr: format!("{tool} failed"),
    }
}

#[derive(Default)]
pub struct FakeChecker {
    pub resolvable: bool,
    pub busy_ports: Vec<u16>,
}

impl PreconditionChecker for FakeChecker {
    fn domain_resolvable(&self, domain: &str) -> bool {
        self.resolvable && !domain.is_empty()
    }

    fn port_available(&self, port: u16) -> bool {
        !self.busy_ports.contains(&port)
    }
}

/// Pops one scripted outcome per request; succeeds once the script runs out
#[derive(Default)]
pub struct FakeIssuer {
    pub outcomes: RefCell<VecDeque<bool>>,
    pub calls: RefCell<Vec<(String, ChallengeMode, bool)>>,
}

impl FakeIssuer {
    pub fn script(&self, outcomes: impl IntoIterator<Item = bool>) {
        self.outcomes.borrow_mut().extend(outcomes);
    }
}

impl CertificateIssuer for FakeIssuer {
    fn request_certificate(
        &self,
        domain: &str,
        mode: ChallengeMode,
        staging: bool,
    ) -> std::result::Result<(), ToolError> {
        self.calls
            .borrow_mut()
            .push((domain.to_string(), mode, staging));
        if self.outcomes.borrow_mut().pop_front().unwrap_or(true) {
            Ok(())
        } else {
            Err(failed("certbot"))
        }
    }
}

pub struct FakeAuthority {
    pub available: bool,
    pub outcomes: RefCell<VecDeque<bool>>,
    pub domains: RefCell<Vec<String>>,
}

impl Default for FakeAuthority {
    fn default() -> Self {
        Self {
            available: true,
            outcomes: RefCell::default(),
            domains: RefCell::default(),
        }
    }
}

impl FakeAuthority {
    pub fn script(&self, outcomes: impl IntoIterator<Item = bool>) {
        self.outcomes.borrow_mut().extend(outcomes);
    }

    pub fn calls(&self) -> usize {
        self.domains.borrow().len()
    }
}

impl CertificateAuthority for FakeAuthority {
    fn is_available(&self) -> bool {
        self.available
    }

    fn generate_self_signed(
        &self,
        output_dir: &Path,
        domain: &str,
    ) -> std::result::Result<ServerCertificate, ToolError> {
        self.domains.borrow_mut().push(domain.to_string());
        if self.outcomes.borrow_mut().pop_front().unwrap_or(true) {
            Ok(ServerCertificate {
                cert_path: output_dir.join("server.crt"),
                key_path: output_dir.join("server.key"),
            })
        } else {
            Err(failed("openssl"))
        }
    }
}

#[derive(Default)]
pub struct FakeClientCerts {
    pub names: RefCell<Vec<String>>,
}

impl ClientCertGenerator for FakeClientCerts {
    fn generate_client_cert(&self, name: &str) -> std::result::Result<ClientCertInfo, ToolError> {
        self.names.borrow_mut().push(name.to_string());
        let dir = PathBuf::from("/certs/clients");
        Ok(ClientCertInfo {
            name: name.to_string(),
            cert_path: dir.join(format!("{name}.crt")),
            key_path: dir.join(format!("{name}.key")),
            bundle_path: dir.join(format!("{name}.p12")),
        })
    }
}

#[derive(Default)]
pub struct FakeHtpasswd {
    pub paths: RefCell<Vec<PathBuf>>,
}

impl HtpasswdGenerator for FakeHtpasswd {
    fn generate_htpasswd(
        &self,
        path: &Path,
        _prompter: &mut dyn Prompter,
    ) -> std::result::Result<(), ToolError> {
        self.paths.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeArtifacts {
    pub fail: bool,
    pub proxy: Cell<usize>,
    pub compose: Cell<usize>,
}

impl FakeArtifacts {
    pub fn total(&self) -> usize {
        self.proxy.get() + self.compose.get()
    }
}

impl ArtifactRegenerator for FakeArtifacts {
    fn regenerate_proxy_config(&self, config: &DeploymentConfig) -> Result<PathBuf> {
        self.proxy.set(self.proxy.get() + 1);
        if self.fail {
            return Err(Error::custom("proxy template unavailable"));
        }
        Ok(config.proxy_config_file())
    }

    fn regenerate_compose_config(&self, config: &DeploymentConfig) -> Result<PathBuf> {
        self.compose.set(self.compose.get() + 1);
        if self.fail {
            return Err(Error::custom("compose generation failed"));
        }
        Ok(config.compose_file())
    }
}

pub struct FakeServices {
    pub edge: ServiceState,
    pub calls: RefCell<Vec<String>>,
}

impl Default for FakeServices {
    fn default() -> Self {
        Self {
            edge: ServiceState::Stopped,
            calls: RefCell::default(),
        }
    }
}

impl FakeServices {
    pub fn called(&self, call: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == call)
    }
}

impl ServiceController for FakeServices {
    fn service_status(&self, _name: &str) -> ServiceState {
        self.edge
    }

    fn start_service(&self, name: &str) -> std::result::Result<(), ToolError> {
        self.calls.borrow_mut().push(format!("start {name}"));
        Ok(())
    }

    fn restart_service(&self, name: &str) -> std::result::Result<(), ToolError> {
        self.calls.borrow_mut().push(format!("restart {name}"));
        Ok(())
    }

    fn remove_container(&self, name: &str) -> std::result::Result<(), ToolError> {
        self.calls.borrow_mut().push(format!("remove {name}"));
        Ok(())
    }

    fn start_all(&self) -> std::result::Result<(), ToolError> {
        self.calls.borrow_mut().push("start_all".to_string());
        Ok(())
    }
}

/// The file shows up on the `appear_after`-th existence check
#[derive(Default)]
pub struct CountingProbe {
    pub appear_after: Option<usize>,
    pub checks: Cell<usize>,
    pub sleeps: Cell<usize>,
}

impl ArtifactProbe for CountingProbe {
    fn exists(&self, _path: &Path) -> bool {
        let n = self.checks.get() + 1;
        self.checks.set(n);
        self.appear_after.is_some_and(|after| n >= after)
    }

    fn sleep(&self, _interval: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
    }
}

#[derive(Default)]
pub struct CountingSink {
    pub saves: Cell<usize>,
    pub last: RefCell<Option<DeploymentConfig>>,
}

impl ConfigSink for CountingSink {
    fn save(&self, config: &DeploymentConfig) -> std::result::Result<(), ConfigError> {
        self.saves.set(self.saves.get() + 1);
        *self.last.borrow_mut() = Some(config.clone());
        Ok(())
    }
}

/// All collaborators of one wizard run
#[derive(Default)]
pub struct Harness {
    pub checker: FakeChecker,
    pub issuer: FakeIssuer,
    pub authority: FakeAuthority,
    pub client_certs: FakeClientCerts,
    pub htpasswd: FakeHtpasswd,
    pub artifacts: FakeArtifacts,
    pub services: FakeServices,
    pub probe: CountingProbe,
    pub sink: CountingSink,
}

impl Harness {
    pub fn resolvable() -> Self {
        Self {
            checker: FakeChecker {
                resolvable: true,
                busy_ports: Vec::new(),
            },
            ..Default::default()
        }
    }

    pub fn context<'a>(&'a self, prompter: &'a mut ScriptedPrompter) -> WizardContext<'a> {
        let managers = SecurityManagers {
            lets_encrypt: Some(&self.issuer),
            certificate_authority: Some(&self.authority),
            client_certs: Some(&self.client_certs),
            basic_auth: Some(&self.htpasswd),
        };
        WizardContext::new(prompter, &self.checker, &self.probe, &self.sink)
            .with_managers(managers)
            .with_artifacts(&self.artifacts)
            .with_services(&self.services)
            .with_poll_interval(Duration::ZERO)
    }

    pub fn saves(&self) -> usize {
        self.sink.saves.get()
    }
}

/// Nginx-mode configuration rooted at `dir`
pub fn proxied_config(dir: &Path, domain: &str) -> DeploymentConfig {
    let mut config = DeploymentConfig::default();
    config.mode = DeploymentMode::Proxied;
    config.nginx.domain = domain.to_string();
    config.set_project_path(dir);
    config
}
