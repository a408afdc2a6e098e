mod support;

use starter_common::{DeploymentConfig, DeploymentMode, HttpsMode, SecurityType};
use support::{Answer, FakeChecker, Harness, ScriptedPrompter};
use teddycloud_starter::security::ChallengeMode;
use teddycloud_starter::wizard::SetupWizard;
use tempfile::TempDir;

fn direct_config(dir: &std::path::Path) -> DeploymentConfig {
    let mut config = DeploymentConfig::default();
    config.set_project_path(dir);
    config
}

#[test]
fn test_direct_to_nginx_self_signed_without_auth() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::default();
    let mut prompter = ScriptedPrompter::new([
        Answer::Select("nginx"),
        Answer::Text("Teddy.Home.Lan"),
        Answer::Select("self_signed"),
        Answer::Select("none"),
        Answer::Confirm(false),
        Answer::Confirm(true),
    ]);
    let mut config = direct_config(dir.path());

    let completed = {
        let mut ctx = harness.context(&mut prompter);
        SetupWizard::new(&mut ctx).run(&mut config)
    };

    assert!(completed);
    assert_eq!(config.mode, DeploymentMode::Proxied);
    assert_eq!(config.nginx.domain, "teddy.home.lan");
    assert_eq!(config.nginx.https_mode, HttpsMode::SelfSigned);
    assert_eq!(config.nginx.security.kind, SecurityType::None);
    assert!(config.nginx.security.allowed_ips.is_empty());

    assert_eq!(harness.artifacts.proxy.get(), 1);
    assert_eq!(harness.artifacts.compose.get(), 1);
    assert!(harness.services.called("start_all"));
    assert_eq!(harness.sink.last.borrow().as_ref(), Some(&config));
    assert_eq!(prompter.remaining(), 0);
}

#[test]
fn test_abandoned_nginx_setup_restores_config() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::default();
    let mut prompter = ScriptedPrompter::new([
        Answer::Select("nginx"),
        Answer::Text("teddy.home.lan"),
        Answer::Cancel,
    ]);
    let mut config = direct_config(dir.path());
    let before = config.clone();

    let completed = {
        let mut ctx = harness.context(&mut prompter);
        SetupWizard::new(&mut ctx).run(&mut config)
    };

    assert!(!completed);
    assert_eq!(config, before);
    assert_eq!(harness.artifacts.total(), 0);
    assert!(harness.services.calls.borrow().is_empty());
}

#[test]
fn test_busy_nginx_ports_declined() {
    let dir = TempDir::new().unwrap();
    let harness = Harness {
        checker: FakeChecker {
            resolvable: false,
            busy_ports: vec![443],
        },
        ..Default::default()
    };
    let mut prompter = ScriptedPrompter::new([Answer::Select("nginx"), Answer::Confirm(false)]);
    let mut config = direct_config(dir.path());

    let completed = {
        let mut ctx = harness.context(&mut prompter);
        SetupWizard::new(&mut ctx).run(&mut config)
    };

    assert!(!completed);
    assert_eq!(config.mode, DeploymentMode::Direct);
}

#[test]
fn test_direct_mode_replaces_busy_port() {
    let dir = TempDir::new().unwrap();
    let harness = Harness {
        checker: FakeChecker {
            resolvable: false,
            busy_ports: vec![8443],
        },
        ..Default::default()
    };
    let mut prompter = ScriptedPrompter::new([
        Answer::Select("direct"),
        Answer::Text("9443"),
        Answer::Confirm(false),
    ]);
    let mut config = direct_config(dir.path());

    let completed = {
        let mut ctx = harness.context(&mut prompter);
        SetupWizard::new(&mut ctx).run(&mut config)
    };

    assert!(completed);
    assert_eq!(config.mode, DeploymentMode::Direct);
    assert_eq!(config.ports.admin_https, 9443);
    assert_eq!(config.ports.admin_http, 80);
    // no proxy configuration in direct mode
    assert_eq!(harness.artifacts.proxy.get(), 0);
    assert_eq!(harness.artifacts.compose.get(), 1);
    assert!(!harness.services.called("start_all"));
}

#[test]
fn test_service_start_requests_pending_certificate() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::resolvable();
    let mut prompter = ScriptedPrompter::new([Answer::Confirm(true), Answer::Confirm(true)]);
    let mut config = support::proxied_config(dir.path(), "teddy.example.com");
    config.nginx.https_mode = HttpsMode::Letsencrypt;

    {
        let mut ctx = harness.context(&mut prompter);
        SetupWizard::new(&mut ctx).offer_service_start(&mut config);
    }

    assert_eq!(harness.services.calls.borrow()[0], "start_all");
    assert_eq!(
        harness.issuer.calls.borrow().as_slice(),
        [("teddy.example.com".to_string(), ChallengeMode::Webroot, false)]
    );
    assert!(config.nginx.letsencrypt_issued);
    assert!(harness.services.called("restart nginx-edge"));
}
