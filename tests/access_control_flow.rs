mod support;

use starter_common::SecurityType;
use support::{Answer, CountingProbe, Harness, ScriptedPrompter, proxied_config};
use teddycloud_starter::wizard::{AccessControlConfigurator, DEFAULT_POLL_INTERVAL, WaitOutcome};
use tempfile::TempDir;

fn harness_with_file_after(checks: Option<usize>) -> Harness {
    Harness {
        probe: CountingProbe {
            appear_after: checks,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_wait_loop_checks_until_file_appears() {
    let dir = TempDir::new().unwrap();
    let harness = harness_with_file_after(Some(3));
    let mut prompter = ScriptedPrompter::new([Answer::Confirm(false), Answer::Confirm(false)]);
    let path = dir.path().join(".htpasswd");

    let outcome = {
        let mut ctx = harness.context(&mut prompter);
        AccessControlConfigurator::new(&mut ctx).wait_for_file(&path)
    };

    assert_eq!(outcome, WaitOutcome::Found);
    assert_eq!(harness.probe.checks.get(), 3);
    assert_eq!(harness.probe.sleeps.get(), 2);
    // asked once after the first failed poll only
    assert_eq!(prompter.confirm_count(), 1);
}

#[test]
fn test_wait_loop_cancelled_confirm_keeps_waiting() {
    let dir = TempDir::new().unwrap();
    let harness = harness_with_file_after(Some(4));
    let mut prompter = ScriptedPrompter::new([Answer::Cancel, Answer::Confirm(false)]);
    let path = dir.path().join(".htpasswd");

    let outcome = {
        let mut ctx = harness.context(&mut prompter);
        AccessControlConfigurator::new(&mut ctx).wait_for_file(&path)
    };

    assert_eq!(outcome, WaitOutcome::Found);
    assert_eq!(harness.probe.checks.get(), 4);
}

#[test]
fn test_basic_auth_with_existing_file() {
    let dir = TempDir::new().unwrap();
    let harness = harness_with_file_after(Some(1));
    let mut prompter =
        ScriptedPrompter::new([Answer::Select("basic_auth"), Answer::Select("provide")]);
    let mut config = proxied_config(dir.path(), "teddy.example.com");

    let kind = {
        let mut ctx = harness.context(&mut prompter);
        AccessControlConfigurator::new(&mut ctx).configure(&mut config)
    };

    assert_eq!(kind, SecurityType::BasicAuth);
    assert_eq!(config.nginx.security.kind, SecurityType::BasicAuth);
    assert!(config.security_dir().is_dir());
    assert_eq!(harness.saves(), 1);
}

#[test]
fn test_basic_auth_generate_runs_generator() {
    let dir = TempDir::new().unwrap();
    let harness = harness_with_file_after(Some(1));
    let mut prompter =
        ScriptedPrompter::new([Answer::Select("basic_auth"), Answer::Select("generate")]);
    let mut config = proxied_config(dir.path(), "teddy.example.com");

    {
        let mut ctx = harness.context(&mut prompter);
        AccessControlConfigurator::new(&mut ctx).configure(&mut config);
    }

    assert_eq!(
        harness.htpasswd.paths.borrow().as_slice(),
        [config.htpasswd_path()]
    );
    assert_eq!(config.nginx.security.kind, SecurityType::BasicAuth);
}

#[test]
fn test_return_to_menu_then_choose_none() {
    let dir = TempDir::new().unwrap();
    let harness = harness_with_file_after(None);
    let mut prompter = ScriptedPrompter::new([
        Answer::Select("basic_auth"),
        Answer::Select("provide"),
        Answer::Confirm(true),
        Answer::Select("none"),
    ]);
    let mut config = proxied_config(dir.path(), "teddy.example.com");

    let kind = {
        let mut ctx = harness.context(&mut prompter);
        AccessControlConfigurator::new(&mut ctx).configure(&mut config)
    };

    assert_eq!(kind, SecurityType::None);
    assert_eq!(harness.probe.checks.get(), 2);
    assert_eq!(prompter.offered.len(), 3);
}

#[test]
fn test_stale_bypass_ips_are_kept() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::default();
    let mut prompter = ScriptedPrompter::new([Answer::Select("client_cert"), Answer::Select("provide")]);
    let mut config = proxied_config(dir.path(), "teddy.example.com");
    config.nginx.security.kind = SecurityType::BasicAuth;
    config.nginx.security.auth_bypass_ips = vec!["10.0.0.0/8".to_string()];

    {
        let mut ctx = harness.context(&mut prompter);
        AccessControlConfigurator::new(&mut ctx).configure(&mut config);
    }

    assert_eq!(config.nginx.security.kind, SecurityType::ClientCert);
    assert_eq!(config.nginx.security.auth_bypass_ips, ["10.0.0.0/8"]);
}

#[test]
fn test_client_cert_generation_uses_default_name() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::default();
    let mut prompter = ScriptedPrompter::new([
        Answer::Select("client_cert"),
        Answer::Select("generate"),
        Answer::Text("TeddyCloudClient01"),
    ]);
    let mut config = proxied_config(dir.path(), "teddy.example.com");

    let kind = {
        let mut ctx = harness.context(&mut prompter);
        AccessControlConfigurator::new(&mut ctx).configure(&mut config)
    };

    assert_eq!(kind, SecurityType::ClientCert);
    assert_eq!(
        harness.client_certs.names.borrow().as_slice(),
        ["TeddyCloudClient01"]
    );
    assert!(prompter.panels.iter().any(|p| p == "Client certificate TeddyCloudClient01"));
}

#[test]
fn test_cancel_keeps_current_type() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::default();
    let mut prompter = ScriptedPrompter::new([Answer::Cancel]);
    let mut config = proxied_config(dir.path(), "teddy.example.com");
    config.nginx.security.kind = SecurityType::ClientCert;

    let kind = {
        let mut ctx = harness.context(&mut prompter);
        AccessControlConfigurator::new(&mut ctx).configure(&mut config)
    };

    assert_eq!(kind, SecurityType::ClientCert);
}

#[test]
fn test_default_poll_interval_is_one_second() {
    assert_eq!(DEFAULT_POLL_INTERVAL.as_secs(), 1);
}
