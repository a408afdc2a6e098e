//! Host environment checks behind the `check` command

use super::check_result::{CheckItem, EnvironmentReport};
use super::command::{command_exists, run_command};
use super::network::PreconditionChecker;
use starter_common::PortsConfig;

/// Collect tool availability and port status for the configured deployment
pub fn check_environment(checker: &dyn PreconditionChecker, ports: &PortsConfig) -> EnvironmentReport {
    let mut report = EnvironmentReport::new();

    if command_exists("docker") {
        let compose = run_command("docker", &["compose", "version"])
            .map(|output| output.success())
            .unwrap_or(false);
        if compose {
            report.add_item(CheckItem::ok("docker", "docker and compose plugin available"));
        } else {
            report.add_item(CheckItem::error("docker", "compose plugin not available"));
        }
    } else {
        report.add_item(CheckItem::error("docker", "not installed"));
    }

    if command_exists("openssl") {
        report.add_item(CheckItem::ok("openssl", "available"));
    } else {
        report.add_item(CheckItem::warning(
            "openssl",
            "not installed (self-signed and client certificates unavailable)",
        ));
    }

    if command_exists("htpasswd") {
        report.add_item(CheckItem::ok("htpasswd", "available"));
    } else {
        report.add_item(CheckItem::warning(
            "htpasswd",
            "not installed (the httpd docker image is used instead)",
        ));
    }

    let mut checked = Vec::new();
    for port in [80, 443, ports.admin_http, ports.admin_https, ports.teddycloud] {
        if checked.contains(&port) {
            continue;
        }
        checked.push(port);
        let name = format!("Port {port}");
        if checker.port_available(port) {
            report.add_item(CheckItem::ok(name, "available"));
        } else {
            report.add_item(CheckItem::warning(name, "in use or not bindable"));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BusyPorts(Vec<u16>);

    impl PreconditionChecker for BusyPorts {
        fn domain_resolvable(&self, _: &str) -> bool {
            false
        }

        fn port_available(&self, port: u16) -> bool {
            !self.0.contains(&port)
        }
    }

    #[test]
    fn test_ports_are_checked_once() {
        let report = check_environment(&BusyPorts(vec![443]), &PortsConfig::default());
        let ports: Vec<&CheckItem> = report
            .items
            .iter()
            .filter(|item| item.name.starts_with("Port"))
            .collect();
        // 80, 443 and 8443; the defaults overlap with the proxy ports
        assert_eq!(ports.len(), 3);
        assert!(ports.iter().any(|item| item.name == "Port 443" && item.message.contains("in use")));
    }
}
