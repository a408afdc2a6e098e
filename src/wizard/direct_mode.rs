//! Direct mode: TeddyCloud publishes its own ports

use super::WizardContext;
use crate::prompt::Validator;
use starter_common::{DeploymentConfig, DeploymentMode};

fn port_validator(value: &str) -> Result<(), String> {
    match value.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err("Enter a port number between 1 and 65535".to_string()),
        Ok(_) => Ok(()),
    }
}

/// Switch to direct mode and resolve busy published ports
pub fn configure_direct_mode(ctx: &mut WizardContext<'_>, config: &mut DeploymentConfig) {
    config.mode = DeploymentMode::Direct;

    let validator: Validator<'_> = &port_validator;
    let ports = &mut config.ports;
    for (label, port) in [
        ("admin interface (HTTP)", &mut ports.admin_http),
        ("admin interface (HTTPS)", &mut ports.admin_https),
        ("Toniebox connection (HTTPS)", &mut ports.teddycloud),
    ] {
        if ctx.checker.port_available(*port) {
            continue;
        }
        ctx.prompter.warn(&format!(
            "Port {port} for the {label} appears to be in use."
        ));
        let answer = ctx.prompter.text(
            &format!("Enter the port to use for the {label}:"),
            &port.to_string(),
            Some(validator),
        );
        if let Some(value) = answer.and_then(|value| value.trim().parse::<u16>().ok()) {
            if value != *port {
                tracing::info!(label, from = *port, to = value, "published port changed");
                *port = value;
            }
        }
    }

    tracing::info!("direct mode configured");
    ctx.persist(config);
}
