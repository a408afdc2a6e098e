//! Command line arguments and subcommands of the setup wizard
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use teddycloud_starter::prompt::MenuItem;

#[derive(Parser, Debug)]
#[command(name = "teddycloud-starter")]
#[command(version)]
#[command(about = "Interactive setup wizard for containerized TeddyCloud deployments")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Configuration file path (defaults to ~/.teddycloudstarter/config.json)
    #[arg(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    /// Write logs to a daily rotated file in this directory
    #[arg(long, global = true)]
    pub(crate) log_dir: Option<PathBuf>,

    /// Registration email for Let's Encrypt
    #[arg(long, global = true)]
    pub(crate) email: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    /// Run the full setup wizard (default)
    Setup,
    /// Change one aspect of an existing nginx deployment
    Modify {
        /// What to change; shows a menu when omitted
        #[arg(value_enum)]
        target: Option<ModifyTarget>,
    },
    /// Print the current configuration
    Show,
    /// Regenerate the compose manifest and proxy configuration
    Regenerate,
    /// Check tools and ports needed by the deployment
    Check,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModifyTarget {
    Https,
    Domain,
    Security,
    IpRestrictions,
    AuthBypass,
    /// Request the pending Let's Encrypt certificate
    Certificate,
}

impl ModifyTarget {
    pub(crate) const ALL: [ModifyTarget; 6] = [
        ModifyTarget::Https,
        ModifyTarget::Domain,
        ModifyTarget::Security,
        ModifyTarget::IpRestrictions,
        ModifyTarget::AuthBypass,
        ModifyTarget::Certificate,
    ];
}

impl MenuItem for ModifyTarget {
    fn id(&self) -> &'static str {
        match self {
            ModifyTarget::Https => "https",
            ModifyTarget::Domain => "domain",
            ModifyTarget::Security => "security",
            ModifyTarget::IpRestrictions => "ip-restrictions",
            ModifyTarget::AuthBypass => "auth-bypass",
            ModifyTarget::Certificate => "certificate",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ModifyTarget::Https => "Change HTTPS configuration",
            ModifyTarget::Domain => "Change domain name",
            ModifyTarget::Security => "Change security settings",
            ModifyTarget::IpRestrictions => "Configure IP address filtering",
            ModifyTarget::AuthBypass => "Configure basic auth bypass IPs",
            ModifyTarget::Certificate => "Request Let's Encrypt certificate",
        }
    }
}
