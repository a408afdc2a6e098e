//! Host interaction: external commands, network preconditions, environment checks

mod check_result;
pub mod command;
mod dependencies;
mod network;

pub use check_result::{CheckItem, CheckStatus, EnvironmentReport};
pub use command::{CommandOutput, command_exists, run_command, run_with_spinner};
pub use dependencies::check_environment;
pub use network::{NetworkProbe, PreconditionChecker};
