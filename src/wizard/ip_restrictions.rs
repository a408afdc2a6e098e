//! Interactive editing of the allow-list and the auth-bypass list

use super::WizardContext;
use crate::prompt::{Choice, Prompter, Validator};
use crate::security::IpList;
use starter_common::DeploymentConfig;
use starter_common::util::validate_ip_or_cidr;

fn ip_validator(value: &str) -> Result<(), String> {
    validate_ip_or_cidr(value.trim()).map_err(|e| e.to_string())
}

pub struct IpRestrictionConfigurator<'c, 'a> {
    ctx: &'c mut WizardContext<'a>,
}

impl<'c, 'a> IpRestrictionConfigurator<'c, 'a> {
    pub fn new(ctx: &'c mut WizardContext<'a>) -> Self {
        Self { ctx }
    }

    /// Setup step: ask whether to restrict, then edit the allow-list
    pub fn configure(&mut self, config: &mut DeploymentConfig) {
        let has_entries = !config.nginx.security.allowed_ips.is_empty();
        let question = if has_entries {
            "Would you like to modify IP address restrictions?"
        } else {
            "Would you like to restrict access to specific IP addresses?"
        };
        if self.ctx.prompter.confirm(question, has_entries) != Some(true) {
            return;
        }
        self.edit_allowed(config);
    }

    /// Edit the allow-list directly
    pub fn edit_allowed(&mut self, config: &mut DeploymentConfig) {
        {
            let mut list = IpList::allowed(&mut config.nginx.security);
            edit_list(
                &mut *self.ctx.prompter,
                &mut list,
                "Allowed IP addresses",
                "No IP restrictions currently active (all addresses allowed)",
            );
        }
        self.ctx.persist(config);
    }

    /// Edit the addresses that skip basic auth; refuses unless basic auth is active
    pub fn edit_auth_bypass(&mut self, config: &mut DeploymentConfig) {
        {
            let mut list = match IpList::auth_bypass(&mut config.nginx.security) {
                Ok(list) => list,
                Err(e) => {
                    tracing::info!(reason = %e, "auth bypass configuration skipped");
                    self.ctx.prompter.warn(&e.to_string());
                    return;
                }
            };
            edit_list(
                &mut *self.ctx.prompter,
                &mut list,
                "IP addresses that bypass basic authentication",
                "No bypass addresses configured",
            );
        }
        self.ctx.persist(config);
    }
}

/// Add/remove/clear loop until the operator is done
fn edit_list(prompter: &mut dyn Prompter, list: &mut IpList<'_>, title: &str, empty_note: &str) {
    let validator: Validator<'_> = &ip_validator;
    loop {
        if list.is_empty() {
            prompter.info(empty_note);
        } else {
            prompter.panel(title, list.list());
        }

        let mut actions = vec![Choice::new("add", "Add an IP address or CIDR range")];
        if !list.is_empty() {
            actions.push(Choice::new("remove", "Remove an entry"));
            actions.push(Choice::new("clear", "Remove all entries"));
        }
        actions.push(Choice::new("done", "Done"));

        let Some(action) = prompter.select("What would you like to do?", &actions, "done") else {
            return;
        };
        match action.as_str() {
            "add" => {
                let Some(candidate) = prompter.text(
                    "Enter IP address or CIDR (e.g. 192.168.1.0/24):",
                    "",
                    Some(validator),
                ) else {
                    continue;
                };
                match list.add(&candidate) {
                    Ok(()) => prompter.success(&format!("Added {}", candidate.trim())),
                    Err(e) => prompter.error(&e.to_string()),
                }
            }
            "remove" => {
                let entries: Vec<Choice> = list
                    .list()
                    .iter()
                    .map(|entry| Choice::new(entry.clone(), entry.clone()))
                    .collect();
                let first = entries.first().map(|c| c.id.clone()).unwrap_or_default();
                let Some(entry) = prompter.select("Select the entry to remove:", &entries, &first)
                else {
                    continue;
                };
                match list.remove(&entry) {
                    Ok(()) => prompter.success(&format!("Removed {entry}")),
                    Err(e) => prompter.error(&e.to_string()),
                }
            }
            "clear" => {
                if prompter.confirm("Remove all entries?", false) == Some(true) {
                    list.clear();
                    prompter.success("All entries removed");
                }
            }
            _ => return,
        }
    }
}
