//! Terminal prompter backed by dialoguer

use super::{Choice, Level, Prompter, Validator};
use colored::*;
use console::{Term, measure_text_width};
use dialoguer::{Confirm, Input, Password, Select, theme::ColorfulTheme};

/// Interactive prompter for a real terminal
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
    term: Term,
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            term: Term::stdout(),
        }
    }

    /// Print a section header, same look as the page headers of the menu
    pub fn header(&self, title: &str) {
        println!();
        println!("{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(50).bright_cyan());
    }

    /// Clear the screen unless NO_CLEAR_SCREEN is set
    pub fn clear(&self) {
        if std::env::var("NO_CLEAR_SCREEN").is_ok() {
            println!("\n\n");
            return;
        }
        if self.term.clear_screen().is_err() {
            println!("\n\n");
        }
    }
}

impl Prompter for DialoguerPrompter {
    fn select(&mut self, question: &str, choices: &[Choice], default_id: &str) -> Option<String> {
        if choices.is_empty() {
            return None;
        }
        let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
        let default = choices
            .iter()
            .position(|c| c.id == default_id)
            .unwrap_or(0);

        match Select::with_theme(&self.theme)
            .with_prompt(question)
            .items(&labels)
            .default(default)
            .interact_opt()
        {
            Ok(Some(index)) => Some(choices[index].id.clone()),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(error = %e, "selection prompt aborted");
                None
            }
        }
    }

    fn confirm(&mut self, question: &str, default: bool) -> Option<bool> {
        match Confirm::with_theme(&self.theme)
            .with_prompt(question)
            .default(default)
            .interact_opt()
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::debug!(error = %e, "confirmation prompt aborted");
                None
            }
        }
    }

    fn text(
        &mut self,
        question: &str,
        default: &str,
        validator: Option<Validator<'_>>,
    ) -> Option<String> {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(question);
        if !default.is_empty() {
            input = input.default(default.to_string());
        }
        if let Some(validator) = validator {
            input = input.validate_with(move |value: &String| validator(value.as_str()));
        }

        match input.interact_text() {
            Ok(value) => Some(value.trim().to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "text prompt aborted");
                None
            }
        }
    }

    fn password(&mut self, question: &str) -> Option<String> {
        match Password::with_theme(&self.theme)
            .with_prompt(question)
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()
        {
            Ok(password) => Some(password),
            Err(e) => {
                tracing::debug!(error = %e, "password prompt aborted");
                None
            }
        }
    }

    fn notify(&mut self, level: Level, message: &str) {
        match level {
            Level::Info => println!("{}", message.bright_cyan()),
            Level::Success => println!("✅ {}", message.bright_green()),
            Level::Warning => println!("⚠️  {}", message.bright_yellow().bold()),
            Level::Error => println!("❌ {}", message.bright_red().bold()),
        }
    }

    fn panel(&mut self, title: &str, lines: &[String]) {
        let width = lines
            .iter()
            .map(|line| measure_text_width(line))
            .chain(std::iter::once(measure_text_width(title)))
            .max()
            .unwrap_or(0)
            + 2;

        println!("{}", format!("╭{}╮", "─".repeat(width)).bright_yellow());
        println!(
            "{} {}{} {}",
            "│".bright_yellow(),
            title.bold(),
            " ".repeat(width - 2 - measure_text_width(title)),
            "│".bright_yellow()
        );
        println!("{}", format!("├{}┤", "─".repeat(width)).bright_yellow());
        for line in lines {
            println!(
                "{} {}{} {}",
                "│".bright_yellow(),
                line,
                " ".repeat(width - 2 - measure_text_width(line)),
                "│".bright_yellow()
            );
        }
        println!("{}", format!("╰{}╯", "─".repeat(width)).bright_yellow());
    }
}
