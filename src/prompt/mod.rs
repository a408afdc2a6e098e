//! Operator interaction contract
//!
//! The state machines never talk to the terminal directly: every question and
//! every message goes through a `Prompter`. `None` from a prompt means the
//! operator cancelled, which callers treat as "keep the current value".

mod terminal;

pub use terminal::DialoguerPrompter;

use starter_common::{HttpsMode, SecurityType};

/// One entry of a selection menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

impl Choice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Severity of an operator-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Free-text validator, `Err` carries the message shown to the operator
pub type Validator<'v> = &'v dyn Fn(&str) -> Result<(), String>;

/// Prompt service consumed by the wizard
pub trait Prompter {
    /// Pick one of `choices`, returns the chosen id
    fn select(&mut self, question: &str, choices: &[Choice], default_id: &str) -> Option<String>;

    fn confirm(&mut self, question: &str, default: bool) -> Option<bool>;

    fn text(&mut self, question: &str, default: &str, validator: Option<Validator<'_>>)
    -> Option<String>;

    /// Hidden input with confirmation
    fn password(&mut self, question: &str) -> Option<String>;

    fn notify(&mut self, level: Level, message: &str);

    /// Boxed block of explanatory text
    fn panel(&mut self, title: &str, lines: &[String]);

    fn info(&mut self, message: &str) {
        self.notify(Level::Info, message);
    }

    fn success(&mut self, message: &str) {
        self.notify(Level::Success, message);
    }

    fn warn(&mut self, message: &str) {
        self.notify(Level::Warning, message);
    }

    fn error(&mut self, message: &str) {
        self.notify(Level::Error, message);
    }
}

/// Typed menu entry, lets callers select enum variants instead of raw ids
pub trait MenuItem: Copy {
    fn id(&self) -> &'static str;
    fn label(&self) -> &'static str;
}

impl MenuItem for HttpsMode {
    fn id(&self) -> &'static str {
        HttpsMode::id(*self)
    }

    fn label(&self) -> &'static str {
        HttpsMode::label(*self)
    }
}

impl MenuItem for SecurityType {
    fn id(&self) -> &'static str {
        SecurityType::id(*self)
    }

    fn label(&self) -> &'static str {
        SecurityType::label(*self)
    }
}

/// Offer `options` and map the answer back to a variant
pub fn choose<T: MenuItem>(
    prompter: &mut dyn Prompter,
    question: &str,
    options: &[T],
    default: T,
) -> Option<T> {
    let choices: Vec<Choice> = options
        .iter()
        .map(|option| Choice::new(option.id(), option.label()))
        .collect();
    let id = prompter.select(question, &choices, default.id())?;
    options.iter().copied().find(|option| option.id() == id)
}
