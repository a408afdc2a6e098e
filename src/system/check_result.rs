//! Environment check result structures

/// Result of a single environment check
#[derive(Debug, Clone)]
pub struct CheckItem {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckItem {
    pub fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(name, CheckStatus::Ok, message)
    }

    pub fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(name, CheckStatus::Warning, message)
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(name, CheckStatus::Error, message)
    }

    fn with_status(name: impl Into<String>, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.status {
            CheckStatus::Ok => "✅",
            CheckStatus::Warning => "⚠️ ",
            CheckStatus::Error => "❌",
        }
    }

    /// One printable line
    pub fn line(&self) -> String {
        format!("{} {}: {}", self.icon(), self.name, self.message)
    }
}

/// Overall environment check result
#[derive(Debug, Default)]
pub struct EnvironmentReport {
    pub items: Vec<CheckItem>,
    pub all_critical_ok: bool,
}

impl EnvironmentReport {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            all_critical_ok: true,
        }
    }

    pub fn add_item(&mut self, item: CheckItem) {
        if item.status == CheckStatus::Error {
            self.all_critical_ok = false;
        }
        self.items.push(item);
    }

    pub fn summary_message(&self) -> &'static str {
        if self.all_critical_ok {
            "All essential tools are available"
        } else {
            "Some essential tools are missing"
        }
    }
}
