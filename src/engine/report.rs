// src/engine/report.rs

use std::fmt;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::project::UnitName;
use crate::resource::discovery::CandidateItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A user-facing message produced during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub unit: Option<UnitName>,
    /// File the message is about, if any.
    pub location: Option<PathBuf>,
    pub text: String,
}

impl Message {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            unit: None,
            location: None,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    pub fn for_unit(mut self, unit: impl Into<UnitName>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn at(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        write!(f, "{label}")?;
        if let Some(unit) = &self.unit {
            write!(f, " [{unit}]")?;
        }
        write!(f, ": {}", self.text)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location.display())?;
        }
        Ok(())
    }
}

/// Log `message` at its severity and keep it.
pub(crate) fn emit(messages: &mut Vec<Message>, message: Message) {
    match message.severity {
        Severity::Error => error!(unit = ?message.unit, location = ?message.location, "{}", message.text),
        Severity::Warning => warn!(unit = ?message.unit, location = ?message.location, "{}", message.text),
        Severity::Info => info!(unit = ?message.unit, location = ?message.location, "{}", message.text),
    }
    messages.push(message);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All four phases ran and the cache was (attempted to be) saved.
    Completed,
    /// Cancellation was requested; nothing was persisted.
    Cancelled,
}

/// What a single pass did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Items copied or filtered successfully, in processing order.
    pub processed: Vec<CandidateItem>,
    /// Output paths left alone because their validity state was unchanged.
    pub skipped: Vec<String>,
    /// Obsolete outputs that were removed.
    pub deleted: Vec<String>,
    pub messages: Vec<Message>,
}

impl RunReport {
    pub(crate) fn new(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            processed: Vec::new(),
            skipped: Vec::new(),
            deleted: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome == RunOutcome::Cancelled
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.severity == Severity::Warning)
    }

    /// Output paths of processed items.
    pub fn processed_outputs(&self) -> Vec<&str> {
        self.processed.iter().map(CandidateItem::output_path).collect()
    }
}
