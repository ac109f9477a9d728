//! Diagnostics shared by every phase
//!
//! A diagnostic renders in the compiler convention understood by IDEs:
//! `path:line: severity: message.`, followed by one line per note.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FileLocation;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located message with optional secondary notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Where the problem was detected
    pub location: FileLocation,
    /// Severity level
    pub severity: Severity,
    /// Primary message, without trailing period
    pub message: String,
    /// Secondary records printed right after the primary line
    pub notes: Vec<Diagnostic>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(location: FileLocation, message: impl Into<String>) -> Self {
        Self {
            location,
            severity: Severity::Error,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(location: FileLocation, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(location, message)
        }
    }

    /// Add a note
    pub fn with_note(mut self, note: Diagnostic) -> Self {
        self.notes.push(note);
        self
    }

    /// Add notes from an iterator
    pub fn with_notes(mut self, notes: impl IntoIterator<Item = Diagnostic>) -> Self {
        self.notes.extend(notes);
        self
    }

    /// The primary line only, without notes
    pub fn headline(&self) -> String {
        match self.location.file {
            Some(_) => format!("{}: {}: {}.", self.location, self.severity, self.message),
            None => format!("{}: {}.", self.severity, self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.headline())?;
        for note in &self.notes {
            write!(f, "\n{}", note)?;
        }
        Ok(())
    }
}
