use crate::types::Origin;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum DinkError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal authoring problem found while extracting.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub origin: Origin,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>, origin: Origin) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            origin,
        }
    }

    pub fn error(message: impl Into<String>, origin: Origin) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            origin,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", self.origin, level, self.message)
    }
}
