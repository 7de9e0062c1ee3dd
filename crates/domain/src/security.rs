use std::str::FromStr;

use odontia_core::AppError;
use serde::{Deserialize, Serialize};

use crate::cleanup_run::RunTrigger;

/// Stable audit actions emitted by retention use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a scheduled cleanup run finishes.
    RetentionCleanupCompleted,
    /// Emitted when an administrator-forced cleanup run finishes.
    RetentionCleanupForced,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RetentionCleanupCompleted => "retention.cleanup.completed",
            Self::RetentionCleanupForced => "retention.cleanup.forced",
        }
    }

    /// Returns the action recorded for a finished run.
    #[must_use]
    pub fn for_cleanup_trigger(trigger: RunTrigger) -> Self {
        match trigger {
            RunTrigger::Scheduled => Self::RetentionCleanupCompleted,
            RunTrigger::Manual => Self::RetentionCleanupForced,
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "retention.cleanup.completed" => Ok(Self::RetentionCleanupCompleted),
            "retention.cleanup.forced" => Ok(Self::RetentionCleanupForced),
            _ => Err(AppError::Validation(format!(
                "unknown audit action value '{value}'"
            ))),
        }
    }
}
