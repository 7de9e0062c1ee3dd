//! Cleanup run snapshots and per-category sweep outcomes.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::retention::{RetentionCategory, RetentionCutoff, RetentionPeriod};

/// Source that started a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    /// Background scheduler tick.
    Scheduled,
    /// Administrative force-cleanup request.
    Manual,
}

impl RunTrigger {
    /// Returns stable trigger value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

/// Reason a cleanup run produced no published results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupRunError {
    /// Another run held the single-flight guard.
    AlreadyRunning,
    /// The run task stopped before it could report back.
    Interrupted,
}

impl CleanupRunError {
    /// Returns stable error value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyRunning => "already_running",
            Self::Interrupted => "interrupted",
        }
    }
}

impl Display for CleanupRunError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Outcome of sweeping one category within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepResult {
    /// Swept category.
    pub category: RetentionCategory,
    /// Rows actually deleted or anonymized.
    pub deleted_count: u64,
    /// True when the sweeper was not invoked.
    pub skipped: bool,
    /// Ordered error descriptions, empty on success.
    pub errors: Vec<String>,
    /// Wall-clock time spent in the sweeper.
    pub duration: Duration,
    /// Effective period after legal floor reconciliation.
    pub effective_period: Option<RetentionPeriod>,
    /// Boundary used by the sweeper.
    pub cutoff: Option<DateTime<Utc>>,
}

impl SweepResult {
    /// Builds a result for a category that was not swept.
    #[must_use]
    pub fn skipped(category: RetentionCategory) -> Self {
        Self {
            category,
            deleted_count: 0,
            skipped: true,
            errors: Vec::new(),
            duration: Duration::ZERO,
            effective_period: None,
            cutoff: None,
        }
    }

    /// Builds a successful sweep result.
    #[must_use]
    pub fn completed(cutoff: &RetentionCutoff, deleted_count: u64, duration: Duration) -> Self {
        Self {
            category: cutoff.category(),
            deleted_count,
            skipped: false,
            errors: Vec::new(),
            duration,
            effective_period: Some(cutoff.effective_period()),
            cutoff: Some(cutoff.at()),
        }
    }

    /// Builds a failed sweep result. Failed sweeps never report deletions.
    #[must_use]
    pub fn failed(cutoff: &RetentionCutoff, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            category: cutoff.category(),
            deleted_count: 0,
            skipped: false,
            errors: vec![error.into()],
            duration,
            effective_period: Some(cutoff.effective_period()),
            cutoff: Some(cutoff.at()),
        }
    }

    /// Appends one error description.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    /// Returns whether the sweep reported errors.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// One execution of the cleanup coordinator.
///
/// Immutable once published: the coordinator only hands out finished runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRun {
    /// Process-monotonic run identifier.
    pub id: u64,
    /// What started the run.
    pub triggered_by: RunTrigger,
    /// Start instant.
    pub started_at: DateTime<Utc>,
    /// Finish instant, `None` only for runs that never started.
    pub finished_at: Option<DateTime<Utc>>,
    /// One result per registered category, in registry order.
    pub results: Vec<SweepResult>,
    /// Set only when the run could not start.
    pub overall_error: Option<CleanupRunError>,
}

impl CleanupRun {
    /// Builds a run that was rejected before sweeping anything.
    #[must_use]
    pub fn rejected(
        id: u64,
        triggered_by: RunTrigger,
        at: DateTime<Utc>,
        error: CleanupRunError,
    ) -> Self {
        Self {
            id,
            triggered_by,
            started_at: at,
            finished_at: None,
            results: Vec::new(),
            overall_error: Some(error),
        }
    }

    /// Returns the result recorded for one category.
    #[must_use]
    pub fn result_for(&self, category: RetentionCategory) -> Option<&SweepResult> {
        self.results
            .iter()
            .find(|result| result.category == category)
    }

    /// Returns rows removed across all categories.
    #[must_use]
    pub fn total_deleted(&self) -> u64 {
        self.results
            .iter()
            .fold(0_u64, |total, result| total.saturating_add(result.deleted_count))
    }

    /// Returns whether any category failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(SweepResult::is_failure)
    }

    /// Returns whether the run was rejected by the single-flight guard.
    #[must_use]
    pub fn is_already_running(&self) -> bool {
        self.overall_error == Some(CleanupRunError::AlreadyRunning)
    }
}
