use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod conversions;

/// Retention length as an amount and a calendar unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetentionPeriodDto {
    pub amount: u32,
    pub unit: &'static str,
}

/// API representation of one retention policy.
#[derive(Debug, Serialize)]
pub struct RetentionPolicyResponse {
    pub category: &'static str,
    pub retention_period: RetentionPeriodDto,
    pub effective_period: RetentionPeriodDto,
    pub legal_minimum: Option<RetentionPeriodDto>,
    pub legal_basis: String,
    pub description: String,
    pub enabled: bool,
}

/// API representation of one category sweep outcome.
#[derive(Debug, Serialize)]
pub struct SweepResultResponse {
    pub category: &'static str,
    pub deleted_count: u64,
    pub skipped: bool,
    pub errors: Vec<String>,
    pub duration_ms: u64,
    pub effective_period: Option<RetentionPeriodDto>,
    pub cutoff: Option<DateTime<Utc>>,
}

/// API representation of one cleanup run.
///
/// `status` is one of `completed`, `completed_with_errors`, `already_running`
/// and `interrupted`.
#[derive(Debug, Serialize)]
pub struct CleanupRunResponse {
    pub id: u64,
    pub status: &'static str,
    pub triggered_by: &'static str,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_deleted: u64,
    pub results: Vec<SweepResultResponse>,
}

/// Rows removed from one category since process start.
#[derive(Debug, Serialize)]
pub struct LifetimeCounterResponse {
    pub category: &'static str,
    pub total_deleted: u64,
}

/// Operator snapshot of retention activity.
#[derive(Debug, Serialize)]
pub struct RetentionStatsResponse {
    pub last_run: Option<CleanupRunResponse>,
    pub lifetime: Vec<LifetimeCounterResponse>,
    pub policies: Vec<RetentionPolicyResponse>,
    pub completed_runs: u64,
    pub rejected_runs: u64,
    pub run_in_progress: bool,
}

/// Dry-run count for one category.
#[derive(Debug, Serialize)]
pub struct RetentionPreviewResponse {
    pub category: &'static str,
    pub eligible_count: u64,
    pub skipped: bool,
    pub effective_period: Option<RetentionPeriodDto>,
    pub cutoff: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Optional category filter for policy listing.
#[derive(Debug, Default, Deserialize)]
pub struct RetentionPolicyQuery {
    pub category: Option<String>,
}
