use chrono::{DateTime, Utc};
use odontia_application::{LifetimeCounter, RetentionPreview, RetentionStats};
use odontia_domain::{CleanupRun, RetentionPeriod, RetentionPolicy, SweepResult};

use super::{
    CleanupRunResponse, LifetimeCounterResponse, RetentionPeriodDto, RetentionPolicyResponse,
    RetentionPreviewResponse, RetentionStatsResponse, SweepResultResponse,
};

impl From<RetentionPeriod> for RetentionPeriodDto {
    fn from(value: RetentionPeriod) -> Self {
        Self {
            amount: value.amount(),
            unit: value.unit(),
        }
    }
}

impl RetentionPolicyResponse {
    /// Maps a policy, resolving its effective period at `reference`.
    pub fn from_policy(policy: &RetentionPolicy, reference: DateTime<Utc>) -> Self {
        Self {
            category: policy.category().as_str(),
            retention_period: policy.retention_period().into(),
            effective_period: policy.effective_period(reference).into(),
            legal_minimum: policy.legal_floor().map(|floor| floor.minimum.into()),
            legal_basis: policy.legal_basis().to_owned(),
            description: policy.description().to_owned(),
            enabled: policy.is_enabled(),
        }
    }
}

impl From<SweepResult> for SweepResultResponse {
    fn from(value: SweepResult) -> Self {
        Self {
            category: value.category.as_str(),
            deleted_count: value.deleted_count,
            skipped: value.skipped,
            errors: value.errors,
            duration_ms: u64::try_from(value.duration.as_millis()).unwrap_or(u64::MAX),
            effective_period: value.effective_period.map(Into::into),
            cutoff: value.cutoff,
        }
    }
}

impl From<CleanupRun> for CleanupRunResponse {
    fn from(value: CleanupRun) -> Self {
        let status = if let Some(error) = value.overall_error {
            error.as_str()
        } else if value.has_failures() {
            "completed_with_errors"
        } else {
            "completed"
        };
        let total_deleted = value.total_deleted();

        Self {
            id: value.id,
            status,
            triggered_by: value.triggered_by.as_str(),
            started_at: value.started_at,
            finished_at: value.finished_at,
            total_deleted,
            results: value.results.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<LifetimeCounter> for LifetimeCounterResponse {
    fn from(value: LifetimeCounter) -> Self {
        Self {
            category: value.category.as_str(),
            total_deleted: value.total_deleted,
        }
    }
}

impl From<RetentionPreview> for RetentionPreviewResponse {
    fn from(value: RetentionPreview) -> Self {
        Self {
            category: value.category.as_str(),
            eligible_count: value.eligible_count,
            skipped: value.skipped,
            effective_period: value.effective_period.map(Into::into),
            cutoff: value.cutoff,
            error: value.error,
        }
    }
}

impl RetentionStatsResponse {
    /// Maps a stats snapshot, resolving effective periods at `reference`.
    pub fn from_stats(stats: RetentionStats, reference: DateTime<Utc>) -> Self {
        Self {
            last_run: stats.last_run.map(Into::into),
            lifetime: stats.lifetime.into_iter().map(Into::into).collect(),
            policies: stats
                .policies
                .iter()
                .map(|policy| RetentionPolicyResponse::from_policy(policy, reference))
                .collect(),
            completed_runs: stats.completed_runs,
            rejected_runs: stats.rejected_runs,
            run_in_progress: stats.run_in_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use odontia_domain::{
        CleanupRun, CleanupRunError, RetentionCategory, RetentionCutoff, RetentionPeriod,
        RetentionPolicy, RunTrigger, SweepResult,
    };

    use super::{CleanupRunResponse, RetentionPolicyResponse};

    #[test]
    fn policy_response_reports_effective_period_after_floor() {
        let policy =
            RetentionPolicy::new(RetentionCategory::MedicalRecords, RetentionPeriod::Days(30))
                .with_legal_floor(RetentionPeriod::Years(20));

        let response = RetentionPolicyResponse::from_policy(&policy, Utc::now());

        assert_eq!(response.category, "medical_records");
        assert_eq!(response.retention_period.unit, "days");
        assert_eq!(response.effective_period.amount, 20);
        assert_eq!(response.effective_period.unit, "years");
        assert!(response.legal_minimum.is_some());
    }

    #[test]
    fn run_status_reflects_outcome() {
        let now = Utc::now();
        let rejected = CleanupRunResponse::from(CleanupRun::rejected(
            7,
            RunTrigger::Manual,
            now,
            CleanupRunError::AlreadyRunning,
        ));
        assert_eq!(rejected.status, "already_running");
        assert_eq!(rejected.triggered_by, "manual");

        let interrupted = CleanupRunResponse::from(CleanupRun::rejected(
            9,
            RunTrigger::Manual,
            now,
            CleanupRunError::Interrupted,
        ));
        assert_eq!(interrupted.status, "interrupted");

        let policy =
            RetentionPolicy::new(RetentionCategory::OldSessions, RetentionPeriod::Days(30));
        let cutoff = RetentionCutoff::for_policy(&policy, now);
        let failed = CleanupRunResponse::from(CleanupRun {
            id: 8,
            triggered_by: RunTrigger::Scheduled,
            started_at: now,
            finished_at: Some(now),
            results: vec![
                SweepResult::completed(&cutoff, 4, Duration::from_millis(12)),
                SweepResult::failed(&cutoff, "connection reset", Duration::from_millis(3)),
            ],
            overall_error: None,
        });
        assert_eq!(failed.status, "completed_with_errors");
        assert_eq!(failed.total_deleted, 4);
        assert_eq!(failed.results[0].duration_ms, 12);
    }
}
