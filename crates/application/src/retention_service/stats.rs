use std::sync::atomic::Ordering;

use chrono::{DateTime, Utc};
use odontia_core::AppResult;
use odontia_domain::{
    CleanupRun, RetentionCategory, RetentionCutoff, RetentionPeriod, RetentionPolicy,
};

use super::RetentionService;

/// Rows removed from one category since process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifetimeCounter {
    /// Counted category.
    pub category: RetentionCategory,
    /// Monotonic total across completed runs.
    pub total_deleted: u64,
}

/// Read-only snapshot for operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionStats {
    /// Most recent finished run.
    pub last_run: Option<CleanupRun>,
    /// Per-category totals in registry order.
    pub lifetime: Vec<LifetimeCounter>,
    /// Registered policies in registry order.
    pub policies: Vec<RetentionPolicy>,
    /// Runs that swept categories.
    pub completed_runs: u64,
    /// Triggers rejected because a run was active.
    pub rejected_runs: u64,
    /// Whether a run currently holds the guard.
    pub run_in_progress: bool,
}

/// Dry-run estimate for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPreview {
    /// Previewed category.
    pub category: RetentionCategory,
    /// Rows a sweep would affect now.
    pub eligible_count: u64,
    /// True when the category would not be swept.
    pub skipped: bool,
    /// Effective period after legal floor reconciliation.
    pub effective_period: Option<RetentionPeriod>,
    /// Boundary a sweep would use.
    pub cutoff: Option<DateTime<Utc>>,
    /// Count failure, if any.
    pub error: Option<String>,
}

impl RetentionService {
    /// Returns the last finished run, lifetime counters and policies.
    ///
    /// Never waits for an in-flight run; its results appear once it finishes.
    pub async fn stats(&self) -> RetentionStats {
        let last_run = self.state.last_run.read().await.clone();
        let lifetime = {
            let lifetime_deleted = self.state.lifetime_deleted.read().await;
            self.registry
                .list_policies()
                .iter()
                .map(|policy| LifetimeCounter {
                    category: policy.category(),
                    total_deleted: lifetime_deleted
                        .get(&policy.category())
                        .copied()
                        .unwrap_or(0),
                })
                .collect()
        };

        RetentionStats {
            last_run,
            lifetime,
            policies: self.registry.list_policies().to_vec(),
            completed_runs: self.state.completed_runs.load(Ordering::Relaxed),
            rejected_runs: self.state.rejected_runs.load(Ordering::Relaxed),
            run_in_progress: self.state.in_progress.load(Ordering::Acquire),
        }
    }

    /// Returns the most recent finished run.
    pub async fn last_run(&self) -> Option<CleanupRun> {
        self.state.last_run.read().await.clone()
    }

    /// Returns registered policies in sweep order.
    #[must_use]
    pub fn list_policies(&self) -> &[RetentionPolicy] {
        self.registry.list_policies()
    }

    /// Returns the policy for one category.
    pub fn get_policy(&self, category: RetentionCategory) -> AppResult<&RetentionPolicy> {
        self.registry.get_policy(category)
    }

    /// Counts what a cleanup would affect right now without deleting anything.
    pub async fn preview(&self) -> Vec<RetentionPreview> {
        let mut previews = Vec::with_capacity(self.registry.list_policies().len());
        for policy in self.registry.list_policies() {
            previews.push(self.preview_category(policy).await);
        }
        previews
    }

    async fn preview_category(&self, policy: &RetentionPolicy) -> RetentionPreview {
        let category = policy.category();
        let sweeper = self.sweepers.get(&category);
        let Some(sweeper) = sweeper.filter(|_| policy.is_enabled()) else {
            return RetentionPreview {
                category,
                eligible_count: 0,
                skipped: true,
                effective_period: None,
                cutoff: None,
                error: None,
            };
        };

        let cutoff = RetentionCutoff::for_policy(policy, Utc::now());
        let (eligible_count, error) =
            match tokio::time::timeout(self.sweep_timeout, sweeper.count_expired(cutoff)).await {
                Ok(Ok(count)) => (count, None),
                Ok(Err(error)) => (0, Some(error.to_string())),
                Err(_) => (
                    0,
                    Some(format!("count exceeded timeout of {:?}", self.sweep_timeout)),
                ),
            };

        RetentionPreview {
            category,
            eligible_count,
            skipped: false,
            effective_period: Some(cutoff.effective_period()),
            cutoff: Some(cutoff.at()),
            error,
        }
    }
}
