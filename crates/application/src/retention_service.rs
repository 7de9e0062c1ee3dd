//! Retention run coordinator and reporting facade.
//!
//! One `RetentionService` instance owns the process-wide single-flight guard,
//! the last published run and the lifetime counters. Clones share that state,
//! so the scheduler loop and administrative callers always contend on the
//! same guard.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use odontia_core::{AppError, AppResult};
use odontia_domain::{CleanupRun, RetentionCategory};

use crate::policy_registry::PolicyRegistry;
use crate::retention_ports::{AuditRepository, CategorySweeper};

mod coordinator;
mod stats;
mod sweep;


pub use stats::{LifetimeCounter, RetentionPreview, RetentionStats};

/// Subject recorded on audit events emitted by retention runs.
pub const RETENTION_AUDIT_SUBJECT: &str = "system:retention";

/// Default upper bound for one category sweep.
pub const DEFAULT_SWEEP_TIMEOUT: Duration = Duration::from_secs(300);

/// Application service coordinating retention cleanup runs.
#[derive(Clone)]
pub struct RetentionService {
    registry: Arc<PolicyRegistry>,
    sweepers: Arc<HashMap<RetentionCategory, Arc<dyn CategorySweeper>>>,
    audit_repository: Arc<dyn AuditRepository>,
    sweep_timeout: Duration,
    state: Arc<RunState>,
}

#[derive(Default)]
struct RunState {
    in_progress: AtomicBool,
    next_run_id: AtomicU64,
    completed_runs: AtomicU64,
    rejected_runs: AtomicU64,
    last_run: RwLock<Option<CleanupRun>>,
    lifetime_deleted: RwLock<HashMap<RetentionCategory, u64>>,
}

impl RetentionService {
    /// Creates a service from a registry, one sweeper per category and an audit sink.
    ///
    /// Every sweeper must belong to a registered category.
    pub fn new(
        registry: PolicyRegistry,
        sweepers: Vec<Arc<dyn CategorySweeper>>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> AppResult<Self> {
        let mut sweepers_by_category = HashMap::with_capacity(sweepers.len());
        for sweeper in sweepers {
            let category = sweeper.category();
            registry.get_policy(category)?;
            if sweepers_by_category.insert(category, sweeper).is_some() {
                return Err(AppError::Validation(format!(
                    "more than one sweeper registered for retention category '{category}'"
                )));
            }
        }

        Ok(Self {
            registry: Arc::new(registry),
            sweepers: Arc::new(sweepers_by_category),
            audit_repository,
            sweep_timeout: DEFAULT_SWEEP_TIMEOUT,
            state: Arc::new(RunState::default()),
        })
    }

    /// Overrides the per-category sweep timeout.
    #[must_use]
    pub fn with_sweep_timeout(mut self, sweep_timeout: Duration) -> Self {
        self.sweep_timeout = sweep_timeout;
        self
    }

    /// Returns the policy registry backing this service.
    #[must_use]
    pub fn registry(&self) -> &PolicyRegistry {
        self.registry.as_ref()
    }

    fn next_run_id(&self) -> u64 {
        self.state
            .next_run_id
            .fetch_add(1, Ordering::Relaxed)
            .saturating_add(1)
    }
}

/// Non-blocking single-flight guard released on drop.
struct RunGuard<'a> {
    in_progress: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn try_acquire(in_progress: &'a AtomicBool) -> Option<Self> {
        in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { in_progress })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.in_progress.store(false, Ordering::Release);
    }
}
