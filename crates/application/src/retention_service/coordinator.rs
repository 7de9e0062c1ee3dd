use std::sync::atomic::Ordering;

use chrono::Utc;
use odontia_domain::{AuditAction, CleanupRun, CleanupRunError, RunTrigger};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::retention_ports::AuditEvent;

use super::{RETENTION_AUDIT_SUBJECT, RetentionService, RunGuard};

impl RetentionService {
    /// Executes one cleanup pass over every registered category.
    ///
    /// Returns immediately with `overall_error = AlreadyRunning` when another
    /// run holds the guard. Category failures never abort the run.
    ///
    /// The pass runs on its own task, so dropping the returned future does not
    /// cancel a sweep or skip publishing and auditing its results.
    pub async fn run_cleanup(&self, triggered_by: RunTrigger) -> CleanupRun {
        let run_id = self.next_run_id();
        let service = self.clone();
        let handle =
            tokio::spawn(async move { service.execute_run(run_id, triggered_by).await });

        match handle.await {
            Ok(run) => run,
            Err(error) => {
                warn!(
                    run_id,
                    error = %error,
                    "retention cleanup task stopped before finishing"
                );
                CleanupRun::rejected(
                    run_id,
                    triggered_by,
                    Utc::now(),
                    CleanupRunError::Interrupted,
                )
            }
        }
    }

    async fn execute_run(&self, run_id: u64, triggered_by: RunTrigger) -> CleanupRun {
        let Some(_guard) = RunGuard::try_acquire(&self.state.in_progress) else {
            self.state.rejected_runs.fetch_add(1, Ordering::Relaxed);
            debug!(
                run_id,
                trigger = triggered_by.as_str(),
                "retention cleanup already running, ignoring trigger"
            );
            return CleanupRun::rejected(
                run_id,
                triggered_by,
                Utc::now(),
                CleanupRunError::AlreadyRunning,
            );
        };

        let started_at = Utc::now();
        info!(
            run_id,
            trigger = triggered_by.as_str(),
            "retention cleanup started"
        );

        let policies = self.registry.list_policies();
        let mut results = Vec::with_capacity(policies.len());
        for policy in policies {
            results.push(self.sweep_category(policy).await);
        }

        let run = CleanupRun {
            id: run_id,
            triggered_by,
            started_at,
            finished_at: Some(Utc::now()),
            results,
            overall_error: None,
        };

        self.publish_run(&run).await;
        self.record_run_audit(&run).await;

        info!(
            run_id,
            trigger = triggered_by.as_str(),
            total_deleted = run.total_deleted(),
            failed_categories = run.results.iter().filter(|result| result.is_failure()).count(),
            "retention cleanup finished"
        );

        run
    }

    /// Runs a cleanup on behalf of an administrator.
    pub async fn force_cleanup(&self) -> CleanupRun {
        info!("manual retention cleanup triggered");
        self.run_cleanup(RunTrigger::Manual).await
    }

    async fn publish_run(&self, run: &CleanupRun) {
        {
            let mut lifetime_deleted = self.state.lifetime_deleted.write().await;
            for result in &run.results {
                let total = lifetime_deleted.entry(result.category).or_insert(0);
                *total = total.saturating_add(result.deleted_count);
            }
        }

        *self.state.last_run.write().await = Some(run.clone());
        self.state.completed_runs.fetch_add(1, Ordering::Relaxed);
    }

    async fn record_run_audit(&self, run: &CleanupRun) {
        let categories: Vec<_> = run
            .results
            .iter()
            .map(|result| {
                json!({
                    "category": result.category.as_str(),
                    "deleted_count": result.deleted_count,
                    "skipped": result.skipped,
                    "errors": result.errors,
                })
            })
            .collect();

        let detail = json!({
            "triggered_by": run.triggered_by.as_str(),
            "started_at": run.started_at.to_rfc3339(),
            "finished_at": run.finished_at.map(|finished_at| finished_at.to_rfc3339()),
            "total_deleted": run.total_deleted(),
            "categories": categories,
        });

        let event = AuditEvent {
            subject: RETENTION_AUDIT_SUBJECT.to_owned(),
            action: AuditAction::for_cleanup_trigger(run.triggered_by),
            resource_type: "retention_run".to_owned(),
            resource_id: run.id.to_string(),
            success: !run.has_failures(),
            detail,
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(
                run_id = run.id,
                error = %error,
                "failed to record retention audit event"
            );
        }
    }
}
