//! Background timer that triggers scheduled retention runs.
//!
//! The loop never stacks runs: ticks are handled sequentially and the
//! coordinator's single-flight guard turns any overlap with a manual trigger
//! into a no-op. Shutdown cancels the timer cooperatively and lets an
//! in-flight run finish within the caller's grace period.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use odontia_core::{AppError, AppResult, NonEmptyString};
use odontia_domain::RunTrigger;

use crate::retention_ports::RunLeaseCoordinator;
use crate::retention_service::RetentionService;

/// Lease scope shared by every instance running the retention scheduler.
pub const RETENTION_LEASE_SCOPE: &str = "scheduler:retention";

/// Scheduler timing and coordination settings.
#[derive(Debug, Clone)]
pub struct RetentionSchedulerConfig {
    /// Time between scheduled runs.
    pub interval: Duration,
    /// UTC hour of the first run; `None` waits one interval instead.
    pub first_run_hour_utc: Option<u32>,
    /// Identity used when acquiring the distributed lease.
    pub holder_id: NonEmptyString,
    /// Lease TTL; kept below the interval so each window runs once.
    pub lease_seconds: u32,
}

impl RetentionSchedulerConfig {
    /// Validates scheduler settings.
    pub fn validate(&self) -> AppResult<()> {
        if self.interval.is_zero() {
            return Err(AppError::Validation(
                "retention scheduler interval must be greater than zero".to_owned(),
            ));
        }

        if self.first_run_hour_utc.is_some_and(|hour| hour > 23) {
            return Err(AppError::Validation(
                "retention scheduler first run hour must be between 0 and 23".to_owned(),
            ));
        }

        if self.lease_seconds == 0 {
            return Err(AppError::Validation(
                "retention scheduler lease_seconds must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Handle to the running scheduler task.
pub struct RetentionScheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RetentionScheduler {
    /// Spawns the scheduler loop on the current tokio runtime.
    pub fn start(
        service: RetentionService,
        config: RetentionSchedulerConfig,
        lease_coordinator: Option<Arc<dyn RunLeaseCoordinator>>,
    ) -> AppResult<Self> {
        config.validate()?;

        let first_delay = first_run_delay(&config, Utc::now());
        info!(
            interval_secs = config.interval.as_secs(),
            first_run_in_secs = first_delay.as_secs(),
            distributed_lease = lease_coordinator.is_some(),
            "retention scheduler started"
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            service,
            config,
            lease_coordinator,
            first_delay,
            cancel.clone(),
        ));

        Ok(Self { cancel, handle })
    }

    /// Stops the timer and waits up to `grace` for an in-flight run.
    ///
    /// When the grace period elapses first the timer loop is aborted. The run it
    /// was awaiting lives on its own task and still publishes its results.
    pub async fn shutdown(self, grace: Duration) {
        self.cancel.cancel();
        let mut handle = self.handle;

        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(())) => info!("retention scheduler stopped"),
            Ok(Err(error)) => warn!(error = %error, "retention scheduler task failed"),
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "retention run still active after shutdown grace period, detaching"
                );
                handle.abort();
            }
        }
    }
}

async fn run_loop(
    service: RetentionService,
    config: RetentionSchedulerConfig,
    lease_coordinator: Option<Arc<dyn RunLeaseCoordinator>>,
    first_delay: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + first_delay, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("retention scheduler cancelled");
                break;
            }
            _ = ticker.tick() => {
                run_scheduled_tick(&service, &config, lease_coordinator.as_deref()).await;
            }
        }
    }
}

async fn run_scheduled_tick(
    service: &RetentionService,
    config: &RetentionSchedulerConfig,
    lease_coordinator: Option<&dyn RunLeaseCoordinator>,
) {
    if let Some(coordinator) = lease_coordinator {
        match coordinator
            .try_acquire_lease(
                RETENTION_LEASE_SCOPE,
                config.holder_id.as_str(),
                config.lease_seconds,
            )
            .await
        {
            Ok(Some(lease)) => {
                debug!(holder_id = %lease.holder_id, "acquired retention scheduler lease");
            }
            Ok(None) => {
                info!("skipping scheduled retention cleanup, another instance holds the lease");
                return;
            }
            Err(error) => {
                warn!(error = %error, "failed to acquire retention scheduler lease");
                return;
            }
        }
    }

    let run = service.run_cleanup(RunTrigger::Scheduled).await;
    if run.is_already_running() {
        info!(
            run_id = run.id,
            "scheduled retention cleanup skipped, a run is already active"
        );
    }
}

/// Returns how long to wait before the first scheduled run.
fn first_run_delay(config: &RetentionSchedulerConfig, now: DateTime<Utc>) -> Duration {
    let Some(hour) = config.first_run_hour_utc else {
        return config.interval;
    };

    let Some(today_at_hour) = now.date_naive().and_hms_opt(hour, 0, 0) else {
        return config.interval;
    };

    let mut next_run = today_at_hour.and_utc();
    if next_run <= now {
        next_run += TimeDelta::days(1);
    }

    (next_run - now).to_std().unwrap_or(Duration::ZERO)
}
