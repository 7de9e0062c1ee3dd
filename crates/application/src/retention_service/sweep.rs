use chrono::Utc;
use odontia_domain::{RetentionCutoff, RetentionPolicy, SweepResult};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::RetentionService;

impl RetentionService {
    /// Sweeps one category, turning every failure into a category-local error.
    pub(super) async fn sweep_category(&self, policy: &RetentionPolicy) -> SweepResult {
        let category = policy.category();
        if !policy.is_enabled() {
            debug!(category = %category, "retention category disabled, skipping sweep");
            return SweepResult::skipped(category);
        }

        let Some(sweeper) = self.sweepers.get(&category) else {
            warn!(category = %category, "no sweeper registered for retention category");
            return SweepResult::skipped(category)
                .with_error(format!("no sweeper registered for category '{category}'"));
        };

        let cutoff = RetentionCutoff::for_policy(policy, Utc::now());
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.sweep_timeout, sweeper.purge_expired(cutoff)).await;
        let duration = started.elapsed();

        match outcome {
            Ok(Ok(deleted_count)) => {
                if deleted_count > 0 {
                    info!(
                        category = %category,
                        deleted_count,
                        effective_period = %cutoff.effective_period(),
                        "retention sweep removed expired rows"
                    );
                }
                SweepResult::completed(&cutoff, deleted_count, duration)
            }
            Ok(Err(error)) => {
                warn!(category = %category, error = %error, "retention sweep failed");
                SweepResult::failed(&cutoff, error.to_string(), duration)
            }
            Err(_) => {
                warn!(
                    category = %category,
                    timeout_ms = self.sweep_timeout.as_millis(),
                    "retention sweep timed out"
                );
                SweepResult::failed(
                    &cutoff,
                    format!("sweep exceeded timeout of {:?}", self.sweep_timeout),
                    duration,
                )
            }
        }
    }
}
