//! Redis-backed distributed lease coordinator for scheduled retention runs.

use async_trait::async_trait;
use odontia_application::{RunLease, RunLeaseCoordinator};
use odontia_core::{AppError, AppResult};

/// Redis implementation of run lease coordination.
///
/// Leases are never released. They expire with their TTL so one window
/// yields at most one scheduled run across instances.
#[derive(Clone)]
pub struct RedisRunLeaseCoordinator {
    client: redis::Client,
    key_prefix: String,
}

impl RedisRunLeaseCoordinator {
    /// Creates one coordinator adapter.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, scope_key: &str) -> String {
        format!("{}:{scope_key}", self.key_prefix)
    }
}

#[async_trait]
impl RunLeaseCoordinator for RedisRunLeaseCoordinator {
    async fn try_acquire_lease(
        &self,
        scope_key: &str,
        holder_id: &str,
        lease_seconds: u32,
    ) -> AppResult<Option<RunLease>> {
        if scope_key.trim().is_empty() {
            return Err(AppError::Validation(
                "run lease scope_key must not be empty".to_owned(),
            ));
        }

        if holder_id.trim().is_empty() {
            return Err(AppError::Validation(
                "run lease holder_id must not be empty".to_owned(),
            ));
        }

        if lease_seconds == 0 {
            return Err(AppError::Validation(
                "run lease_seconds must be greater than zero".to_owned(),
            ));
        }

        let key = self.key_for(scope_key);
        let token = format!("{holder_id}:{}", uuid::Uuid::new_v4());

        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        // SET NX EX keeps acquisition and ttl in one round trip.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key.as_str())
            .arg(token.as_str())
            .arg("NX")
            .arg("EX")
            .arg(u64::from(lease_seconds))
            .query_async(&mut connection)
            .await
            .map_err(|error| AppError::Internal(format!("failed to acquire run lease: {error}")))?;

        if reply.is_none() {
            return Ok(None);
        }

        Ok(Some(RunLease {
            scope_key: scope_key.to_owned(),
            token,
            holder_id: holder_id.to_owned(),
        }))
    }
}
