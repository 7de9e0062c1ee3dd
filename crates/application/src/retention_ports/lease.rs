use async_trait::async_trait;
use odontia_core::AppResult;

/// Lease held by one process for a scheduled run window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLease {
    /// Lease scope key.
    pub scope_key: String,
    /// Unique token identifying this acquisition.
    pub token: String,
    /// Process that acquired the lease.
    pub holder_id: String,
}

/// Distributed coordination port so only one instance runs a scheduled window.
#[async_trait]
pub trait RunLeaseCoordinator: Send + Sync {
    /// Attempts to acquire one lease that expires after `lease_seconds`.
    ///
    /// Returns `None` when another holder owns the scope.
    async fn try_acquire_lease(
        &self,
        scope_key: &str,
        holder_id: &str,
        lease_seconds: u32,
    ) -> AppResult<Option<RunLease>>;
}
