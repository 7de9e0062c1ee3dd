//! Application services and ports.

#![forbid(unsafe_code)]

mod policy_registry;
mod retention_ports;
mod retention_scheduler;
mod retention_service;

pub use policy_registry::{PolicyOverride, PolicyRegistry, default_retention_policies};
pub use retention_ports::{
    AuditEvent, AuditRepository, CategorySweeper, RunLease, RunLeaseCoordinator,
};
pub use retention_scheduler::{
    RETENTION_LEASE_SCOPE, RetentionScheduler, RetentionSchedulerConfig,
};
pub use retention_service::{
    DEFAULT_SWEEP_TIMEOUT, LifetimeCounter, RETENTION_AUDIT_SUBJECT, RetentionPreview,
    RetentionService, RetentionStats,
};
