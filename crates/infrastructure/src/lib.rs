//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_retention_store;
mod postgres_audit_repository;
mod postgres_retention_sweepers;
mod redis_run_lease_coordinator;

pub use in_memory_retention_store::InMemoryCategorySweeper;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_retention_sweepers::{
    PostgresAuditLogSweeper, PostgresConsentSweeper, PostgresEmailVerificationSweeper,
    PostgresFiscalDocumentSweeper, PostgresMedicalRecordSweeper, PostgresPasswordResetSweeper,
    PostgresSessionSweeper, postgres_retention_sweepers,
};
pub use redis_run_lease_coordinator::RedisRunLeaseCoordinator;
