mod audit;
mod lease;
mod sweeper;

pub use audit::{AuditEvent, AuditRepository};
pub use lease::{RunLease, RunLeaseCoordinator};
pub use sweeper::CategorySweeper;
