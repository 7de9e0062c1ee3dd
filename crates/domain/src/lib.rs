//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod cleanup_run;
mod retention;
mod security;

pub use cleanup_run::{CleanupRun, CleanupRunError, RunTrigger, SweepResult};
pub use retention::{
    LegalFloor, RetentionCategory, RetentionCutoff, RetentionPeriod, RetentionPolicy,
};
pub use security::AuditAction;
