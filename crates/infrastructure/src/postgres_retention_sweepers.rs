//! PostgreSQL retention sweepers, one per data category.
//!
//! Every purge is a single `DELETE` or `UPDATE` statement, so a category is
//! either fully swept for a cutoff or left untouched.

use std::sync::Arc;

use sqlx::PgPool;

use odontia_application::CategorySweeper;
use odontia_core::{AppError, AppResult};
use odontia_domain::{RetentionCategory, RetentionCutoff};

mod clinical;
mod compliance;
mod security;


pub use clinical::{PostgresFiscalDocumentSweeper, PostgresMedicalRecordSweeper};
pub use compliance::{PostgresAuditLogSweeper, PostgresConsentSweeper};
pub use security::{
    PostgresEmailVerificationSweeper, PostgresPasswordResetSweeper, PostgresSessionSweeper,
};

/// Builds the PostgreSQL sweeper for every retention category.
#[must_use]
pub fn postgres_retention_sweepers(pool: PgPool) -> Vec<Arc<dyn CategorySweeper>> {
    vec![
        Arc::new(PostgresAuditLogSweeper::new(pool.clone())),
        Arc::new(PostgresPasswordResetSweeper::new(pool.clone())),
        Arc::new(PostgresEmailVerificationSweeper::new(pool.clone())),
        Arc::new(PostgresSessionSweeper::new(pool.clone())),
        Arc::new(PostgresConsentSweeper::new(pool.clone())),
        Arc::new(PostgresMedicalRecordSweeper::new(pool.clone())),
        Arc::new(PostgresFiscalDocumentSweeper::new(pool)),
    ]
}

fn ensure_category(
    cutoff: RetentionCutoff,
    expected: RetentionCategory,
    label: &str,
) -> AppResult<()> {
    if cutoff.category() == expected {
        return Ok(());
    }

    Err(AppError::Validation(format!(
        "{label} sweeper cannot apply a {} cutoff",
        cutoff.category()
    )))
}

async fn execute_with_cutoff(
    pool: &PgPool,
    statement: &str,
    cutoff: RetentionCutoff,
    expected: RetentionCategory,
    label: &str,
) -> AppResult<u64> {
    ensure_category(cutoff, expected, label)?;
    let result = sqlx::query(statement)
        .bind(cutoff.at())
        .execute(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to purge {label}: {error}")))?;

    Ok(result.rows_affected())
}

async fn count_with_cutoff(
    pool: &PgPool,
    statement: &str,
    cutoff: RetentionCutoff,
    expected: RetentionCategory,
    label: &str,
) -> AppResult<u64> {
    ensure_category(cutoff, expected, label)?;
    let count = sqlx::query_scalar::<_, i64>(statement)
        .bind(cutoff.at())
        .fetch_one(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count {label}: {error}")))?;

    u64::try_from(count)
        .map_err(|error| AppError::Internal(format!("invalid {label} count {count}: {error}")))
}
