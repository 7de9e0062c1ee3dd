use async_trait::async_trait;
use sqlx::PgPool;

use odontia_application::CategorySweeper;
use odontia_core::AppResult;
use odontia_domain::{RetentionCategory, RetentionCutoff};

use super::{count_with_cutoff, execute_with_cutoff};

/// Removes audit trail entries past their retention.
#[derive(Clone)]
pub struct PostgresAuditLogSweeper {
    pool: PgPool,
}

impl PostgresAuditLogSweeper {
    /// Creates a sweeper with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategorySweeper for PostgresAuditLogSweeper {
    fn category(&self) -> RetentionCategory {
        RetentionCategory::AuditLogs
    }

    async fn purge_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        execute_with_cutoff(
            &self.pool,
            r#"
            DELETE FROM audit_log_entries
            WHERE created_at < $1
            "#,
            cutoff,
            self.category(),
            "audit log entries",
        )
        .await
    }

    async fn count_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        count_with_cutoff(
            &self.pool,
            r#"
            SELECT COUNT(*)
            FROM audit_log_entries
            WHERE created_at < $1
            "#,
            cutoff,
            self.category(),
            "audit log entries",
        )
        .await
    }
}

/// Anonymizes signed consent terms once their proof period is over.
///
/// The consent row itself is kept so aggregate consent history survives;
/// only the signer's personal data is cleared.
#[derive(Clone)]
pub struct PostgresConsentSweeper {
    pool: PgPool,
}

impl PostgresConsentSweeper {
    /// Creates a sweeper with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategorySweeper for PostgresConsentSweeper {
    fn category(&self) -> RetentionCategory {
        RetentionCategory::Consents
    }

    async fn purge_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        execute_with_cutoff(
            &self.pool,
            r#"
            UPDATE patient_consents
            SET
                patient_id = NULL,
                signer_name = NULL,
                signer_document = NULL,
                signature_data = NULL,
                ip_address = NULL,
                anonymized_at = now()
            WHERE signed_at < $1
                AND anonymized_at IS NULL
            "#,
            cutoff,
            self.category(),
            "patient consents",
        )
        .await
    }

    async fn count_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        count_with_cutoff(
            &self.pool,
            r#"
            SELECT COUNT(*)
            FROM patient_consents
            WHERE signed_at < $1
                AND anonymized_at IS NULL
            "#,
            cutoff,
            self.category(),
            "patient consents",
        )
        .await
    }
}
