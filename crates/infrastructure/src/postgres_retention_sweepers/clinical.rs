use async_trait::async_trait;
use sqlx::PgPool;

use odontia_application::CategorySweeper;
use odontia_core::AppResult;
use odontia_domain::{RetentionCategory, RetentionCutoff};

use super::{count_with_cutoff, execute_with_cutoff};

/// Archives medical records past their retention by clearing clinical content.
#[derive(Clone)]
pub struct PostgresMedicalRecordSweeper {
    pool: PgPool,
}

impl PostgresMedicalRecordSweeper {
    /// Creates a sweeper with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategorySweeper for PostgresMedicalRecordSweeper {
    fn category(&self) -> RetentionCategory {
        RetentionCategory::MedicalRecords
    }

    async fn purge_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        execute_with_cutoff(
            &self.pool,
            r#"
            UPDATE medical_records
            SET
                patient_id = NULL,
                clinical_notes = NULL,
                attachment_url = NULL,
                archived_at = now()
            WHERE created_at < $1
                AND archived_at IS NULL
            "#,
            cutoff,
            self.category(),
            "medical records",
        )
        .await
    }

    async fn count_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        count_with_cutoff(
            &self.pool,
            r#"
            SELECT COUNT(*)
            FROM medical_records
            WHERE created_at < $1
                AND archived_at IS NULL
            "#,
            cutoff,
            self.category(),
            "medical records",
        )
        .await
    }
}

/// Removes fiscal documents past their retention.
#[derive(Clone)]
pub struct PostgresFiscalDocumentSweeper {
    pool: PgPool,
}

impl PostgresFiscalDocumentSweeper {
    /// Creates a sweeper with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategorySweeper for PostgresFiscalDocumentSweeper {
    fn category(&self) -> RetentionCategory {
        RetentionCategory::FiscalDocuments
    }

    async fn purge_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        execute_with_cutoff(
            &self.pool,
            r#"
            DELETE FROM fiscal_documents
            WHERE issued_at < $1
            "#,
            cutoff,
            self.category(),
            "fiscal documents",
        )
        .await
    }

    async fn count_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        count_with_cutoff(
            &self.pool,
            r#"
            SELECT COUNT(*)
            FROM fiscal_documents
            WHERE issued_at < $1
            "#,
            cutoff,
            self.category(),
            "fiscal documents",
        )
        .await
    }
}
