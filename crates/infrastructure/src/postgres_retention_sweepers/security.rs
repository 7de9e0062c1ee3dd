use async_trait::async_trait;
use sqlx::PgPool;

use odontia_application::CategorySweeper;
use odontia_core::AppResult;
use odontia_domain::{RetentionCategory, RetentionCutoff};

use super::{count_with_cutoff, execute_with_cutoff};

/// Removes password reset tokens that expired before the cutoff.
#[derive(Clone)]
pub struct PostgresPasswordResetSweeper {
    pool: PgPool,
}

impl PostgresPasswordResetSweeper {
    /// Creates a sweeper with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategorySweeper for PostgresPasswordResetSweeper {
    fn category(&self) -> RetentionCategory {
        RetentionCategory::ExpiredTokens
    }

    async fn purge_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        execute_with_cutoff(
            &self.pool,
            r#"
            DELETE FROM password_resets
            WHERE expires_at < $1
            "#,
            cutoff,
            self.category(),
            "expired password reset tokens",
        )
        .await
    }

    async fn count_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        count_with_cutoff(
            &self.pool,
            r#"
            SELECT COUNT(*)
            FROM password_resets
            WHERE expires_at < $1
            "#,
            cutoff,
            self.category(),
            "expired password reset tokens",
        )
        .await
    }
}

/// Removes email verifications that were never completed.
#[derive(Clone)]
pub struct PostgresEmailVerificationSweeper {
    pool: PgPool,
}

impl PostgresEmailVerificationSweeper {
    /// Creates a sweeper with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategorySweeper for PostgresEmailVerificationSweeper {
    fn category(&self) -> RetentionCategory {
        RetentionCategory::EmailVerifications
    }

    async fn purge_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        execute_with_cutoff(
            &self.pool,
            r#"
            DELETE FROM email_verifications
            WHERE created_at < $1
                AND verified_at IS NULL
            "#,
            cutoff,
            self.category(),
            "unverified email verifications",
        )
        .await
    }

    async fn count_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        count_with_cutoff(
            &self.pool,
            r#"
            SELECT COUNT(*)
            FROM email_verifications
            WHERE created_at < $1
                AND verified_at IS NULL
            "#,
            cutoff,
            self.category(),
            "unverified email verifications",
        )
        .await
    }
}

/// Removes sessions without activity since the cutoff.
#[derive(Clone)]
pub struct PostgresSessionSweeper {
    pool: PgPool,
}

impl PostgresSessionSweeper {
    /// Creates a sweeper with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategorySweeper for PostgresSessionSweeper {
    fn category(&self) -> RetentionCategory {
        RetentionCategory::OldSessions
    }

    async fn purge_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        execute_with_cutoff(
            &self.pool,
            r#"
            DELETE FROM user_sessions
            WHERE last_activity_at < $1
            "#,
            cutoff,
            self.category(),
            "stale sessions",
        )
        .await
    }

    async fn count_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        count_with_cutoff(
            &self.pool,
            r#"
            SELECT COUNT(*)
            FROM user_sessions
            WHERE last_activity_at < $1
            "#,
            cutoff,
            self.category(),
            "stale sessions",
        )
        .await
    }
}
