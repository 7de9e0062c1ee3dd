use async_trait::async_trait;
use chrono::{DateTime, Utc};
use odontia_application::CategorySweeper;
use odontia_core::{AppError, AppResult};
use odontia_domain::{RetentionCategory, RetentionCutoff};
use tokio::sync::RwLock;

/// In-memory sweeper holding row timestamps for one category.
///
/// Used for local runs without a database and by handler tests.
#[derive(Debug)]
pub struct InMemoryCategorySweeper {
    category: RetentionCategory,
    rows: RwLock<Vec<DateTime<Utc>>>,
}

impl InMemoryCategorySweeper {
    /// Creates an empty store for one category.
    #[must_use]
    pub fn new(category: RetentionCategory) -> Self {
        Self {
            category,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Stores one row whose retention clock started at `timestamp`.
    pub async fn insert_row(&self, timestamp: DateTime<Utc>) {
        self.rows.write().await.push(timestamp);
    }

    /// Returns the number of rows currently stored.
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }

    fn ensure_category(&self, cutoff: &RetentionCutoff) -> AppResult<()> {
        if cutoff.category() != self.category {
            return Err(AppError::Validation(format!(
                "cutoff for '{}' passed to '{}' sweeper",
                cutoff.category(),
                self.category
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl CategorySweeper for InMemoryCategorySweeper {
    fn category(&self) -> RetentionCategory {
        self.category
    }

    async fn purge_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        self.ensure_category(&cutoff)?;

        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|timestamp| !cutoff.is_expired(*timestamp));

        Ok(u64::try_from(before - rows.len()).unwrap_or(u64::MAX))
    }

    async fn count_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64> {
        self.ensure_category(&cutoff)?;

        let rows = self.rows.read().await;
        let expired = rows
            .iter()
            .filter(|timestamp| cutoff.is_expired(**timestamp))
            .count();

        Ok(u64::try_from(expired).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use odontia_application::CategorySweeper;
    use odontia_domain::{RetentionCategory, RetentionCutoff, RetentionPeriod, RetentionPolicy};

    use super::InMemoryCategorySweeper;

    #[tokio::test]
    async fn purge_removes_only_rows_older_than_cutoff() {
        let now = Utc::now();
        let sweeper = InMemoryCategorySweeper::new(RetentionCategory::OldSessions);
        sweeper.insert_row(now - TimeDelta::days(45)).await;
        sweeper.insert_row(now - TimeDelta::days(31)).await;
        sweeper.insert_row(now - TimeDelta::days(2)).await;

        let policy =
            RetentionPolicy::new(RetentionCategory::OldSessions, RetentionPeriod::Days(30));
        let cutoff = RetentionCutoff::for_policy(&policy, now);

        assert_eq!(sweeper.count_expired(cutoff).await.ok(), Some(2));
        assert_eq!(sweeper.purge_expired(cutoff).await.ok(), Some(2));
        assert_eq!(sweeper.row_count().await, 1);
        assert_eq!(sweeper.purge_expired(cutoff).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn row_exactly_at_cutoff_is_kept() {
        let now = Utc::now();
        let sweeper = InMemoryCategorySweeper::new(RetentionCategory::ExpiredTokens);
        let policy =
            RetentionPolicy::new(RetentionCategory::ExpiredTokens, RetentionPeriod::Days(1));
        let cutoff = RetentionCutoff::for_policy(&policy, now);
        sweeper.insert_row(cutoff.at()).await;

        assert_eq!(sweeper.purge_expired(cutoff).await.ok(), Some(0));
        assert_eq!(sweeper.row_count().await, 1);
    }

    #[tokio::test]
    async fn cutoff_for_another_category_is_rejected() {
        let sweeper = InMemoryCategorySweeper::new(RetentionCategory::OldSessions);
        let policy =
            RetentionPolicy::new(RetentionCategory::ExpiredTokens, RetentionPeriod::Days(1));
        let cutoff = RetentionCutoff::for_policy(&policy, Utc::now());

        assert!(sweeper.purge_expired(cutoff).await.is_err());
    }
}
