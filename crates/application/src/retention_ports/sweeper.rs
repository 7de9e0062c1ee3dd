use async_trait::async_trait;
use odontia_core::AppResult;
use odontia_domain::{RetentionCategory, RetentionCutoff};

/// Store-specific removal of expired rows for one data category.
///
/// Implementations only receive floor-checked cutoffs, so no sweeper can be
/// asked to touch rows younger than a category's legal minimum.
#[async_trait]
pub trait CategorySweeper: Send + Sync {
    /// Returns the category this sweeper owns.
    fn category(&self) -> RetentionCategory;

    /// Deletes or anonymizes rows strictly older than the cutoff.
    ///
    /// Must apply atomically and return the number of rows actually affected.
    async fn purge_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64>;

    /// Counts rows a purge with this cutoff would affect.
    async fn count_expired(&self, cutoff: RetentionCutoff) -> AppResult<u64>;
}
