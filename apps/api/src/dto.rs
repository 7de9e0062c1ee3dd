use serde::Serialize;

mod retention;

pub use retention::{
    CleanupRunResponse, RetentionPolicyQuery, RetentionPolicyResponse, RetentionPreviewResponse,
    RetentionStatsResponse,
};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
