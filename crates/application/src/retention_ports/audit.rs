use async_trait::async_trait;
use odontia_core::AppResult;
use odontia_domain::AuditAction;
use serde_json::Value;

/// Immutable audit event payload emitted by application services.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Subject that performed the action.
    pub subject: String,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Whether the audited operation fully succeeded.
    pub success: bool,
    /// Structured audit detail payload.
    pub detail: Value,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
