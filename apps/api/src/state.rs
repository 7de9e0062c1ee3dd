use std::sync::Arc;

use odontia_application::RetentionService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub retention_service: RetentionService,
    pub admin_api_token: Arc<str>,
}
