use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/api/admin/retention/stats",
            get(handlers::retention::retention_stats_handler),
        )
        .route(
            "/api/admin/retention/cleanup",
            post(handlers::retention::force_cleanup_handler),
        )
        .route(
            "/api/admin/retention/policy",
            get(handlers::retention::retention_policies_handler),
        )
        .route(
            "/api/admin/retention/preview",
            get(handlers::retention::retention_preview_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_admin_token,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
