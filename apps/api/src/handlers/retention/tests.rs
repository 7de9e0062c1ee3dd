use std::sync::Arc;

use async_trait::async_trait;
use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{Request, StatusCode, header};
use chrono::{TimeDelta, Utc};
use odontia_application::{
    AuditEvent, AuditRepository, CategorySweeper, PolicyRegistry, RetentionService,
};
use odontia_core::{AppError, AppResult};
use odontia_domain::{RetentionCategory, RetentionCutoff, RetentionPeriod, RetentionPolicy};
use odontia_infrastructure::InMemoryCategorySweeper;
use tokio::sync::{Mutex, Notify};
use tower::ServiceExt;

use super::{
    force_cleanup_handler, retention_policies_handler, retention_preview_handler,
    retention_stats_handler,
};
use crate::api_router::build_router;
use crate::dto::RetentionPolicyQuery;
use crate::error::ApiError;
use crate::state::AppState;

const ADMIN_TOKEN: &str = "test-admin-token-0123456789abcdef";

#[derive(Default)]
struct RecordingAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for RecordingAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

struct GatedSweeper {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl CategorySweeper for GatedSweeper {
    fn category(&self) -> RetentionCategory {
        RetentionCategory::OldSessions
    }

    async fn purge_expired(&self, _cutoff: RetentionCutoff) -> AppResult<u64> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(0)
    }

    async fn count_expired(&self, _cutoff: RetentionCutoff) -> AppResult<u64> {
        Ok(0)
    }
}

fn security_registry() -> PolicyRegistry {
    let registry = PolicyRegistry::new(vec![
        RetentionPolicy::new(RetentionCategory::ExpiredTokens, RetentionPeriod::Days(1)),
        RetentionPolicy::new(RetentionCategory::OldSessions, RetentionPeriod::Days(30)),
    ]);

    match registry {
        Ok(registry) => registry,
        Err(error) => panic!("failed to build test registry: {error}"),
    }
}

fn app_state(sweepers: Vec<Arc<dyn CategorySweeper>>) -> AppState {
    let service = RetentionService::new(
        security_registry(),
        sweepers,
        Arc::new(RecordingAuditRepository::default()),
    );

    match service {
        Ok(retention_service) => AppState {
            retention_service,
            admin_api_token: Arc::from(ADMIN_TOKEN),
        },
        Err(error) => panic!("failed to build test service: {error}"),
    }
}

async fn seeded_state() -> (AppState, Arc<InMemoryCategorySweeper>) {
    let now = Utc::now();
    let tokens = Arc::new(InMemoryCategorySweeper::new(RetentionCategory::ExpiredTokens));
    tokens.insert_row(now - TimeDelta::days(3)).await;
    tokens.insert_row(now - TimeDelta::days(2)).await;
    tokens.insert_row(now - TimeDelta::hours(1)).await;

    let sessions = Arc::new(InMemoryCategorySweeper::new(RetentionCategory::OldSessions));
    sessions.insert_row(now - TimeDelta::days(45)).await;
    sessions.insert_row(now - TimeDelta::days(5)).await;

    let state = app_state(vec![
        tokens.clone() as Arc<dyn CategorySweeper>,
        sessions as Arc<dyn CategorySweeper>,
    ]);
    (state, tokens)
}

fn admin_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match builder.body(Body::empty()) {
        Ok(request) => request,
        Err(error) => panic!("failed to build test request: {error}"),
    }
}

#[tokio::test]
async fn force_cleanup_purges_expired_rows() {
    let (state, tokens) = seeded_state().await;

    let (status, Json(run)) = force_cleanup_handler(State(state)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(run.status, "completed");
    assert_eq!(run.triggered_by, "manual");
    assert_eq!(run.total_deleted, 3);
    assert_eq!(run.results.len(), 2);
    assert_eq!(run.results[0].category, "expired_tokens");
    assert_eq!(run.results[0].deleted_count, 2);
    assert_eq!(tokens.row_count().await, 1);
}

#[tokio::test]
async fn stats_reflect_finished_run() {
    let (state, _tokens) = seeded_state().await;
    let _ = force_cleanup_handler(State(state.clone())).await;

    let Json(stats) = retention_stats_handler(State(state)).await;

    assert_eq!(stats.completed_runs, 1);
    assert_eq!(stats.rejected_runs, 0);
    assert!(!stats.run_in_progress);
    assert!(stats.last_run.is_some_and(|run| run.total_deleted == 3));
    let lifetime: Vec<(&str, u64)> = stats
        .lifetime
        .iter()
        .map(|counter| (counter.category, counter.total_deleted))
        .collect();
    assert_eq!(lifetime, vec![("expired_tokens", 2), ("old_sessions", 1)]);
}

#[tokio::test]
async fn cleanup_during_active_run_is_accepted_as_already_running() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let state = app_state(vec![Arc::new(GatedSweeper {
        entered: entered.clone(),
        release: release.clone(),
    })]);

    let background = state.retention_service.clone();
    let in_flight = tokio::spawn(async move { background.force_cleanup().await });
    entered.notified().await;

    let (status, Json(run)) = force_cleanup_handler(State(state.clone())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(run.status, "already_running");
    assert!(run.results.is_empty());

    release.notify_one();
    let finished = in_flight.await;
    assert!(finished.is_ok_and(|run| !run.is_already_running()));

    let Json(stats) = retention_stats_handler(State(state)).await;
    assert_eq!(stats.completed_runs, 1);
    assert_eq!(stats.rejected_runs, 1);
}

#[tokio::test]
async fn policy_listing_supports_category_filter() {
    let (state, _tokens) = seeded_state().await;

    let all =
        retention_policies_handler(State(state.clone()), Query(RetentionPolicyQuery::default()))
            .await;
    assert!(all.is_ok_and(|Json(policies)| policies.len() == 2));

    let sessions = retention_policies_handler(
        State(state.clone()),
        Query(RetentionPolicyQuery {
            category: Some("old_sessions".to_owned()),
        }),
    )
    .await;
    assert!(sessions.is_ok_and(|Json(policies)| {
        policies.len() == 1
            && policies[0].category == "old_sessions"
            && policies[0].effective_period.amount == 30
    }));

    let unregistered = retention_policies_handler(
        State(state.clone()),
        Query(RetentionPolicyQuery {
            category: Some("medical_records".to_owned()),
        }),
    )
    .await;
    assert!(matches!(unregistered, Err(ApiError(AppError::NotFound(_)))));

    let unknown = retention_policies_handler(
        State(state),
        Query(RetentionPolicyQuery {
            category: Some("invoices".to_owned()),
        }),
    )
    .await;
    assert!(matches!(unknown, Err(ApiError(AppError::Validation(_)))));
}

#[tokio::test]
async fn preview_counts_without_deleting() {
    let (state, tokens) = seeded_state().await;

    let Json(previews) = retention_preview_handler(State(state)).await;

    let counts: Vec<(&str, u64)> = previews
        .iter()
        .map(|preview| (preview.category, preview.eligible_count))
        .collect();
    assert_eq!(counts, vec![("expired_tokens", 2), ("old_sessions", 1)]);
    assert_eq!(tokens.row_count().await, 3);
}

#[tokio::test]
async fn admin_routes_require_bearer_token() {
    let (state, _tokens) = seeded_state().await;
    let router = build_router(state);

    let missing = router
        .clone()
        .oneshot(admin_request("GET", "/api/admin/retention/stats", None))
        .await;
    assert!(missing.is_ok_and(|response| response.status() == StatusCode::UNAUTHORIZED));

    let wrong = router
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/retention/cleanup",
            Some("not-the-admin-token-but-long-enough"),
        ))
        .await;
    assert!(wrong.is_ok_and(|response| response.status() == StatusCode::UNAUTHORIZED));

    let authorized = router
        .clone()
        .oneshot(admin_request(
            "GET",
            "/api/admin/retention/policy",
            Some(ADMIN_TOKEN),
        ))
        .await;
    assert!(authorized.is_ok_and(|response| response.status() == StatusCode::OK));

    let health = router
        .oneshot(admin_request("GET", "/health", None))
        .await;
    assert!(health.is_ok_and(|response| response.status() == StatusCode::OK));
}
