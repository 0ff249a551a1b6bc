mod budget;
mod events;
mod serve;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use adrelay_match::AdSearcher;
use adrelay_serving::AdServer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::rpc::{self, session::SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub searcher: Arc<AdSearcher>,
    pub server: Arc<AdServer>,
    pub sessions: Arc<dyn SessionStore>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(3).clamp(1, 20)
}

pub(super) fn map_db_error(request_id: String, error: &adrelay_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_serve_error(request_id: String, error: &adrelay_serving::ServeError) -> ApiError {
    if let adrelay_serving::ServeError::ImpressionNotFound(id) = error {
        return ApiError::new(request_id, "not_found", format!("impression not found: {id}"));
    }
    tracing::error!(error = %error, "serve operation failed");
    ApiError::new(request_id, "internal_error", "serve operation failed")
}

pub(super) fn map_budget_error(request_id: String, error: &adrelay_budget::BudgetError) -> ApiError {
    match error {
        adrelay_budget::BudgetError::ImpressionNotFound(_)
        | adrelay_budget::BudgetError::ClickNotFound(_) => {
            ApiError::new(request_id, "not_found", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "billing operation failed");
            ApiError::new(request_id, "internal_error", "billing operation failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(rpc::SESSION_HEADER),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/serve/contextual", post(serve::serve_contextual))
        .route(
            "/api/v1/serve/conversation",
            post(serve::serve_conversation),
        )
        .route("/api/v1/serve/display", post(serve::serve_display))
        .route(
            "/api/v1/sessions/{session_id}/display-timing",
            get(serve::display_timing),
        )
        .route(
            "/api/v1/impressions/{impression_id}/clicks",
            post(events::record_click),
        )
        .route(
            "/api/v1/impressions/{impression_id}/billing",
            post(events::bill_impression),
        )
        .route(
            "/api/v1/clicks/{click_id}/billing",
            post(events::bill_click),
        )
        .route(
            "/api/v1/campaigns/{campaign_id}/budget",
            get(budget::budget_status),
        )
        .route(
            "/api/v1/campaigns/{campaign_id}/report",
            get(budget::campaign_report),
        )
        .route("/rpc", post(rpc::handle_rpc))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match adrelay_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 3);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(100)), 20);
        assert_eq!(normalize_limit(Some(5)), 5);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("req-2", "not_found", "no such impression").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
