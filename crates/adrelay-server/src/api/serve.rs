//! Serve endpoints: contextual, conversation-driven, and display.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use adrelay_core::AdType;
use adrelay_db::AdSearchFilters;
use adrelay_serving::ServeOptions;

use super::{map_db_error, map_serve_error, normalize_limit, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub struct ContextualServeRequest {
    pub creator_id: Uuid,
    pub query: String,
    pub session_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub similarity_threshold: Option<f64>,
    pub vector_weight: Option<f64>,
    pub revenue_boost: Option<f64>,
    pub ad_types: Option<Vec<String>>,
    pub placement: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationServeRequest {
    pub session_id: Uuid,
    pub limit: Option<i64>,
    pub similarity_threshold: Option<f64>,
    pub ad_types: Option<Vec<String>>,
    pub placement: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DisplayServeRequest {
    pub creator_id: Uuid,
    pub session_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub placement: Option<String>,
}

/// POST /api/v1/serve/contextual
pub async fn serve_contextual(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ContextualServeRequest>,
) -> impl IntoResponse {
    let mut opts = ServeOptions::new(body.creator_id);
    opts.session_id = body.session_id;
    opts.limit = normalize_limit(body.limit);
    if let Some(threshold) = body.similarity_threshold {
        opts.similarity_threshold = threshold;
    }
    if let Some(weight) = body.vector_weight {
        opts.vector_weight = weight;
    }
    if let Some(boost) = body.revenue_boost {
        opts.revenue_boost = boost;
    }
    opts.filters = AdSearchFilters {
        ad_types: body.ad_types,
        placement: body.placement.clone(),
        ..AdSearchFilters::default()
    };
    opts.placement = body.placement;

    match state.server.serve_contextual_ads(&body.query, &opts).await {
        Ok(outcome) => Json(ApiResponse {
            data: outcome,
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Err(e) => map_serve_error(req_id.0, &e).into_response(),
    }
}

/// POST /api/v1/serve/conversation
///
/// The creator comes from the session row; callers cannot serve someone
/// else's surface by naming a different creator.
pub async fn serve_conversation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ConversationServeRequest>,
) -> impl IntoResponse {
    let session = match adrelay_db::sessions::get_session(&state.pool, body.session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return super::ApiError::new(
                req_id.0,
                "not_found",
                format!("session not found: {}", body.session_id),
            )
            .into_response()
        }
        Err(e) => return map_db_error(req_id.0, &e).into_response(),
    };

    let settings = match adrelay_db::settings::get_business_settings(&state.pool, session.creator_id)
        .await
    {
        Ok(row) => adrelay_db::settings::effective_settings(row),
        Err(e) => return map_db_error(req_id.0, &e).into_response(),
    };

    let mut opts = ServeOptions::new(session.creator_id);
    opts.session_id = Some(body.session_id);
    opts.limit = normalize_limit(body.limit);
    opts.similarity_threshold = body
        .similarity_threshold
        .unwrap_or(settings.similarity_threshold);
    opts.vector_weight = conversation_vector_weight(settings.revenue_weight);
    opts.filters = AdSearchFilters {
        ad_types: body.ad_types,
        placement: body.placement.clone(),
        ..AdSearchFilters::default()
    };
    opts.placement = body.placement;

    match state.server.serve_conversation_ads(body.session_id, &opts).await {
        Ok(outcome) => Json(ApiResponse {
            data: outcome,
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Err(e) => map_serve_error(req_id.0, &e).into_response(),
    }
}

/// The creator's `revenue_weight` is the share of the blend given to
/// revenue, so similarity gets the complement.
fn conversation_vector_weight(revenue_weight: f64) -> f64 {
    (1.0 - revenue_weight).clamp(0.0, 1.0)
}

/// POST /api/v1/serve/display
///
/// Drains the session's queued display candidates first, then falls back
/// to revenue-ordered display-class ads; the approval step lives in
/// [`display_timing`].
pub async fn serve_display(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<DisplayServeRequest>,
) -> impl IntoResponse {
    let mut opts = ServeOptions::new(body.creator_id);
    opts.session_id = body.session_id;
    // Display slots are served one at a time by default.
    opts.limit = body.limit.unwrap_or(1).clamp(1, 5);
    opts.filters = AdSearchFilters {
        ad_types: Some(
            AdType::display_types()
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
        ),
        placement: body.placement.clone(),
        ..AdSearchFilters::default()
    };
    opts.placement = body.placement;

    match state.server.serve_display_ads(&opts).await {
        Ok(outcome) => Json(ApiResponse {
            data: outcome,
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Err(e) => map_serve_error(req_id.0, &e).into_response(),
    }
}

/// GET /api/v1/sessions/{session_id}/display-timing
pub async fn display_timing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(session_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.server.display_ad_timing(session_id).await {
        Ok(verdict) => Json(ApiResponse {
            data: verdict,
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Err(e) => map_serve_error(req_id.0, &e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_weight_is_the_complement_of_revenue_weight() {
        assert!((conversation_vector_weight(0.5) - 0.5).abs() < f64::EPSILON);
        assert!((conversation_vector_weight(0.2) - 0.8).abs() < f64::EPSILON);
        assert!(conversation_vector_weight(1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn vector_weight_clamps_out_of_range_settings() {
        assert!((conversation_vector_weight(-0.5) - 1.0).abs() < f64::EPSILON);
        assert!(conversation_vector_weight(1.5).abs() < f64::EPSILON);
    }
}
