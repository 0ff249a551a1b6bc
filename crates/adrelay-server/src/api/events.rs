//! Click recording and billing endpoints.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use adrelay_core::ClickMetadata;

use super::{map_budget_error, map_serve_error, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub struct ClickData {
    pub click_id: Uuid,
    pub impression_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct BillingData {
    /// Whether this call performed the billing; `false` means it was
    /// already billed and nothing changed.
    pub billed: bool,
}

/// POST /api/v1/impressions/{impression_id}/clicks
///
/// Records the click and flips the impression to `clicked`. Billing is a
/// separate, explicitly invoked step.
pub async fn record_click(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(impression_id): Path<Uuid>,
    Json(metadata): Json<ClickMetadata>,
) -> impl IntoResponse {
    match adrelay_serving::record_click(&state.pool, impression_id, &metadata).await {
        Ok(click) => Json(ApiResponse {
            data: ClickData {
                click_id: click.id,
                impression_id: click.impression_id,
            },
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Err(e) => map_serve_error(req_id.0, &e).into_response(),
    }
}

/// POST /api/v1/impressions/{impression_id}/billing
pub async fn bill_impression(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(impression_id): Path<Uuid>,
) -> impl IntoResponse {
    match adrelay_budget::process_impression_billing(&state.pool, impression_id).await {
        Ok(billed) => Json(ApiResponse {
            data: BillingData { billed },
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Err(e) => map_budget_error(req_id.0, &e).into_response(),
    }
}

/// POST /api/v1/clicks/{click_id}/billing
pub async fn bill_click(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(click_id): Path<Uuid>,
) -> impl IntoResponse {
    match adrelay_budget::process_click_billing(&state.pool, click_id).await {
        Ok(billed) => Json(ApiResponse {
            data: BillingData { billed },
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Err(e) => map_budget_error(req_id.0, &e).into_response(),
    }
}
