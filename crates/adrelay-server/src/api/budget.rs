//! Budget status and performance reporting endpoints.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adrelay_budget::{BudgetStatus, ReportWindow};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub struct BudgetStatusData {
    pub campaign_id: Uuid,
    pub status: String,
    pub currency: String,
    pub budget_amount: Decimal,
    pub spent_amount: Decimal,
    pub remaining_budget: Decimal,
    pub is_out_of_budget: bool,
    pub utilization_percent: f64,
    pub days_remaining: i64,
    pub projected_daily_spend: Decimal,
    pub projected_total_spend: Decimal,
}

impl From<BudgetStatus> for BudgetStatusData {
    fn from(status: BudgetStatus) -> Self {
        Self {
            campaign_id: status.campaign_id,
            status: status.status,
            currency: status.currency,
            budget_amount: status.budget_amount,
            spent_amount: status.spent_amount,
            remaining_budget: status.remaining_budget,
            is_out_of_budget: status.is_out_of_budget,
            utilization_percent: status.utilization_percent,
            days_remaining: status.days_remaining,
            projected_daily_spend: status.projected_daily_spend,
            projected_total_spend: status.projected_total_spend,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// `24h`, `7d`, or `30d`; defaults to `7d`.
    pub window: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportData {
    pub campaign_id: Uuid,
    pub window: &'static str,
    pub impressions: i64,
    pub clicks: i64,
    pub billed_revenue: Decimal,
    pub total_revenue: Decimal,
    pub ctr: f64,
    pub average_cpc: Decimal,
    pub roi: f64,
}

fn parse_window(raw: Option<&str>) -> Result<ReportWindow, String> {
    match raw.unwrap_or("7d") {
        "24h" => Ok(ReportWindow::Day),
        "7d" => Ok(ReportWindow::Week),
        "30d" => Ok(ReportWindow::Month),
        other => Err(format!("unknown report window: {other} (expected 24h, 7d, or 30d)")),
    }
}

fn window_label(window: ReportWindow) -> &'static str {
    match window {
        ReportWindow::Day => "24h",
        ReportWindow::Week => "7d",
        ReportWindow::Month => "30d",
    }
}

/// GET /api/v1/campaigns/{campaign_id}/budget
pub async fn budget_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(campaign_id): Path<Uuid>,
) -> impl IntoResponse {
    match adrelay_budget::campaign_budget_status(&state.pool, campaign_id, Utc::now()).await {
        Ok(Some(status)) => Json(ApiResponse {
            data: BudgetStatusData::from(status),
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Ok(None) => ApiError::new(
            req_id.0,
            "not_found",
            format!("campaign not found: {campaign_id}"),
        )
        .into_response(),
        Err(e) => super::map_budget_error(req_id.0, &e).into_response(),
    }
}

/// GET /api/v1/campaigns/{campaign_id}/report?window=7d
pub async fn campaign_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<ReportQuery>,
) -> impl IntoResponse {
    let window = match parse_window(query.window.as_deref()) {
        Ok(window) => window,
        Err(message) => {
            return ApiError::new(req_id.0, "validation_error", message).into_response()
        }
    };

    match adrelay_budget::campaign_report(&state.pool, campaign_id, window, Utc::now()).await {
        Ok(report) => Json(ApiResponse {
            data: ReportData {
                campaign_id: report.campaign_id,
                window: window_label(report.window),
                impressions: report.impressions,
                clicks: report.clicks,
                billed_revenue: report.billed_revenue,
                total_revenue: report.total_revenue,
                ctr: report.ctr,
                average_cpc: report.average_cpc,
                roi: report.roi,
            },
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Err(e) => super::map_budget_error(req_id.0, &e).into_response(),
    }
}
