//! Serving request/response types.

use adrelay_db::AdSearchFilters;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use adrelay_core::settings::DEFAULT_SIMILARITY_THRESHOLD;

/// Options for a serve request.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Creator whose surface the ads render on; owns the payout.
    pub creator_id: Uuid,
    /// Session to attribute impressions to; `None` serves without
    /// recording impressions.
    pub session_id: Option<Uuid>,
    pub limit: i64,
    pub similarity_threshold: f64,
    /// Weight of similarity in hybrid ranking.
    pub vector_weight: f64,
    pub revenue_boost: f64,
    pub filters: AdSearchFilters,
    /// Recorded on impressions for placement-level reporting.
    pub placement: Option<String>,
}

impl ServeOptions {
    #[must_use]
    pub fn new(creator_id: Uuid) -> Self {
        Self {
            creator_id,
            session_id: None,
            limit: 3,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            vector_weight: 0.7,
            revenue_boost: 1.0,
            filters: AdSearchFilters::default(),
            placement: None,
        }
    }
}

/// One ad as returned to the caller of a serve operation.
#[derive(Debug, Clone, Serialize)]
pub struct ServedAd {
    pub ad_id: Uuid,
    pub campaign_id: Uuid,
    pub title: String,
    pub content: String,
    pub target_url: String,
    pub ad_type: String,
    pub placement: String,
    /// `0.0` for revenue-ordered default ads (no query to compare against).
    pub similarity: f64,
    /// Serve-time revenue: the bid amount (CPC simplification).
    pub revenue: Decimal,
    /// Present when the serve recorded an impression.
    pub impression_id: Option<Uuid>,
}

/// Result of a serve operation.
///
/// An empty `ads` list always carries a `reason` — an observable
/// diagnostic, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct ServeOutcome {
    pub ads: Vec<ServedAd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Verdict of the display-ad admission check.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayTiming {
    pub should_show: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Where to fetch the actual display ad when approved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serve_endpoint: Option<String>,
}
