//! Option and result types for ad matching.

use adrelay_core::settings::DEFAULT_SIMILARITY_THRESHOLD;
use adrelay_db::{AdMatchRow, AdSearchFilters};

/// Options for a plain similarity search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: i64,
    /// Minimum similarity (`1 - distance`) to keep a candidate.
    pub threshold: f64,
    pub filters: AdSearchFilters,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            filters: AdSearchFilters::default(),
        }
    }
}

/// Options for hybrid (similarity × revenue) search.
#[derive(Debug, Clone)]
pub struct HybridOptions {
    pub limit: i64,
    /// Weight of similarity in the blend, in `[0, 1]`. `1.0` degenerates
    /// to pure similarity ranking.
    pub vector_weight: f64,
    /// Multiplier applied to the normalized revenue score.
    pub revenue_boost: f64,
    pub filters: AdSearchFilters,
}

impl Default for HybridOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            vector_weight: 0.7,
            revenue_boost: 1.0,
            filters: AdSearchFilters::default(),
        }
    }
}

/// Options for conversation-context search.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// How many trailing messages feed the context string.
    pub lookback_messages: i64,
    pub search: SearchOptions,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            lookback_messages: 10,
            search: SearchOptions::default(),
        }
    }
}

/// One matched ad with its similarity to the query.
#[derive(Debug, Clone)]
pub struct AdMatch {
    pub ad: AdMatchRow,
    pub similarity: f64,
}

/// One hybrid-ranked ad with its score breakdown.
#[derive(Debug, Clone)]
pub struct ScoredAd {
    pub ad: AdMatchRow,
    pub similarity: f64,
    pub revenue_score: f64,
    pub final_score: f64,
}
