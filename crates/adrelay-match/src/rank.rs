//! Pure scoring and ranking helpers for hybrid search.
//!
//! Kept free of I/O so the blend math is unit-testable on its own.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::types::{AdMatch, ScoredAd};

/// Bid amount at which the normalized revenue score saturates at 1.0.
const REVENUE_SCORE_CAP_BID: f64 = 10.0;

/// Normalized revenue score from a bid amount: `min(bid / 10, 1) × boost`.
#[must_use]
pub fn revenue_score(bid_amount: Decimal, revenue_boost: f64) -> f64 {
    let bid = bid_amount.to_f64().unwrap_or(0.0);
    (bid / REVENUE_SCORE_CAP_BID).min(1.0) * revenue_boost
}

/// Blend similarity with the revenue score:
/// `similarity × weight + revenue_score × (1 − weight)`.
#[must_use]
pub fn blend_score(similarity: f64, revenue: f64, vector_weight: f64) -> f64 {
    similarity * vector_weight + revenue * (1.0 - vector_weight)
}

/// Score and re-rank raw candidates by blended score, truncated to `limit`.
///
/// With `vector_weight = 1.0` the ordering is identical to pure similarity
/// ranking for the same candidate set.
#[must_use]
pub fn hybrid_rank(
    candidates: Vec<AdMatch>,
    vector_weight: f64,
    revenue_boost: f64,
    limit: usize,
) -> Vec<ScoredAd> {
    let mut scored: Vec<ScoredAd> = candidates
        .into_iter()
        .map(|m| {
            let revenue = revenue_score(m.ad.bid_amount, revenue_boost);
            let final_score = blend_score(m.similarity, revenue, vector_weight);
            ScoredAd {
                similarity: m.similarity,
                revenue_score: revenue,
                final_score,
                ad: m.ad,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(limit);
    scored
}

#[cfg(test)]
#[path = "rank_test.rs"]
mod rank_test;
