use super::*;

use adrelay_db::AdMatchRow;
use chrono::Utc;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn match_with(bid: Decimal, similarity: f64) -> AdMatch {
    AdMatch {
        ad: AdMatchRow {
            id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            title: "ad".to_string(),
            content: "content".to_string(),
            target_url: "https://example.com".to_string(),
            ad_type: "hyperlink".to_string(),
            placement: "chat_inline".to_string(),
            pricing_model: "cpc".to_string(),
            bid_amount: bid,
            status: "active".to_string(),
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            distance: 1.0 - similarity,
        },
        similarity,
    }
}

#[test]
fn revenue_score_is_linear_below_cap() {
    assert!((revenue_score(dec!(5), 1.0) - 0.5).abs() < 1e-9);
    assert!((revenue_score(dec!(2.5), 1.0) - 0.25).abs() < 1e-9);
}

#[test]
fn revenue_score_saturates_at_cap() {
    assert!((revenue_score(dec!(10), 1.0) - 1.0).abs() < 1e-9);
    assert!((revenue_score(dec!(250), 1.0) - 1.0).abs() < 1e-9);
}

#[test]
fn revenue_boost_scales_the_score() {
    assert!((revenue_score(dec!(5), 2.0) - 1.0).abs() < 1e-9);
    assert!((revenue_score(dec!(5), 0.5) - 0.25).abs() < 1e-9);
}

#[test]
fn blend_with_full_vector_weight_is_pure_similarity() {
    assert!((blend_score(0.8, 0.9, 1.0) - 0.8).abs() < 1e-9);
}

#[test]
fn blend_with_zero_vector_weight_is_pure_revenue() {
    assert!((blend_score(0.8, 0.9, 0.0) - 0.9).abs() < 1e-9);
}

#[test]
fn full_vector_weight_ranks_identically_to_similarity() {
    let candidates = vec![
        match_with(dec!(100), 0.30),
        match_with(dec!(0.01), 0.90),
        match_with(dec!(50), 0.60),
    ];
    let by_similarity: Vec<Uuid> = {
        let mut sorted = candidates.clone();
        sorted.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
        sorted.iter().map(|m| m.ad.id).collect()
    };

    let ranked = hybrid_rank(candidates, 1.0, 1.0, 10);
    let hybrid_order: Vec<Uuid> = ranked.iter().map(|s| s.ad.id).collect();

    assert_eq!(hybrid_order, by_similarity);
}

#[test]
fn high_bid_can_outrank_higher_similarity_at_low_weight() {
    let cheap_relevant = match_with(dec!(0.10), 0.9);
    let pricey_loose = match_with(dec!(10), 0.5);
    let pricey_id = pricey_loose.ad.id;

    let ranked = hybrid_rank(vec![cheap_relevant, pricey_loose], 0.2, 1.0, 10);
    assert_eq!(ranked[0].ad.id, pricey_id);
}

#[test]
fn hybrid_rank_truncates_to_limit() {
    let candidates = (0..6).map(|i| match_with(dec!(1), 0.1 * f64::from(i))).collect();
    let ranked = hybrid_rank(candidates, 0.7, 1.0, 3);
    assert_eq!(ranked.len(), 3);
    // Descending final score.
    assert!(ranked[0].final_score >= ranked[1].final_score);
    assert!(ranked[1].final_score >= ranked[2].final_score);
}
