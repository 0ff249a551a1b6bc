//! Read-model aggregations for campaign performance and budget utilization.
//!
//! Pure reporting queries; no side effects.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Raw counts for one campaign inside a reporting window.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignPerformanceRow {
    pub impressions: i64,
    pub clicks: i64,
    pub billed_revenue: Decimal,
    pub total_revenue: Decimal,
    /// Creator payout locked in on the billed impressions.
    pub billed_payout: Decimal,
}

/// Per-campaign utilization snapshot with in-window activity counts.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BudgetUtilizationRow {
    pub campaign_id: Uuid,
    pub campaign_name: String,
    pub status: String,
    pub budget_amount: Decimal,
    pub spent_amount: Decimal,
    pub impressions: i64,
    pub clicks: i64,
}

/// Impression/click/revenue counts for one campaign since `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn campaign_performance(
    pool: &PgPool,
    campaign_id: Uuid,
    since: DateTime<Utc>,
) -> Result<CampaignPerformanceRow, DbError> {
    // Clicks are aggregated separately; joining them onto impressions would
    // fan out the impression counts and revenue sums.
    let row = sqlx::query_as::<_, CampaignPerformanceRow>(
        "SELECT \
             COUNT(i.id) AS impressions, \
             COALESCE((SELECT COUNT(*) FROM clicks k \
                       JOIN impressions ki ON ki.id = k.impression_id \
                       JOIN ads ka ON ka.id = ki.ad_id \
                       WHERE ka.campaign_id = $1 AND ki.created_at >= $2), 0) AS clicks, \
             COALESCE(SUM(i.revenue_amount) FILTER (WHERE i.status = 'billed'), 0) \
                 AS billed_revenue, \
             COALESCE(SUM(i.revenue_amount), 0) AS total_revenue, \
             COALESCE(SUM(i.creator_payout_amount) FILTER (WHERE i.status = 'billed'), 0) \
                 AS billed_payout \
         FROM impressions i \
         JOIN ads a ON a.id = i.ad_id \
         WHERE a.campaign_id = $1 AND i.created_at >= $2",
    )
    .bind(campaign_id)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Utilization snapshot for every campaign, with activity since `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn budget_utilization(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<BudgetUtilizationRow>, DbError> {
    let rows = sqlx::query_as::<_, BudgetUtilizationRow>(
        "SELECT \
             c.id AS campaign_id, \
             c.name AS campaign_name, \
             c.status, \
             c.budget_amount, \
             c.spent_amount, \
             COUNT(DISTINCT i.id) AS impressions, \
             COUNT(DISTINCT k.id) AS clicks \
         FROM campaigns c \
         LEFT JOIN ads a ON a.campaign_id = c.id \
         LEFT JOIN impressions i ON i.ad_id = a.id AND i.created_at >= $1 \
         LEFT JOIN clicks k ON k.impression_id = i.id \
         GROUP BY c.id, c.name, c.status, c.budget_amount, c.spent_amount \
         ORDER BY c.spent_amount DESC",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
