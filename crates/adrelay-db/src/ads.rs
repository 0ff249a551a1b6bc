//! Database operations for `ads`.
//!
//! Eligibility invariant, applied by every serving-path query here and in
//! [`crate::search`]: an ad is servable iff it is `active`, not
//! soft-deleted, and its campaign is `active`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `ads` table (embedding column excluded; vectors never
/// leave the store except as distances).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdRow {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub title: String,
    pub content: String,
    pub target_url: String,
    pub ad_type: String,
    pub placement: String,
    pub pricing_model: String,
    pub bid_amount: Decimal,
    pub status: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const AD_COLUMNS: &str = "a.id, a.campaign_id, a.title, a.content, a.target_url, \
     a.ad_type, a.placement, a.pricing_model, a.bid_amount, a.status, \
     a.deleted_at, a.created_at, a.updated_at";

pub(crate) const ELIGIBILITY_CLAUSE: &str = "a.status = 'active' \
     AND a.deleted_at IS NULL \
     AND c.status = 'active'";

/// Fetch an ad by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_ad(pool: &PgPool, id: Uuid) -> Result<Option<AdRow>, DbError> {
    let row = sqlx::query_as::<_, AdRow>(&format!(
        "SELECT {AD_COLUMNS} FROM ads a WHERE a.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Highest-bid eligible ads, optionally narrowed by type and placement.
///
/// The revenue-ordered fallback for serving paths with no query signal.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_default_ads(
    pool: &PgPool,
    limit: i64,
    ad_types: Option<&[String]>,
    placement: Option<&str>,
) -> Result<Vec<AdRow>, DbError> {
    let rows = sqlx::query_as::<_, AdRow>(&format!(
        "SELECT {AD_COLUMNS} FROM ads a \
         JOIN campaigns c ON c.id = a.campaign_id \
         WHERE {ELIGIBILITY_CLAUSE} \
           AND ($1::TEXT[] IS NULL OR a.ad_type = ANY($1)) \
           AND ($2::TEXT IS NULL OR a.placement = $2) \
         ORDER BY a.bid_amount DESC \
         LIMIT $3"
    ))
    .bind(ad_types)
    .bind(placement)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Eligible ads among `ids`. Stale ids (paused, deleted, exhausted
/// campaign) are silently dropped; row order is unspecified.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_eligible_ads_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<AdRow>, DbError> {
    let rows = sqlx::query_as::<_, AdRow>(&format!(
        "SELECT {AD_COLUMNS} FROM ads a \
         JOIN campaigns c ON c.id = a.campaign_id \
         WHERE {ELIGIBILITY_CLAUSE} \
           AND a.id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Whether at least one eligible banner ad exists.
///
/// The display-timing check refuses a slot when there is nothing to fill it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn eligible_banner_ad_exists(pool: &PgPool) -> Result<bool, DbError> {
    let exists: (bool,) = sqlx::query_as(&format!(
        "SELECT EXISTS( \
             SELECT 1 FROM ads a \
             JOIN campaigns c ON c.id = a.campaign_id \
             WHERE {ELIGIBILITY_CLAUSE} AND a.ad_type = 'banner')"
    ))
    .fetch_one(pool)
    .await?;
    Ok(exists.0)
}

/// Store a freshly computed embedding on an ad.
///
/// The vector is bound as a pgvector text literal and cast server-side.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for unknown ads, [`DbError::Sqlx`] otherwise.
pub async fn update_ad_embedding(
    pool: &PgPool,
    id: Uuid,
    embedding: &[f32],
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ads SET embedding = $2::vector, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(crate::search::vector_literal(embedding))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Non-deleted ads that have no embedding yet, oldest first.
///
/// Feed for the CLI embedding backfill.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ads_missing_embedding(pool: &PgPool, limit: i64) -> Result<Vec<AdRow>, DbError> {
    let rows = sqlx::query_as::<_, AdRow>(&format!(
        "SELECT {AD_COLUMNS} FROM ads a \
         WHERE a.embedding IS NULL AND a.deleted_at IS NULL \
         ORDER BY a.created_at ASC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
