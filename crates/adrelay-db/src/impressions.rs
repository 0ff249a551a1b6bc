//! Database operations for `impressions`.
//!
//! Impressions are an append-only billing ledger. Rows are never deleted;
//! the only mutations are the monotonic status flips `pending -> clicked`
//! and `* -> billed`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `impressions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImpressionRow {
    pub id: Uuid,
    pub ad_id: Uuid,
    pub creator_id: Uuid,
    pub session_id: Option<Uuid>,
    pub placement: Option<String>,
    pub revenue_amount: Decimal,
    pub creator_payout_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

const IMPRESSION_COLUMNS: &str = "id, ad_id, creator_id, session_id, placement, \
     revenue_amount, creator_payout_amount, currency, status, created_at";

/// Insert a new `pending` impression and return it.
///
/// `creator_payout_amount` is fixed at creation time by the caller and
/// never recomputed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
#[allow(clippy::too_many_arguments)]
pub async fn create_impression(
    pool: &PgPool,
    ad_id: Uuid,
    creator_id: Uuid,
    session_id: Option<Uuid>,
    placement: Option<&str>,
    revenue_amount: Decimal,
    creator_payout_amount: Decimal,
    currency: &str,
) -> Result<ImpressionRow, DbError> {
    let row = sqlx::query_as::<_, ImpressionRow>(&format!(
        "INSERT INTO impressions \
             (ad_id, creator_id, session_id, placement, revenue_amount, \
              creator_payout_amount, currency, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending') \
         RETURNING {IMPRESSION_COLUMNS}"
    ))
    .bind(ad_id)
    .bind(creator_id)
    .bind(session_id)
    .bind(placement)
    .bind(revenue_amount)
    .bind(creator_payout_amount)
    .bind(currency)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Fetch an impression by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_impression(pool: &PgPool, id: Uuid) -> Result<Option<ImpressionRow>, DbError> {
    let row = sqlx::query_as::<_, ImpressionRow>(&format!(
        "SELECT {IMPRESSION_COLUMNS} FROM impressions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Flip a `pending` impression to `clicked`.
///
/// Already-clicked and already-billed impressions are left alone; the
/// transition is monotonic and the click itself is recorded separately.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_impression_clicked(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE impressions SET status = 'clicked' WHERE id = $1 AND status = 'pending'")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Flip an impression to `billed`, returning whether this call did the flip.
///
/// `false` means the impression was already billed — the caller's signal to
/// skip the spend update (billing idempotence).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_impression_billed(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result =
        sqlx::query("UPDATE impressions SET status = 'billed' WHERE id = $1 AND status <> 'billed'")
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Count a session's impressions inside the trailing window.
///
/// Input to the sliding-window display admission check.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_recent_impressions(
    pool: &PgPool,
    session_id: Uuid,
    window_secs: i64,
) -> Result<i64, DbError> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM impressions \
         WHERE session_id = $1 \
           AND created_at > NOW() - ($2 * INTERVAL '1 second')",
    )
    .bind(session_id)
    .bind(window_secs)
    .fetch_one(pool)
    .await?;
    Ok(count.0)
}
