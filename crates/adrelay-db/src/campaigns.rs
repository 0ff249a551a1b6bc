//! Database operations for `campaigns`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: Uuid,
    pub advertiser_id: Uuid,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget_amount: Decimal,
    pub spent_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const CAMPAIGN_COLUMNS: &str = "id, advertiser_id, name, start_date, end_date, \
     budget_amount, spent_amount, currency, status, created_at, updated_at";

/// Fetch a campaign by id. `None` for unknown ids, never an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_campaign(pool: &PgPool, id: Uuid) -> Result<Option<CampaignRow>, DbError> {
    let row = sqlx::query_as::<_, CampaignRow>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Atomically add `delta` to a campaign's `spent_amount`.
///
/// This is the one mutation in the system that must be a single arithmetic
/// update at the store layer — concurrent billers incrementing the same
/// campaign would lose updates under read-modify-write.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the campaign does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn increment_spent(pool: &PgPool, id: Uuid, delta: Decimal) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE campaigns SET spent_amount = spent_amount + $2, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(delta)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Pause a campaign and every one of its ads, in one transaction.
///
/// The only cross-entity cascade in the model: budget exhaustion takes the
/// campaign and its whole catalog out of rotation together.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either update fails.
pub async fn pause_campaign_with_ads(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE campaigns SET status = 'paused', updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE ads SET status = 'paused', updated_at = NOW() WHERE campaign_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// List active campaigns whose spend has reached their budget.
///
/// Used by the background sweep that re-pauses anything the inline
/// post-billing check missed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_exhausted_active_campaigns(pool: &PgPool) -> Result<Vec<CampaignRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignRow>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns \
         WHERE status = 'active' AND spent_amount >= budget_amount"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
