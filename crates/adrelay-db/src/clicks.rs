//! Database operations for `clicks`.
//!
//! Multiple clicks may reference one impression. Each click bills at most
//! once (`is_billed`), and the underlying impression's revenue is counted
//! at most once regardless of how many click paths try to bill it.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `clicks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClickRow {
    pub id: Uuid,
    pub impression_id: Uuid,
    pub is_billed: bool,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

const CLICK_COLUMNS: &str = "id, impression_id, is_billed, metadata, created_at";

/// Insert a click for an impression and return it.
///
/// `metadata` is the serialized [`adrelay_core::ClickMetadata`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a foreign-key
/// violation for an unknown impression).
pub async fn create_click(
    pool: &PgPool,
    impression_id: Uuid,
    metadata: &Value,
) -> Result<ClickRow, DbError> {
    let row = sqlx::query_as::<_, ClickRow>(&format!(
        "INSERT INTO clicks (impression_id, metadata) \
         VALUES ($1, $2) \
         RETURNING {CLICK_COLUMNS}"
    ))
    .bind(impression_id)
    .bind(metadata)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Fetch a click by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_click(pool: &PgPool, id: Uuid) -> Result<Option<ClickRow>, DbError> {
    let row = sqlx::query_as::<_, ClickRow>(&format!(
        "SELECT {CLICK_COLUMNS} FROM clicks WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Mark a click billed, returning whether this call did the flip.
///
/// `false` means another biller got there first (idempotence under retry).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_click_billed(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("UPDATE clicks SET is_billed = TRUE WHERE id = $1 AND NOT is_billed")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
