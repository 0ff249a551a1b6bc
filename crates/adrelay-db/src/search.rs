//! Vector nearest-neighbor queries over the ad catalog.
//!
//! pgvector's `<=>` operator gives cosine distance; callers convert to
//! similarity as `1 - distance`. Query vectors are bound as text literals
//! and cast server-side, so no client-side vector type is needed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ads::{AD_COLUMNS, ELIGIBILITY_CLAUSE};
use crate::DbError;

/// An eligible ad with its cosine distance to the query vector.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdMatchRow {
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
    pub distance: f64,
}

/// Optional narrowing filters for a nearest-neighbor search.
#[derive(Debug, Clone, Default)]
pub struct AdSearchFilters {
    pub campaign_id: Option<Uuid>,
    /// Restrict to these ad types; `None` means all types.
    pub ad_types: Option<Vec<String>>,
    pub placement: Option<String>,
    pub exclude_ids: Vec<Uuid>,
}

/// Nearest eligible ads to `embedding`, closest first.
///
/// Only ads with a stored embedding participate; eligibility per the module
/// invariant. Filters narrow by campaign, ad type set, placement, and an
/// exclusion list.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn nearest_ads(
    pool: &PgPool,
    embedding: &[f32],
    limit: i64,
    filters: &AdSearchFilters,
) -> Result<Vec<AdMatchRow>, DbError> {
    let rows = sqlx::query_as::<_, AdMatchRow>(&format!(
        "SELECT {AD_COLUMNS}, \
                (a.embedding <=> $1::vector)::FLOAT8 AS distance \
         FROM ads a \
         JOIN campaigns c ON c.id = a.campaign_id \
         WHERE {ELIGIBILITY_CLAUSE} \
           AND a.embedding IS NOT NULL \
           AND ($2::UUID IS NULL OR a.campaign_id = $2) \
           AND ($3::TEXT[] IS NULL OR a.ad_type = ANY($3)) \
           AND ($4::TEXT IS NULL OR a.placement = $4) \
           AND (cardinality($5::UUID[]) = 0 OR a.id <> ALL($5)) \
         ORDER BY a.embedding <=> $1::vector \
         LIMIT $6"
    ))
    .bind(vector_literal(embedding))
    .bind(filters.campaign_id)
    .bind(filters.ad_types.as_deref())
    .bind(filters.placement.as_deref())
    .bind(&filters.exclude_ids)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Render a float slice as a pgvector text literal, e.g. `[0.1,0.2,0.3]`.
#[must_use]
pub fn vector_literal(embedding: &[f32]) -> String {
    let mut out = String::with_capacity(embedding.len() * 10 + 2);
    out.push('[');
    for (i, v) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        // `{v}` keeps full f32 round-trip precision in Rust's float Display.
        out.push_str(&format!("{v}"));
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_literal_formats_pgvector_syntax() {
        assert_eq!(vector_literal(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
    }

    #[test]
    fn vector_literal_empty() {
        assert_eq!(vector_literal(&[]), "[]");
    }
}
