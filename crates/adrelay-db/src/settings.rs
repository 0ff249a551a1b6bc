//! Database operations for `business_settings`.

use adrelay_core::{AdFrequency, BusinessSettings};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `business_settings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusinessSettingsRow {
    pub creator_id: Uuid,
    pub ad_frequency: String,
    pub revenue_weight: f64,
    pub min_seconds_between_display_ads: i64,
    pub similarity_threshold: f64,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Fetch a creator's settings row, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_business_settings(
    pool: &PgPool,
    creator_id: Uuid,
) -> Result<Option<BusinessSettingsRow>, DbError> {
    let row = sqlx::query_as::<_, BusinessSettingsRow>(
        "SELECT creator_id, ad_frequency, revenue_weight, \
                min_seconds_between_display_ads, similarity_threshold, \
                is_active, updated_at \
         FROM business_settings WHERE creator_id = $1",
    )
    .bind(creator_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Resolve a creator's effective settings.
///
/// Absent or inactive rows fall back to [`BusinessSettings::default`]; an
/// unparseable frequency value falls back to `normal` rather than failing
/// the serve path.
#[must_use]
pub fn effective_settings(row: Option<BusinessSettingsRow>) -> BusinessSettings {
    match row {
        Some(row) if row.is_active => BusinessSettings {
            ad_frequency: row.ad_frequency.parse().unwrap_or(AdFrequency::Normal),
            revenue_weight: row.revenue_weight,
            min_seconds_between_display_ads: row.min_seconds_between_display_ads,
            similarity_threshold: row.similarity_threshold,
        },
        _ => BusinessSettings::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(is_active: bool) -> BusinessSettingsRow {
        BusinessSettingsRow {
            creator_id: Uuid::new_v4(),
            ad_frequency: "high".to_string(),
            revenue_weight: 0.8,
            min_seconds_between_display_ads: 10,
            similarity_threshold: 0.4,
            is_active,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn active_row_wins() {
        let settings = effective_settings(Some(row(true)));
        assert_eq!(settings.ad_frequency, AdFrequency::High);
        assert!((settings.revenue_weight - 0.8).abs() < f64::EPSILON);
        assert_eq!(settings.min_seconds_between_display_ads, 10);
        assert!((settings.similarity_threshold - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn inactive_row_falls_back_to_defaults() {
        assert_eq!(effective_settings(Some(row(false))), BusinessSettings::default());
    }

    #[test]
    fn missing_row_falls_back_to_defaults() {
        assert_eq!(effective_settings(None), BusinessSettings::default());
    }

    #[test]
    fn unknown_frequency_falls_back_to_normal() {
        let mut r = row(true);
        r.ad_frequency = "ludicrous".to_string();
        assert_eq!(effective_settings(Some(r)).ad_frequency, AdFrequency::Normal);
    }
}
