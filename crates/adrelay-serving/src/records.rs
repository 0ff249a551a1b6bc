//! Impression and click recording.
//!
//! The creator payout is a fixed fraction of revenue, computed once at
//! impression creation and never recomputed. Clicks flip the impression to
//! `clicked` but never bill; billing is the budget tracker's idempotent job.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use uuid::Uuid;

use adrelay_core::ClickMetadata;
use adrelay_db::{ClickRow, ImpressionRow};

use crate::ServeError;

/// Fraction of impression revenue paid out to the creator (70/30 split).
pub const CREATOR_PAYOUT_RATE: Decimal = dec!(0.70);

/// The creator's cut of `revenue`, rounded to the store's 6 fraction digits.
#[must_use]
pub fn creator_payout(revenue: Decimal) -> Decimal {
    (revenue * CREATOR_PAYOUT_RATE).round_dp(6)
}

/// Record one ad-serving event.
///
/// Currency follows the campaign; the payout split is fixed here.
///
/// # Errors
///
/// Returns [`ServeError::Db`] if a store operation fails.
pub async fn record_impression(
    pool: &PgPool,
    ad_id: Uuid,
    campaign_id: Uuid,
    creator_id: Uuid,
    session_id: Option<Uuid>,
    placement: Option<&str>,
    revenue: Decimal,
) -> Result<ImpressionRow, ServeError> {
    let currency = adrelay_db::campaigns::get_campaign(pool, campaign_id)
        .await?
        .map_or_else(|| "USD".to_string(), |c| c.currency);

    let row = adrelay_db::impressions::create_impression(
        pool,
        ad_id,
        creator_id,
        session_id,
        placement,
        revenue,
        creator_payout(revenue),
        &currency,
    )
    .await?;

    tracing::debug!(
        impression_id = %row.id,
        %ad_id,
        revenue = %revenue,
        payout = %row.creator_payout_amount,
        "recorded impression"
    );
    Ok(row)
}

/// Record a click on an impression.
///
/// Creates the click row and flips the impression to `clicked`. Billing is
/// deliberately not triggered here.
///
/// # Errors
///
/// Returns [`ServeError::ImpressionNotFound`] for unknown impressions, or
/// [`ServeError::Db`] if a store operation fails.
pub async fn record_click(
    pool: &PgPool,
    impression_id: Uuid,
    metadata: &ClickMetadata,
) -> Result<ClickRow, ServeError> {
    if adrelay_db::impressions::get_impression(pool, impression_id)
        .await?
        .is_none()
    {
        return Err(ServeError::ImpressionNotFound(impression_id));
    }

    let metadata_value = serde_json::to_value(metadata).unwrap_or_default();
    let click = adrelay_db::clicks::create_click(pool, impression_id, &metadata_value).await?;
    adrelay_db::impressions::mark_impression_clicked(pool, impression_id).await?;

    tracing::debug!(click_id = %click.id, %impression_id, "recorded click");
    Ok(click)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payout_is_seventy_percent() {
        assert_eq!(creator_payout(dec!(10)), dec!(7));
        assert_eq!(creator_payout(dec!(2.50)), dec!(1.75));
    }

    #[test]
    fn payout_rounds_to_store_precision() {
        // 0.70 × 0.333333 = 0.2333331, representable in 6 fraction digits.
        assert_eq!(creator_payout(dec!(0.333333)), dec!(0.233333));
        assert_eq!(creator_payout(dec!(0.000001)).scale(), 6);
    }

    #[test]
    fn payout_of_zero_is_zero() {
        assert_eq!(creator_payout(dec!(0)), dec!(0));
    }
}
