//! Idempotent billing of impressions and clicks.
//!
//! Billing order matters: the status flip happens before the spend
//! increment, so a retried biller that loses the flip race never double
//! counts revenue. The reverse order would need distributed rollback.

use sqlx::PgPool;
use uuid::Uuid;

use crate::tracker::update_campaign_spending;
use crate::BudgetError;

/// Bill an impression's revenue against its campaign.
///
/// Returns `true` when this call performed the billing, `false` when the
/// impression was already billed (the call is then a no-op).
///
/// # Errors
///
/// Returns [`BudgetError::ImpressionNotFound`] for unknown impressions,
/// [`BudgetError::AdNotFound`] if the impression's ad has vanished, or
/// [`BudgetError::Db`] on store failures.
pub async fn process_impression_billing(
    pool: &PgPool,
    impression_id: Uuid,
) -> Result<bool, BudgetError> {
    let Some(impression) = adrelay_db::impressions::get_impression(pool, impression_id).await?
    else {
        return Err(BudgetError::ImpressionNotFound(impression_id));
    };

    if !adrelay_db::impressions::mark_impression_billed(pool, impression_id).await? {
        tracing::debug!(%impression_id, "impression already billed; skipping");
        return Ok(false);
    }

    let Some(ad) = adrelay_db::ads::get_ad(pool, impression.ad_id).await? else {
        return Err(BudgetError::AdNotFound(impression.ad_id));
    };
    update_campaign_spending(pool, ad.campaign_id, impression.revenue_amount).await?;

    tracing::info!(
        %impression_id,
        campaign_id = %ad.campaign_id,
        revenue = %impression.revenue_amount,
        "billed impression"
    );
    Ok(true)
}

/// Bill a click: bill its impression (at most once), then mark the click
/// billed.
///
/// Returns `true` when the impression's revenue was billed by this call.
/// A second click on the same impression marks its own click row billed
/// but adds no spend.
///
/// # Errors
///
/// Returns [`BudgetError::ClickNotFound`] for unknown clicks, or any error
/// from [`process_impression_billing`].
pub async fn process_click_billing(pool: &PgPool, click_id: Uuid) -> Result<bool, BudgetError> {
    let Some(click) = adrelay_db::clicks::get_click(pool, click_id).await? else {
        return Err(BudgetError::ClickNotFound(click_id));
    };

    if click.is_billed {
        tracing::debug!(%click_id, "click already billed; skipping");
        return Ok(false);
    }

    let billed = process_impression_billing(pool, click.impression_id).await?;
    adrelay_db::clicks::mark_click_billed(pool, click_id).await?;
    Ok(billed)
}
