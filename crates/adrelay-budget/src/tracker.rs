//! Spend tracking and budget-exhaustion pausing.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use adrelay_db::CampaignRow;

use crate::types::BudgetStatus;
use crate::BudgetError;

const SECS_PER_DAY: i64 = 86_400;

/// Budget snapshot for one campaign. `None` for unknown ids.
///
/// # Errors
///
/// Returns [`BudgetError::Db`] if the lookup fails.
pub async fn campaign_budget_status(
    pool: &PgPool,
    campaign_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<BudgetStatus>, BudgetError> {
    let Some(campaign) = adrelay_db::campaigns::get_campaign(pool, campaign_id).await? else {
        return Ok(None);
    };
    Ok(Some(budget_status_from(&campaign, now)))
}

/// Add `delta` to a campaign's spend and pause it if the budget is now
/// exhausted.
///
/// The increment is atomic; the exhaustion check is a separate read.
/// Concurrent billers can therefore both land before either pauses, so a
/// campaign may overspend by at most the in-flight deltas. The periodic
/// sweep re-checks anything this inline path missed.
///
/// # Errors
///
/// Returns [`BudgetError::Db`] if a store operation fails, including
/// `NotFound` for an unknown campaign.
pub async fn update_campaign_spending(
    pool: &PgPool,
    campaign_id: Uuid,
    delta: Decimal,
) -> Result<(), BudgetError> {
    adrelay_db::campaigns::increment_spent(pool, campaign_id, delta).await?;

    let Some(campaign) = adrelay_db::campaigns::get_campaign(pool, campaign_id).await? else {
        return Err(BudgetError::Db(adrelay_db::DbError::NotFound));
    };
    if campaign.spent_amount >= campaign.budget_amount && campaign.status == "active" {
        adrelay_db::campaigns::pause_campaign_with_ads(pool, campaign_id).await?;
        tracing::info!(
            %campaign_id,
            spent = %campaign.spent_amount,
            budget = %campaign.budget_amount,
            "campaign budget exhausted; paused with ads"
        );
    }
    Ok(())
}

/// Pause every active campaign whose spend has reached its budget.
///
/// The safety net behind [`update_campaign_spending`]'s inline check.
/// Returns how many campaigns were paused.
///
/// # Errors
///
/// Returns [`BudgetError::Db`] if a store operation fails.
pub async fn sweep_exhausted_campaigns(pool: &PgPool) -> Result<usize, BudgetError> {
    let exhausted = adrelay_db::campaigns::list_exhausted_active_campaigns(pool).await?;
    for campaign in &exhausted {
        adrelay_db::campaigns::pause_campaign_with_ads(pool, campaign.id).await?;
        tracing::warn!(
            campaign_id = %campaign.id,
            spent = %campaign.spent_amount,
            budget = %campaign.budget_amount,
            "sweep paused exhausted campaign missed by inline check"
        );
    }
    Ok(exhausted.len())
}

/// Pure budget/pacing math over one campaign row.
#[must_use]
pub fn budget_status_from(campaign: &CampaignRow, now: DateTime<Utc>) -> BudgetStatus {
    let remaining = (campaign.budget_amount - campaign.spent_amount).max(Decimal::ZERO);
    let is_out = campaign.spent_amount >= campaign.budget_amount;

    let utilization_percent = if campaign.budget_amount.is_zero() {
        100.0
    } else {
        let ratio = campaign.spent_amount / campaign.budget_amount;
        ratio.to_f64().unwrap_or(f64::MAX) * 100.0
    };

    let total_days = days_ceil(campaign.start_date, campaign.end_date).max(1);
    let elapsed_days = days_ceil(campaign.start_date, now).clamp(0, total_days);
    let days_remaining = total_days - elapsed_days;

    let projected_daily_spend = if elapsed_days <= 0 {
        Decimal::ZERO
    } else {
        (campaign.spent_amount / Decimal::from(elapsed_days)).round_dp(6)
    };
    let projected_total_spend = (projected_daily_spend * Decimal::from(total_days)).round_dp(6);

    BudgetStatus {
        campaign_id: campaign.id,
        status: campaign.status.clone(),
        currency: campaign.currency.clone(),
        budget_amount: campaign.budget_amount,
        spent_amount: campaign.spent_amount,
        remaining_budget: remaining,
        is_out_of_budget: is_out,
        utilization_percent,
        total_days,
        elapsed_days,
        days_remaining,
        projected_daily_spend,
        projected_total_spend,
    }
}

/// Days from `from` to `to`, rounded up; negative when `to` precedes `from`.
fn days_ceil(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let secs = (to - from).num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + SECS_PER_DAY - 1) / SECS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn campaign(budget: Decimal, spent: Decimal, flight_days: i64) -> CampaignRow {
        let start = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        CampaignRow {
            id: Uuid::new_v4(),
            advertiser_id: Uuid::new_v4(),
            name: "flight".to_string(),
            start_date: start,
            end_date: start + Duration::days(flight_days),
            budget_amount: budget,
            spent_amount: spent,
            currency: "USD".to_string(),
            status: "active".to_string(),
            created_at: start,
            updated_at: start,
        }
    }

    fn at_day(campaign: &CampaignRow, days: i64) -> DateTime<Utc> {
        campaign.start_date + Duration::days(days)
    }

    #[test]
    fn remaining_budget_floors_at_zero() {
        let c = campaign(dec!(100), dec!(120), 10);
        let status = budget_status_from(&c, at_day(&c, 5));
        assert_eq!(status.remaining_budget, dec!(0));
        assert!(status.is_out_of_budget);
    }

    #[test]
    fn exactly_exhausted_is_out_of_budget() {
        let c = campaign(dec!(100), dec!(100), 10);
        let status = budget_status_from(&c, at_day(&c, 5));
        assert!(status.is_out_of_budget);
        assert!((status.utilization_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_budget_reports_full_utilization() {
        let c = campaign(dec!(0), dec!(0), 10);
        let status = budget_status_from(&c, at_day(&c, 1));
        assert!((status.utilization_percent - 100.0).abs() < 1e-9);
        assert!(status.is_out_of_budget);
    }

    #[test]
    fn pacing_projects_linear_spend() {
        // 50 spent in 5 of 10 days projects to 100 total.
        let c = campaign(dec!(200), dec!(50), 10);
        let status = budget_status_from(&c, at_day(&c, 5));
        assert_eq!(status.total_days, 10);
        assert_eq!(status.elapsed_days, 5);
        assert_eq!(status.days_remaining, 5);
        assert_eq!(status.projected_daily_spend, dec!(10));
        assert_eq!(status.projected_total_spend, dec!(100));
    }

    #[test]
    fn partial_day_counts_as_a_full_day() {
        let c = campaign(dec!(200), dec!(30), 10);
        let now = c.start_date + Duration::hours(25);
        let status = budget_status_from(&c, now);
        assert_eq!(status.elapsed_days, 2);
        assert_eq!(status.projected_daily_spend, dec!(15));
    }

    #[test]
    fn before_flight_start_projects_nothing() {
        let c = campaign(dec!(200), dec!(0), 10);
        let now = c.start_date - Duration::days(1);
        let status = budget_status_from(&c, now);
        assert_eq!(status.elapsed_days, 0);
        assert_eq!(status.projected_daily_spend, dec!(0));
        assert_eq!(status.days_remaining, 10);
    }

    #[test]
    fn past_flight_end_clamps_elapsed_days() {
        let c = campaign(dec!(200), dec!(100), 10);
        let status = budget_status_from(&c, at_day(&c, 30));
        assert_eq!(status.elapsed_days, 10);
        assert_eq!(status.days_remaining, 0);
        assert_eq!(status.projected_daily_spend, dec!(10));
    }
}
