//! Derived campaign performance metrics.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use adrelay_db::CampaignPerformanceRow;

use crate::BudgetError;

/// Trailing reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWindow {
    Day,
    Week,
    Month,
}

impl ReportWindow {
    /// Window start relative to `now`.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Day => now - Duration::hours(24),
            Self::Week => now - Duration::days(7),
            Self::Month => now - Duration::days(30),
        }
    }
}

/// Counts plus the ratios derived from them.
#[derive(Debug, Clone)]
pub struct CampaignReport {
    pub campaign_id: Uuid,
    pub window: ReportWindow,
    pub impressions: i64,
    pub clicks: i64,
    pub billed_revenue: Decimal,
    pub total_revenue: Decimal,
    /// `clicks / impressions`; zero when there were no impressions.
    pub ctr: f64,
    /// `billed_revenue / clicks`; zero when there were no clicks.
    pub average_cpc: Decimal,
    /// Margin over creator payout:
    /// `(billed_revenue − billed_payout) / billed_payout`; zero when
    /// nothing has been billed.
    pub roi: f64,
}

/// Performance report for one campaign over a trailing window.
///
/// # Errors
///
/// Returns [`BudgetError::Db`] if the aggregation query fails.
pub async fn campaign_report(
    pool: &PgPool,
    campaign_id: Uuid,
    window: ReportWindow,
    now: DateTime<Utc>,
) -> Result<CampaignReport, BudgetError> {
    let row = adrelay_db::reporting::campaign_performance(pool, campaign_id, window.since(now))
        .await?;
    Ok(derive_report(campaign_id, window, &row))
}

fn derive_report(
    campaign_id: Uuid,
    window: ReportWindow,
    row: &CampaignPerformanceRow,
) -> CampaignReport {
    #[allow(clippy::cast_precision_loss)]
    let ctr = if row.impressions > 0 {
        row.clicks as f64 / row.impressions as f64
    } else {
        0.0
    };
    let average_cpc = if row.clicks > 0 {
        (row.billed_revenue / Decimal::from(row.clicks)).round_dp(6)
    } else {
        Decimal::ZERO
    };
    let roi = if row.billed_payout.is_zero() {
        0.0
    } else {
        ((row.billed_revenue - row.billed_payout) / row.billed_payout)
            .to_f64()
            .unwrap_or(0.0)
    };

    CampaignReport {
        campaign_id,
        window,
        impressions: row.impressions,
        clicks: row.clicks,
        billed_revenue: row.billed_revenue,
        total_revenue: row.total_revenue,
        ctr,
        average_cpc,
        roi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal_macros::dec;

    fn row(impressions: i64, clicks: i64, billed: Decimal, total: Decimal) -> CampaignPerformanceRow {
        CampaignPerformanceRow {
            impressions,
            clicks,
            billed_revenue: billed,
            total_revenue: total,
            billed_payout: (billed * dec!(0.70)).round_dp(6),
        }
    }

    #[test]
    fn derives_ctr_and_cpc() {
        let report = derive_report(
            Uuid::new_v4(),
            ReportWindow::Week,
            &row(200, 10, dec!(25), dec!(40)),
        );
        assert!((report.ctr - 0.05).abs() < 1e-12);
        assert_eq!(report.average_cpc, dec!(2.5));
    }

    #[test]
    fn roi_is_margin_over_payout() {
        // 70/30 split: margin over payout is 0.30 / 0.70.
        let report = derive_report(
            Uuid::new_v4(),
            ReportWindow::Week,
            &row(100, 4, dec!(7), dec!(10)),
        );
        assert!((report.roi - (3.0 / 7.0)).abs() < 1e-6, "roi = {}", report.roi);
    }

    #[test]
    fn roi_is_zero_when_nothing_billed() {
        let report = derive_report(
            Uuid::new_v4(),
            ReportWindow::Week,
            &row(100, 4, dec!(0), dec!(10)),
        );
        assert!((report.roi - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_impressions_gives_zero_ratios() {
        let report = derive_report(
            Uuid::new_v4(),
            ReportWindow::Day,
            &row(0, 0, dec!(0), dec!(0)),
        );
        assert!((report.ctr - 0.0).abs() < f64::EPSILON);
        assert_eq!(report.average_cpc, dec!(0));
    }

    #[test]
    fn impressions_without_clicks_have_zero_cpc() {
        let report = derive_report(
            Uuid::new_v4(),
            ReportWindow::Month,
            &row(50, 0, dec!(0), dec!(12)),
        );
        assert!((report.ctr - 0.0).abs() < f64::EPSILON);
        assert_eq!(report.average_cpc, dec!(0));
    }

    #[test]
    fn window_since_is_the_trailing_span() {
        let now = Utc::now();
        assert_eq!(now - ReportWindow::Day.since(now), Duration::hours(24));
        assert_eq!(now - ReportWindow::Week.since(now), Duration::days(7));
        assert_eq!(now - ReportWindow::Month.since(now), Duration::days(30));
    }
}
