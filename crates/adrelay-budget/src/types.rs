//! Budget read-model types.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Snapshot of a campaign's budget position, with linear pacing.
#[derive(Debug, Clone)]
pub struct BudgetStatus {
    pub campaign_id: Uuid,
    pub status: String,
    pub currency: String,
    pub budget_amount: Decimal,
    pub spent_amount: Decimal,
    /// `budget - spent`, floored at zero.
    pub remaining_budget: Decimal,
    /// Spend has reached the budget; the campaign should not serve.
    pub is_out_of_budget: bool,
    /// `spent / budget` as a percentage; `100.0` for a zero budget.
    pub utilization_percent: f64,
    /// Whole flight length in days, at least 1.
    pub total_days: i64,
    /// Days elapsed since the start, rounded up; 0 before the start.
    pub elapsed_days: i64,
    /// `total_days - elapsed_days`, floored at zero.
    pub days_remaining: i64,
    /// `spent / elapsed_days`; zero before the flight starts.
    pub projected_daily_spend: Decimal,
    /// `projected_daily_spend × total_days` — where spend lands if the
    /// current rate holds for the whole flight.
    pub projected_total_spend: Decimal,
}
