//! Campaign budget tracking and billing.
//!
//! Spend accounting has one hard rule: an impression's revenue counts
//! against its campaign at most once. Everything here is built around the
//! atomic `spent_amount` increment in the store and the idempotent
//! `billed` status flips.

pub mod billing;
pub mod reporting;
pub mod tracker;
pub mod types;

pub use billing::{process_click_billing, process_impression_billing};
pub use reporting::{campaign_report, CampaignReport, ReportWindow};
pub use tracker::{
    budget_status_from, campaign_budget_status, sweep_exhausted_campaigns, update_campaign_spending,
};
pub use types::BudgetStatus;

use thiserror::Error;
use uuid::Uuid;

/// Errors from the budget layer.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error(transparent)]
    Db(#[from] adrelay_db::DbError),
    #[error("impression not found: {0}")]
    ImpressionNotFound(Uuid),
    #[error("click not found: {0}")]
    ClickNotFound(Uuid),
    #[error("ad not found: {0}")]
    AdNotFound(Uuid),
}
