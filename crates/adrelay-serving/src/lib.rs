//! Ad serving orchestration.
//!
//! One state machine per serve request: gather candidates, filter by
//! threshold, rank and select top-K, record an impression per served ad,
//! return. Also owns the per-session display-ad queue, the display-ad
//! admission window, and the impression/click recording rules (fixed
//! 70/30 revenue split at creation time).

pub mod orchestrator;
pub mod queue;
pub mod records;
pub mod timing;
pub mod types;

pub use orchestrator::AdServer;
pub use queue::{DisplayAdQueue, QueuedDisplayAd};
pub use records::{creator_payout, record_click, record_impression, CREATOR_PAYOUT_RATE};
pub use timing::{timing_decision, DISPLAY_WINDOW_MAX_IMPRESSIONS, DISPLAY_WINDOW_SECS};
pub use types::{DisplayTiming, ServeOptions, ServeOutcome, ServedAd};

use thiserror::Error;

/// Errors from the serving layer.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Db(#[from] adrelay_db::DbError),
    #[error(transparent)]
    Match(#[from] adrelay_match::MatchError),
    #[error("impression not found: {0}")]
    ImpressionNotFound(uuid::Uuid),
}
