//! Vector similarity search over the ad catalog.
//!
//! Three entry points, all on [`AdSearcher`]:
//! - `search_ads` — pure similarity ranking above a threshold,
//! - `hybrid_ad_search` — similarity blended with a normalized revenue
//!   score, so operators can trade relevance for yield,
//! - `contextual_ads` — builds the query from recent session messages.

pub mod rank;
pub mod search;
pub mod types;

pub use rank::{blend_score, hybrid_rank, revenue_score};
pub use search::AdSearcher;
pub use types::{AdMatch, ContextOptions, HybridOptions, ScoredAd, SearchOptions};

use thiserror::Error;

/// Errors from the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Db(#[from] adrelay_db::DbError),
    #[error(transparent)]
    Embed(#[from] adrelay_embed::EmbedError),
}
