//! Search entry points: embed the query, ask the store for neighbors,
//! post-process into ranked matches.

use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use adrelay_embed::EmbeddingClient;

use crate::types::{AdMatch, ContextOptions, HybridOptions, ScoredAd, SearchOptions};
use crate::{rank, MatchError};

/// Similarity floor for raw hybrid candidates; deliberately low so the
/// revenue blend has material to work with before the final ranking.
const RAW_CANDIDATE_FLOOR: f64 = 0.5;

/// Stateless search façade over the store and the embedding gateway.
///
/// Construct once, share by reference.
pub struct AdSearcher {
    pool: PgPool,
    embedder: Arc<EmbeddingClient>,
}

impl AdSearcher {
    #[must_use]
    pub fn new(pool: PgPool, embedder: Arc<EmbeddingClient>) -> Self {
        Self { pool, embedder }
    }

    /// Eligible ads nearest to `query`, similarity-descending, cut at
    /// `opts.threshold`.
    ///
    /// An empty query or an empty catalog yields an empty list, never an
    /// error. Embedding degrades to the fallback vector on provider
    /// failure, so this only fails on store errors.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Db`] if the store query fails.
    pub async fn search_ads(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<AdMatch>, MatchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let (embedding, degraded) = self.embedder.embed_or_fallback(query).await;
        if degraded {
            tracing::debug!("searching with a fallback query vector");
        }

        let rows =
            adrelay_db::search::nearest_ads(&self.pool, &embedding, opts.limit, &opts.filters)
                .await?;

        let matches = rows
            .into_iter()
            .map(|row| AdMatch {
                similarity: 1.0 - row.distance,
                ad: row,
            })
            .filter(|m| m.similarity >= opts.threshold)
            .collect();
        Ok(matches)
    }

    /// Hybrid search: fetch `2 × limit` raw candidates at a low similarity
    /// floor, blend similarity with the normalized revenue score, re-sort,
    /// truncate to `limit`.
    ///
    /// `vector_weight = 1.0` degenerates to pure similarity ranking.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Db`] if the store query fails.
    pub async fn hybrid_ad_search(
        &self,
        query: &str,
        opts: &HybridOptions,
    ) -> Result<Vec<ScoredAd>, MatchError> {
        let raw_opts = SearchOptions {
            limit: opts.limit * 2,
            threshold: RAW_CANDIDATE_FLOOR,
            filters: opts.filters.clone(),
        };
        let raw = self.search_ads(query, &raw_opts).await?;

        #[allow(clippy::cast_sign_loss)]
        let limit = opts.limit.max(0) as usize;
        Ok(rank::hybrid_rank(
            raw,
            opts.vector_weight,
            opts.revenue_boost,
            limit,
        ))
    }

    /// Match ads against the recent conversation in a session.
    ///
    /// Pulls the last `lookback_messages` messages, restores chronological
    /// order, concatenates the contents into one context string, and
    /// delegates to [`AdSearcher::search_ads`]. An unknown session or a
    /// session without messages yields an empty result, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Db`] if a store query fails.
    pub async fn contextual_ads(
        &self,
        session_id: Uuid,
        opts: &ContextOptions,
    ) -> Result<Vec<AdMatch>, MatchError> {
        if adrelay_db::sessions::get_session(&self.pool, session_id)
            .await?
            .is_none()
        {
            tracing::debug!(%session_id, "contextual search for unknown session");
            return Ok(Vec::new());
        }

        let mut messages =
            adrelay_db::sessions::recent_messages(&self.pool, session_id, opts.lookback_messages)
                .await?;
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        // recent_messages returns newest-first; the context string reads
        // chronologically.
        messages.reverse();
        let context = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        self.search_ads(&context, &opts.search).await
    }
}
