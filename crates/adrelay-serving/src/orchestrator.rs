//! The serve-request state machine.

use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use adrelay_db::ads::AdRow;
use adrelay_match::{AdSearcher, ContextOptions, HybridOptions, ScoredAd, SearchOptions};

use crate::queue::{DisplayAdQueue, QueuedDisplayAd};
use crate::records::record_impression;
use crate::timing::{timing_decision, TimingInputs, DISPLAY_WINDOW_SECS};
use crate::types::{DisplayTiming, ServeOptions, ServeOutcome, ServedAd};
use crate::ServeError;

/// Serving façade over the store, the searcher, and the display queue.
pub struct AdServer {
    pool: PgPool,
    searcher: Arc<AdSearcher>,
    display_queue: Arc<DisplayAdQueue>,
}

impl AdServer {
    #[must_use]
    pub fn new(pool: PgPool, searcher: Arc<AdSearcher>, display_queue: Arc<DisplayAdQueue>) -> Self {
        Self {
            pool,
            searcher,
            display_queue,
        }
    }

    /// Serve ads matched against free-text `query`.
    ///
    /// Gathers `2 × limit` hybrid candidates, filters by the similarity
    /// threshold, selects the top `limit`, and records one impression per
    /// served ad when a session is present. An empty result carries an
    /// explanatory `reason` instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] if a store operation fails.
    pub async fn serve_contextual_ads(
        &self,
        query: &str,
        opts: &ServeOptions,
    ) -> Result<ServeOutcome, ServeError> {
        let hybrid_opts = HybridOptions {
            limit: opts.limit * 2,
            vector_weight: opts.vector_weight,
            revenue_boost: opts.revenue_boost,
            filters: opts.filters.clone(),
        };
        let candidates = self.searcher.hybrid_ad_search(query, &hybrid_opts).await?;

        if candidates.is_empty() {
            return Ok(ServeOutcome {
                ads: Vec::new(),
                reason: Some("no ads found".to_string()),
            });
        }

        #[allow(clippy::cast_sign_loss)]
        let limit = opts.limit.max(0) as usize;
        let selected = match select_candidates(candidates, opts.similarity_threshold, limit) {
            Ok(selected) => selected,
            Err(reason) => {
                return Ok(ServeOutcome {
                    ads: Vec::new(),
                    reason: Some(reason),
                })
            }
        };

        let mut served: Vec<ServedAd> = selected
            .into_iter()
            .map(|s| ServedAd {
                ad_id: s.ad.id,
                campaign_id: s.ad.campaign_id,
                title: s.ad.title,
                content: s.ad.content,
                target_url: s.ad.target_url,
                ad_type: s.ad.ad_type,
                placement: s.ad.placement,
                similarity: s.similarity,
                // CPC simplification: serve-time revenue is the bid.
                revenue: s.ad.bid_amount,
                impression_id: None,
            })
            .collect();

        self.attach_impressions(&mut served, opts).await?;
        Ok(ServeOutcome {
            ads: served,
            reason: None,
        })
    }

    /// Serve ads against a session's recent conversation, falling back to
    /// revenue-ordered default ads when the conversation yields nothing.
    ///
    /// Matches above the threshold are re-ranked by the hybrid blend, so
    /// `opts.vector_weight` (the complement of the creator's revenue
    /// weight) shapes the ordering here too.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] if a store operation fails.
    pub async fn serve_conversation_ads(
        &self,
        session_id: Uuid,
        opts: &ServeOptions,
    ) -> Result<ServeOutcome, ServeError> {
        let context_opts = ContextOptions {
            lookback_messages: 10,
            search: SearchOptions {
                // Over-fetch so the revenue blend has material to reorder.
                limit: opts.limit * 2,
                threshold: opts.similarity_threshold,
                filters: opts.filters.clone(),
            },
        };
        let matches = self.searcher.contextual_ads(session_id, &context_opts).await?;

        if matches.is_empty() {
            tracing::debug!(%session_id, "no conversational signal; falling back to default ads");
            let mut opts = opts.clone();
            opts.session_id = Some(session_id);
            return self.serve_default_ads(&opts).await;
        }

        #[allow(clippy::cast_sign_loss)]
        let limit = opts.limit.max(0) as usize;
        let ranked =
            adrelay_match::hybrid_rank(matches, opts.vector_weight, opts.revenue_boost, limit);

        let mut served: Vec<ServedAd> = ranked
            .into_iter()
            .map(|s| ServedAd {
                ad_id: s.ad.id,
                campaign_id: s.ad.campaign_id,
                title: s.ad.title,
                content: s.ad.content,
                target_url: s.ad.target_url,
                ad_type: s.ad.ad_type,
                placement: s.ad.placement,
                similarity: s.similarity,
                revenue: s.ad.bid_amount,
                impression_id: None,
            })
            .collect();

        let mut opts = opts.clone();
        opts.session_id = Some(session_id);
        self.attach_impressions(&mut served, &opts).await?;
        Ok(ServeOutcome {
            ads: served,
            reason: None,
        })
    }

    /// Serve the highest-bid eligible ads, independent of any query text.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] if a store operation fails.
    pub async fn serve_default_ads(&self, opts: &ServeOptions) -> Result<ServeOutcome, ServeError> {
        let rows = adrelay_db::ads::list_default_ads(
            &self.pool,
            opts.limit,
            opts.filters.ad_types.as_deref(),
            opts.filters.placement.as_deref(),
        )
        .await?;

        if rows.is_empty() {
            return Ok(ServeOutcome {
                ads: Vec::new(),
                reason: Some("no ads found".to_string()),
            });
        }

        let mut served: Vec<ServedAd> = rows
            .into_iter()
            .map(|ad| ServedAd {
                ad_id: ad.id,
                campaign_id: ad.campaign_id,
                title: ad.title,
                content: ad.content,
                target_url: ad.target_url,
                ad_type: ad.ad_type,
                placement: ad.placement,
                similarity: 0.0,
                revenue: ad.bid_amount,
                impression_id: None,
            })
            .collect();

        self.attach_impressions(&mut served, opts).await?;
        Ok(ServeOutcome {
            ads: served,
            reason: None,
        })
    }

    /// Queue display candidates for later serving in a session.
    ///
    /// Returns how many were newly queued (ads already waiting in the
    /// session's queue do not count twice).
    pub fn enqueue_display_ads(&self, session_id: Uuid, entries: Vec<QueuedDisplayAd>) -> usize {
        self.display_queue.push(session_id, entries)
    }

    /// Serve display-class ads for a slot.
    ///
    /// Drains the session's display queue first, re-checking eligibility
    /// against the store; falls back to revenue-ordered default ads when
    /// the queue is empty or everything queued has gone stale.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] if a store operation fails.
    pub async fn serve_display_ads(&self, opts: &ServeOptions) -> Result<ServeOutcome, ServeError> {
        if let Some(session_id) = opts.session_id {
            #[allow(clippy::cast_sign_loss)]
            let limit = opts.limit.max(0) as usize;
            let entries = self.display_queue.drain(session_id, limit);
            if !entries.is_empty() {
                let ids: Vec<Uuid> = entries.iter().map(|e| e.ad_id).collect();
                let rows = adrelay_db::ads::list_eligible_ads_by_ids(&self.pool, &ids).await?;
                let mut served = queued_to_served(rows, &entries);
                if served.is_empty() {
                    tracing::debug!(
                        %session_id,
                        drained = entries.len(),
                        "queued display ads no longer eligible; falling back to defaults"
                    );
                } else {
                    self.attach_impressions(&mut served, opts).await?;
                    return Ok(ServeOutcome {
                        ads: served,
                        reason: None,
                    });
                }
            }
        }
        self.serve_default_ads(opts).await
    }

    /// Admission check for display-class ads in a session.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] if a store query fails.
    pub async fn display_ad_timing(&self, session_id: Uuid) -> Result<DisplayTiming, ServeError> {
        let recent = adrelay_db::impressions::count_recent_impressions(
            &self.pool,
            session_id,
            DISPLAY_WINDOW_SECS,
        )
        .await?;
        let has_inventory = adrelay_db::ads::eligible_banner_ad_exists(&self.pool).await?;

        let verdict = timing_decision(TimingInputs {
            recent_impressions: recent,
            has_display_inventory: has_inventory,
        });
        if !verdict.should_show {
            tracing::debug!(
                %session_id,
                recent,
                reason = verdict.reason.as_deref().unwrap_or(""),
                "display ad refused"
            );
        }
        Ok(verdict)
    }

    /// Record one impression per served ad when a session is present.
    async fn attach_impressions(
        &self,
        served: &mut [ServedAd],
        opts: &ServeOptions,
    ) -> Result<(), ServeError> {
        let Some(session_id) = opts.session_id else {
            return Ok(());
        };
        for ad in served {
            let impression = record_impression(
                &self.pool,
                ad.ad_id,
                ad.campaign_id,
                opts.creator_id,
                Some(session_id),
                opts.placement.as_deref(),
                ad.revenue,
            )
            .await?;
            ad.impression_id = Some(impression.id);
        }
        Ok(())
    }
}

/// Re-assemble drained queue entries into served ads, preserving queue
/// order and the similarity each ad was queued at. Entries whose ad is
/// missing from `rows` (no longer eligible) are dropped.
fn queued_to_served(rows: Vec<AdRow>, entries: &[QueuedDisplayAd]) -> Vec<ServedAd> {
    let mut by_id: std::collections::HashMap<Uuid, AdRow> =
        rows.into_iter().map(|ad| (ad.id, ad)).collect();

    entries
        .iter()
        .filter_map(|entry| {
            let ad = by_id.remove(&entry.ad_id)?;
            Some(ServedAd {
                ad_id: ad.id,
                campaign_id: ad.campaign_id,
                title: ad.title,
                content: ad.content,
                target_url: ad.target_url,
                ad_type: ad.ad_type,
                placement: ad.placement,
                similarity: entry.similarity,
                revenue: ad.bid_amount,
                impression_id: None,
            })
        })
        .collect()
}

/// Threshold-filter and top-K selection, as a pure step.
///
/// `Err` carries the human-readable reason for an empty selection, naming
/// the threshold that filtered everything out.
fn select_candidates(
    candidates: Vec<ScoredAd>,
    threshold: f64,
    limit: usize,
) -> Result<Vec<ScoredAd>, String> {
    let mut kept: Vec<ScoredAd> = candidates
        .into_iter()
        .filter(|c| c.similarity >= threshold)
        .collect();
    if kept.is_empty() {
        return Err(format!("no ads above similarity threshold {threshold}"));
    }
    kept.truncate(limit);
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    use adrelay_db::AdMatchRow;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn scored(similarity: f64) -> ScoredAd {
        ScoredAd {
            ad: AdMatchRow {
                id: Uuid::new_v4(),
                campaign_id: Uuid::new_v4(),
                title: "ad".to_string(),
                content: "content".to_string(),
                target_url: "https://example.com".to_string(),
                ad_type: "text".to_string(),
                placement: "default".to_string(),
                pricing_model: "cpc".to_string(),
                bid_amount: Decimal::ONE,
                status: "active".to_string(),
                deleted_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                distance: 1.0 - similarity,
            },
            similarity,
            revenue_score: 0.0,
            final_score: similarity,
        }
    }

    #[test]
    fn high_threshold_yields_reason_naming_it() {
        let reason = select_candidates(vec![scored(0.6)], 0.99, 3).unwrap_err();
        assert!(reason.contains("0.99"), "reason should name the threshold: {reason}");
    }

    #[test]
    fn selection_keeps_order_and_truncates() {
        let candidates = vec![scored(0.9), scored(0.8), scored(0.7), scored(0.6)];
        let kept = select_candidates(candidates, 0.65, 2).unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept[0].similarity > kept[1].similarity);
    }

    #[test]
    fn exact_threshold_is_kept() {
        let kept = select_candidates(vec![scored(0.25)], 0.25, 3).unwrap();
        assert_eq!(kept.len(), 1);
    }

    fn ad_row(id: Uuid, bid: Decimal) -> AdRow {
        AdRow {
            id,
            campaign_id: Uuid::new_v4(),
            title: "ad".to_string(),
            content: "content".to_string(),
            target_url: "https://example.com".to_string(),
            ad_type: "banner".to_string(),
            placement: "sidebar".to_string(),
            pricing_model: "cpc".to_string(),
            bid_amount: bid,
            status: "active".to_string(),
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn queued_ads_serve_in_queue_order_with_queued_similarity() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let entries = vec![
            QueuedDisplayAd {
                ad_id: first,
                similarity: 0.8,
            },
            QueuedDisplayAd {
                ad_id: second,
                similarity: 0.6,
            },
        ];
        // Row order from the store is unspecified; queue order wins.
        let rows = vec![ad_row(second, Decimal::ONE), ad_row(first, Decimal::TWO)];

        let served = queued_to_served(rows, &entries);
        assert_eq!(served.len(), 2);
        assert_eq!(served[0].ad_id, first);
        assert!((served[0].similarity - 0.8).abs() < f64::EPSILON);
        assert_eq!(served[1].ad_id, second);
    }

    #[test]
    fn stale_queue_entries_are_dropped() {
        let live = Uuid::new_v4();
        let entries = vec![
            QueuedDisplayAd {
                ad_id: Uuid::new_v4(),
                similarity: 0.9,
            },
            QueuedDisplayAd {
                ad_id: live,
                similarity: 0.5,
            },
        ];
        let rows = vec![ad_row(live, Decimal::ONE)];

        let served = queued_to_served(rows, &entries);
        assert_eq!(served.len(), 1);
        assert_eq!(served[0].ad_id, live);
    }
}
