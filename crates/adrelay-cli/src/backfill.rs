//! Embedding backfill for ads added before a vector was computed.
//!
//! Per-ad store failures are logged and skipped rather than propagated so
//! one bad row does not abort the full run.

use std::sync::Arc;

use sqlx::PgPool;

use adrelay_embed::{EmbeddingClient, EmbeddingConfig};

/// Text an ad is embedded from: title and content, one per line.
fn embedding_input(title: &str, content: &str) -> String {
    format!("{title}\n{content}")
}

/// Embed every ad missing a vector, up to `limit`.
///
/// When `dry_run` is `true` the function prints what would be embedded and
/// returns without calling the provider or writing anything.
///
/// # Errors
///
/// Returns an error if the candidate list cannot be loaded, the embedding
/// client cannot be constructed, or the provider call fails outright.
pub(crate) async fn run_backfill_embeddings(
    pool: &PgPool,
    config: &adrelay_core::AppConfig,
    limit: i64,
    dry_run: bool,
) -> anyhow::Result<()> {
    let ads = adrelay_db::ads::list_ads_missing_embedding(pool, limit).await?;
    if ads.is_empty() {
        println!("no ads are missing embeddings");
        return Ok(());
    }

    if dry_run {
        println!("dry-run: would embed {} ads:", ads.len());
        for ad in &ads {
            println!("  {}  {}", ad.id, ad.title);
        }
        return Ok(());
    }

    let embedder = Arc::new(EmbeddingClient::new(EmbeddingConfig::from_app_config(
        config,
    ))?);
    if embedder.is_degraded() {
        tracing::warn!("no embedding API key configured; backfilling with fallback vectors");
    }

    let inputs: Vec<String> = ads
        .iter()
        .map(|ad| embedding_input(&ad.title, &ad.content))
        .collect();
    let vectors = embedder.embed_batch(&inputs).await?;

    let mut stored = 0usize;
    for (ad, vector) in ads.iter().zip(vectors.iter()) {
        match adrelay_db::ads::update_ad_embedding(pool, ad.id, vector).await {
            Ok(()) => stored += 1,
            Err(e) => {
                tracing::error!(ad_id = %ad.id, error = %e, "failed to store embedding; skipping");
            }
        }
    }

    println!("embedded {stored} of {} ads", ads.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_input_joins_title_and_content() {
        assert_eq!(
            embedding_input("Great CDN", "Fast edges everywhere"),
            "Great CDN\nFast edges everywhere"
        );
    }
}
