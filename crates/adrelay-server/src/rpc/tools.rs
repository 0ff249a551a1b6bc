//! The `earnlayer_content_ads_search` tool.
//!
//! Hyperlink/text ads come back in the RPC response; display-class ads
//! found for the same queries are queued per session here and drained
//! later by the display serve endpoint.

use std::collections::HashSet;
use std::time::Instant;

use serde_json::{json, Value};
use uuid::Uuid;

use adrelay_core::settings::BusinessSettings;
use adrelay_core::AdType;
use adrelay_db::AdSearchFilters;
use adrelay_match::{AdMatch, SearchOptions};
use adrelay_serving::QueuedDisplayAd;

use crate::api::AppState;
use crate::rpc::RpcError;

pub const TOOL_NAME: &str = "earnlayer_content_ads_search";

/// Similarity floor for hyperlink/text tool results. Deliberately looser
/// than the serving threshold, down to slightly negative cosine-derived
/// scores: hyperlink ads are low-risk to over-serve.
pub const HYPERLINK_SEARCH_FLOOR: f64 = -0.05;

const MAX_QUERIES: usize = 3;
const PER_QUERY_CANDIDATES: i64 = 10;
const HYPERLINK_RESULT_LIMIT: usize = 3;

/// Parsed and validated `tools/call` arguments.
#[derive(Debug, Clone)]
pub struct SearchArgs {
    pub conversation_id: Uuid,
    pub queries: Vec<String>,
    /// The message that prompted the call. Analytics-only: the agent has
    /// already distilled it into `queries`, so matching never sees it.
    pub user_message: Option<String>,
    pub include_demo_ads: bool,
}

/// The `tools/list` payload.
#[must_use]
pub fn tool_descriptors() -> Value {
    json!({
        "tools": [{
            "name": TOOL_NAME,
            "description": "Search contextually relevant hyperlink ads for up to \
                            three queries and queue display ads for the session.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "conversation_id": {
                        "type": "string",
                        "description": "Chat session UUID; resolves the creator."
                    },
                    "queries": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1,
                        "maxItems": 3
                    },
                    "user_message": { "type": "string" },
                    "include_demo_ads": { "type": "boolean" }
                },
                "required": ["conversation_id", "queries"]
            }
        }]
    })
}

/// Execute a `tools/call` request.
///
/// # Errors
///
/// `-32602` for an unknown tool name or schema-invalid arguments,
/// `-32603` with the failure text as `data` for anything that goes wrong
/// during execution (including an unresolvable conversation).
pub async fn handle_tools_call(state: &AppState, params: &Value) -> Result<Value, RpcError> {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Err(RpcError::invalid_params("missing tool name"));
    };
    if name != TOOL_NAME {
        return Err(RpcError::invalid_params(format!("unknown tool: {name}")));
    }

    let args = parse_search_args(params.get("arguments").unwrap_or(&Value::Null))
        .map_err(RpcError::invalid_params)?;

    content_ads_search(state, &args)
        .await
        .map_err(|e| RpcError::internal("tool execution failed", e))
}

/// Validate raw tool arguments against the input schema.
pub fn parse_search_args(arguments: &Value) -> Result<SearchArgs, String> {
    let obj = arguments
        .as_object()
        .ok_or_else(|| "arguments must be an object".to_string())?;

    let conversation_id = obj
        .get("conversation_id")
        .and_then(Value::as_str)
        .ok_or_else(|| "conversation_id is required".to_string())?;
    let conversation_id = Uuid::parse_str(conversation_id)
        .map_err(|_| format!("conversation_id is not a valid UUID: {conversation_id}"))?;

    let raw_queries = obj
        .get("queries")
        .and_then(Value::as_array)
        .ok_or_else(|| "queries must be an array of strings".to_string())?;
    if raw_queries.is_empty() || raw_queries.len() > MAX_QUERIES {
        return Err(format!(
            "queries must contain between 1 and {MAX_QUERIES} items, got {}",
            raw_queries.len()
        ));
    }
    let mut queries = Vec::with_capacity(raw_queries.len());
    for q in raw_queries {
        let Some(q) = q.as_str() else {
            return Err("queries must contain only strings".to_string());
        };
        queries.push(q.to_string());
    }

    let user_message = obj
        .get("user_message")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);
    let include_demo_ads = obj
        .get("include_demo_ads")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(SearchArgs {
        conversation_id,
        queries,
        user_message,
        include_demo_ads,
    })
}

async fn content_ads_search(state: &AppState, args: &SearchArgs) -> Result<Value, String> {
    let started = Instant::now();

    let session = adrelay_db::sessions::get_session(&state.pool, args.conversation_id)
        .await
        .map_err(|e| format!("session lookup failed: {e}"))?
        .ok_or_else(|| format!("unknown conversation: {}", args.conversation_id))?;
    let creator_id = session.creator_id;

    let settings_row = adrelay_db::settings::get_business_settings(&state.pool, creator_id)
        .await
        .map_err(|e| format!("settings lookup failed: {e}"))?;
    let settings = adrelay_db::settings::effective_settings(settings_row);

    // Queries run sequentially in the given order; the union is re-sorted
    // globally afterward, so the order only shapes the logs.
    let mut per_query: Vec<(String, Vec<AdMatch>)> = Vec::with_capacity(args.queries.len());
    for query in &args.queries {
        let matches = state
            .searcher
            .search_ads(query, &hyperlink_search_options())
            .await
            .map_err(|e| format!("ad search failed for query {query:?}: {e}"))?;
        per_query.push((query.clone(), matches));
    }

    let union: Vec<AdMatch> = per_query
        .iter()
        .flat_map(|(_, matches)| matches.iter().cloned())
        .collect();
    let hyperlink_ads = dedup_by_target_url(union, HYPERLINK_RESULT_LIMIT);

    let display_queued =
        queue_display_ads(state, args.conversation_id, &args.queries, &settings).await?;

    let latency_ms = started.elapsed().as_millis();
    tracing::info!(
        conversation_id = %args.conversation_id,
        creator_id = %creator_id,
        query_count = args.queries.len(),
        user_message_len = args.user_message.as_deref().map_or(0, str::len),
        hyperlink_count = hyperlink_ads.len(),
        display_queued,
        include_demo_ads = args.include_demo_ads,
        latency_ms,
        "content ads search"
    );

    let summary = build_summary(&per_query, &hyperlink_ads, display_queued);
    Ok(json!({
        "content": [{ "type": "text", "text": summary }]
    }))
}

fn hyperlink_search_options() -> SearchOptions {
    SearchOptions {
        limit: PER_QUERY_CANDIDATES,
        threshold: HYPERLINK_SEARCH_FLOOR,
        filters: AdSearchFilters {
            ad_types: Some(vec!["hyperlink".to_string(), "text".to_string()]),
            ..AdSearchFilters::default()
        },
    }
}

/// Search display-class candidates for the same queries at the creator's
/// threshold and queue them on the session for the display serve endpoint
/// to drain. Only the newly-queued count surfaces in the RPC response.
async fn queue_display_ads(
    state: &AppState,
    session_id: Uuid,
    queries: &[String],
    settings: &BusinessSettings,
) -> Result<usize, String> {
    let mut found: Vec<AdMatch> = Vec::new();
    for ad_type in AdType::display_types() {
        let opts = SearchOptions {
            limit: PER_QUERY_CANDIDATES,
            threshold: settings.similarity_threshold,
            filters: AdSearchFilters {
                ad_types: Some(vec![ad_type.as_str().to_string()]),
                ..AdSearchFilters::default()
            },
        };
        for query in queries {
            let matches = state
                .searcher
                .search_ads(query, &opts)
                .await
                .map_err(|e| format!("display queue search failed: {e}"))?;
            found.extend(matches);
        }
    }
    let entries = display_queue_entries(found);
    Ok(state.server.enqueue_display_ads(session_id, entries))
}

/// One queue entry per distinct ad, best similarity first.
pub fn display_queue_entries(mut matches: Vec<AdMatch>) -> Vec<QueuedDisplayAd> {
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut seen: HashSet<Uuid> = HashSet::new();
    matches
        .into_iter()
        .filter(|m| seen.insert(m.ad.id))
        .map(|m| QueuedDisplayAd {
            ad_id: m.ad.id,
            similarity: m.similarity,
        })
        .collect()
}

/// Union, deduplicated by target URL (best similarity wins), sorted
/// similarity-descending, cut to `limit`.
pub fn dedup_by_target_url(mut matches: Vec<AdMatch>, limit: usize) -> Vec<AdMatch> {
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();
    for m in matches {
        if seen.insert(m.ad.target_url.clone()) {
            kept.push(m);
        }
        if kept.len() == limit {
            break;
        }
    }
    kept
}

fn build_summary(
    per_query: &[(String, Vec<AdMatch>)],
    hyperlink_ads: &[AdMatch],
    display_queued: usize,
) -> String {
    let mut lines = Vec::new();
    for (query, matches) in per_query {
        lines.push(format!("query {query:?}: {} hyperlink ads", matches.len()));
    }
    lines.push(format!(
        "returning {} deduplicated hyperlink ads:",
        hyperlink_ads.len()
    ));
    for m in hyperlink_ads {
        lines.push(format!(
            "- {} ({}) similarity {:.3}",
            m.ad.title, m.ad.target_url, m.similarity
        ));
    }
    lines.push(format!("{display_queued} display ads queued for this session"));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    use adrelay_db::AdMatchRow;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn matched(target_url: &str, similarity: f64) -> AdMatch {
        AdMatch {
            ad: AdMatchRow {
                id: Uuid::new_v4(),
                campaign_id: Uuid::new_v4(),
                title: "ad".to_string(),
                content: "content".to_string(),
                target_url: target_url.to_string(),
                ad_type: "hyperlink".to_string(),
                placement: "chat_inline".to_string(),
                pricing_model: "cpc".to_string(),
                bid_amount: Decimal::ONE,
                status: "active".to_string(),
                deleted_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                distance: 1.0 - similarity,
            },
            similarity,
        }
    }

    fn valid_args() -> Value {
        json!({
            "conversation_id": "4f9d15ad-37f8-49a5-b24b-ab57b6e97a28",
            "queries": ["rust web frameworks"]
        })
    }

    #[test]
    fn parse_accepts_one_to_three_queries() {
        let mut args = valid_args();
        for n in 1..=3 {
            args["queries"] = json!(vec!["q"; n]);
            assert!(parse_search_args(&args).is_ok(), "{n} queries should pass");
        }
    }

    #[test]
    fn parse_rejects_zero_and_four_queries() {
        let mut args = valid_args();
        args["queries"] = json!([]);
        assert!(parse_search_args(&args).is_err());
        args["queries"] = json!(["a", "b", "c", "d"]);
        let err = parse_search_args(&args).unwrap_err();
        assert!(err.contains("between 1 and 3"), "{err}");
    }

    #[test]
    fn parse_rejects_non_string_query() {
        let mut args = valid_args();
        args["queries"] = json!(["ok", 7]);
        assert!(parse_search_args(&args).is_err());
    }

    #[test]
    fn parse_rejects_bad_uuid() {
        let mut args = valid_args();
        args["conversation_id"] = json!("not-a-uuid");
        let err = parse_search_args(&args).unwrap_err();
        assert!(err.contains("UUID"), "{err}");
    }

    #[test]
    fn parse_rejects_missing_conversation_id() {
        assert!(parse_search_args(&json!({ "queries": ["q"] })).is_err());
    }

    #[test]
    fn parse_defaults_optional_fields() {
        let args = parse_search_args(&valid_args()).unwrap();
        assert!(args.user_message.is_none());
        assert!(!args.include_demo_ads);
    }

    #[test]
    fn dedup_keeps_each_url_once_best_similarity_first() {
        let matches = vec![
            matched("https://a.example.com", 0.4),
            matched("https://b.example.com", 0.9),
            matched("https://a.example.com", 0.8),
        ];
        let kept = dedup_by_target_url(matches, 3);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].ad.target_url, "https://b.example.com");
        assert_eq!(kept[1].ad.target_url, "https://a.example.com");
        assert!((kept[1].similarity - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn dedup_truncates_to_limit() {
        let matches = vec![
            matched("https://1.example.com", 0.9),
            matched("https://2.example.com", 0.8),
            matched("https://3.example.com", 0.7),
            matched("https://4.example.com", 0.6),
        ];
        assert_eq!(dedup_by_target_url(matches, 3).len(), 3);
    }

    #[test]
    fn queue_entries_dedup_by_ad_keeping_best_similarity() {
        let low = matched("https://a.example.com", 0.4);
        let ad_id = low.ad.id;
        let mut high = low.clone();
        high.similarity = 0.9;
        high.ad.distance = 0.1;
        let other = matched("https://b.example.com", 0.7);
        let other_id = other.ad.id;

        let entries = display_queue_entries(vec![low, other, high]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ad_id, ad_id);
        assert!((entries[0].similarity - 0.9).abs() < f64::EPSILON);
        assert_eq!(entries[1].ad_id, other_id);
    }

    #[test]
    fn summary_names_every_query_and_counts() {
        let per_query = vec![
            ("rust".to_string(), vec![matched("https://a.example.com", 0.8)]),
            ("go".to_string(), vec![]),
        ];
        let top = vec![matched("https://a.example.com", 0.8)];
        let summary = build_summary(&per_query, &top, 2);
        assert!(summary.contains("\"rust\": 1 hyperlink ads"));
        assert!(summary.contains("\"go\": 0 hyperlink ads"));
        assert!(summary.contains("2 display ads queued"));
    }
}
