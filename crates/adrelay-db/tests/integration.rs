//! Offline unit tests for adrelay-db pool configuration and row types.
//! These tests do not require a live database connection.

use adrelay_core::{AppConfig, Environment};
use adrelay_db::{AdMatchRow, AdRow, CampaignRow, ImpressionRow, PoolConfig};
use chrono::Utc;
use rust_decimal_macros::dec;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        embedding_api_key: None,
        embedding_base_url: "https://api.openai.com/v1".to_string(),
        embedding_model: "text-embedding-3-small".to_string(),
        embedding_dimension: 1536,
        embedding_timeout_secs: 30,
        embedding_max_retries: 3,
        embedding_retry_backoff_base_ms: 1000,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`CampaignRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn campaign_row_has_expected_fields() {
    let row = CampaignRow {
        id: Uuid::new_v4(),
        advertiser_id: Uuid::new_v4(),
        name: "Summer Cloud Push".to_string(),
        start_date: Utc::now(),
        end_date: Utc::now(),
        budget_amount: dec!(100.00),
        spent_amount: dec!(0),
        currency: "USD".to_string(),
        status: "active".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.name, "Summer Cloud Push");
    assert_eq!(row.budget_amount, dec!(100.00));
    assert_eq!(row.spent_amount, dec!(0));
    assert_eq!(row.status, "active");
}

/// Compile-time smoke test for [`AdRow`] and [`AdMatchRow`].
#[test]
fn ad_rows_have_expected_fields() {
    let ad = AdRow {
        id: Uuid::new_v4(),
        campaign_id: Uuid::new_v4(),
        title: "Acme Cloud".to_string(),
        content: "Deploy faster with Acme Cloud".to_string(),
        target_url: "https://acme.example/cloud".to_string(),
        ad_type: "hyperlink".to_string(),
        placement: "chat_inline".to_string(),
        pricing_model: "cpc".to_string(),
        bid_amount: dec!(2.50),
        status: "active".to_string(),
        deleted_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    assert_eq!(ad.ad_type, "hyperlink");
    assert!(ad.deleted_at.is_none());

    let matched = AdMatchRow {
        id: ad.id,
        campaign_id: ad.campaign_id,
        title: ad.title.clone(),
        content: ad.content.clone(),
        target_url: ad.target_url.clone(),
        ad_type: ad.ad_type.clone(),
        placement: ad.placement.clone(),
        pricing_model: ad.pricing_model.clone(),
        bid_amount: ad.bid_amount,
        status: ad.status.clone(),
        deleted_at: None,
        created_at: ad.created_at,
        updated_at: ad.updated_at,
        distance: 0.25,
    };
    assert!((matched.distance - 0.25).abs() < f64::EPSILON);
}

/// Compile-time smoke test for [`ImpressionRow`]: the payout is stored at
/// creation and the status starts `pending`.
#[test]
fn impression_row_has_expected_fields() {
    let row = ImpressionRow {
        id: Uuid::new_v4(),
        ad_id: Uuid::new_v4(),
        creator_id: Uuid::new_v4(),
        session_id: Some(Uuid::new_v4()),
        placement: Some("chat_inline".to_string()),
        revenue_amount: dec!(2.50),
        creator_payout_amount: dec!(1.75),
        currency: "USD".to_string(),
        status: "pending".to_string(),
        created_at: Utc::now(),
    };

    assert_eq!(row.creator_payout_amount, dec!(1.75));
    assert_eq!(row.status, "pending");
}
