//! Integration tests for `EmbeddingClient` using wiremock HTTP mocks.

use adrelay_embed::{cosine_similarity, EmbedError, EmbeddingClient, EmbeddingConfig};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIM: usize = 8;

fn test_config(base_url: &str, api_key: Option<&str>) -> EmbeddingConfig {
    EmbeddingConfig {
        api_key: api_key.map(ToOwned::to_owned),
        base_url: base_url.to_owned(),
        model: "text-embedding-3-small".to_owned(),
        dimension: DIM,
        timeout_secs: 5,
        max_retries: 0,
        retry_backoff_base_ms: 1,
    }
}

fn test_client(base_url: &str) -> EmbeddingClient {
    EmbeddingClient::new(test_config(base_url, Some("sk-test")))
        .expect("client construction should not fail")
}

fn vector_json(seed: f32) -> serde_json::Value {
    let v: Vec<f32> = (0..DIM).map(|i| seed + i as f32 * 0.01).collect();
    serde_json::json!(v)
}

#[tokio::test]
async fn embed_returns_provider_vector() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "data": [ { "embedding": vector_json(0.1) } ]
    });

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "text-embedding-3-small",
            "input": ["cloud tools"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let vector = client.embed("cloud tools").await.expect("should embed");

    assert_eq!(vector.len(), DIM);
    assert!((vector[0] - 0.1).abs() < 1e-6);
    assert!(!client.is_degraded());
}

#[tokio::test]
async fn embed_batch_preserves_order() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "data": [
            { "embedding": vector_json(0.1) },
            { "embedding": vector_json(0.5) }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let vectors = client
        .embed_batch(&["first".to_owned(), "second".to_owned()])
        .await
        .expect("should embed batch");

    assert_eq!(vectors.len(), 2);
    assert!((vectors[0][0] - 0.1).abs() < 1e-6);
    assert!((vectors[1][0] - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn wrong_embedding_count_is_an_api_error() {
    let server = MockServer::start().await;

    // Two inputs, one embedding back.
    let body = serde_json::json!({
        "data": [ { "embedding": vector_json(0.1) } ]
    });

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .embed_batch(&["a".to_owned(), "b".to_owned()])
        .await
        .expect_err("count mismatch must fail");

    assert!(matches!(err, EmbedError::Api(_)));
}

#[tokio::test]
async fn wrong_dimension_is_an_api_error() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "data": [ { "embedding": [0.1, 0.2, 0.3] } ]
    });

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.embed("short vector").await.expect_err("must fail");

    assert!(matches!(err, EmbedError::Api(_)));
}

#[tokio::test]
async fn client_error_status_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let config = EmbeddingConfig {
        max_retries: 3,
        ..test_config(&server.uri(), Some("sk-bad"))
    };
    let client = EmbeddingClient::new(config).expect("client construction should not fail");
    let err = client.embed("anything").await.expect_err("must fail");

    assert!(matches!(err, EmbedError::Api(_)));
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let body = serde_json::json!({
        "data": [ { "embedding": vector_json(0.2) } ]
    });
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let config = EmbeddingConfig {
        max_retries: 2,
        ..test_config(&server.uri(), Some("sk-test"))
    };
    let client = EmbeddingClient::new(config).expect("client construction should not fail");
    let vector = client.embed("retry me").await.expect("should recover");

    assert_eq!(vector.len(), DIM);
}

#[tokio::test]
async fn degraded_mode_makes_no_http_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = EmbeddingClient::new(test_config(&server.uri(), None))
        .expect("client construction should not fail");

    assert!(client.is_degraded());
    let vector = client.embed("offline").await.expect("fallback never fails");
    assert_eq!(vector.len(), DIM);

    // Deterministic: same text, same fallback vector.
    let again = client.embed("offline").await.expect("fallback never fails");
    assert_eq!(vector, again);
}

#[tokio::test]
async fn embed_or_fallback_degrades_on_provider_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let (vector, degraded) = client.embed_or_fallback("resilient").await;

    assert!(degraded);
    assert_eq!(vector.len(), DIM);
}

#[tokio::test]
async fn fallback_vectors_compare_with_real_cosine() {
    let client = EmbeddingClient::new(test_config("http://unused.invalid", None))
        .expect("client construction should not fail");

    let a = client.embed("alpha").await.unwrap();
    let b = client.embed("beta").await.unwrap();
    let sim = cosine_similarity(&a, &b).expect("same dimension");
    assert!((-1.0..=1.0).contains(&sim));
}
