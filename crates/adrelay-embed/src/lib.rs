//! Embedding gateway for adrelay.
//!
//! Turns text into fixed-dimension vectors via an OpenAI-style embeddings
//! provider. When no API key is configured the gateway runs in degraded
//! mode and returns deterministic-shape fallback vectors so matching and
//! serving keep functioning without real semantics (tests, local dev).

pub mod client;
pub mod error;
pub mod fallback;
pub mod similarity;

mod retry;

pub use client::{EmbeddingClient, EmbeddingConfig};
pub use error::EmbedError;
pub use fallback::fallback_vector;
pub use similarity::cosine_similarity;
