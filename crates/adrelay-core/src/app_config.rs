use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// API key for the embedding provider. `None` puts the embedding
    /// gateway in degraded (deterministic fallback vector) mode.
    pub embedding_api_key: Option<String>,
    pub embedding_base_url: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub embedding_timeout_secs: u64,
    pub embedding_max_retries: u32,
    pub embedding_retry_backoff_base_ms: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "embedding_api_key",
                &self.embedding_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("embedding_base_url", &self.embedding_base_url)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimension", &self.embedding_dimension)
            .field("embedding_timeout_secs", &self.embedding_timeout_secs)
            .field("embedding_max_retries", &self.embedding_max_retries)
            .field(
                "embedding_retry_backoff_base_ms",
                &self.embedding_retry_backoff_base_ms,
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
