//! Shared domain types and configuration for adrelay.
//!
//! Holds the campaign/ad/impression vocabulary used across the matching,
//! serving, and budget crates, the per-creator business settings with their
//! hard-coded defaults, and environment-driven application configuration.

pub mod app_config;
pub mod config;
pub mod settings;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use settings::{AdFrequency, BusinessSettings};
pub use types::{
    AdStatus, AdType, CampaignStatus, ClickMetadata, ImpressionStatus, Placement, PricingModel,
};

use thiserror::Error;

/// Errors from parsing domain vocabulary strings.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid campaign status: {0}")]
    InvalidCampaignStatus(String),
    #[error("invalid ad status: {0}")]
    InvalidAdStatus(String),
    #[error("invalid ad type: {0}")]
    InvalidAdType(String),
    #[error("invalid placement: {0}")]
    InvalidPlacement(String),
    #[error("invalid pricing model: {0}")]
    InvalidPricingModel(String),
    #[error("invalid impression status: {0}")]
    InvalidImpressionStatus(String),
    #[error("invalid ad frequency: {0}")]
    InvalidAdFrequency(String),
}

/// Errors from loading application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
