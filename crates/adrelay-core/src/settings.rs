//! Per-creator business settings.
//!
//! Creators tune how aggressively ads are served in their sessions. When no
//! settings row exists (or the row is inactive), [`BusinessSettings::default`]
//! supplies the hard-coded defaults documented here.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Default blend weight between relevance and revenue when ranking.
pub const DEFAULT_REVENUE_WEIGHT: f64 = 0.5;

/// Default minimum similarity for an ad to be considered a match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.25;

/// Default minimum seconds between display-class ads in one session.
pub const DEFAULT_MIN_SECONDS_BETWEEN_DISPLAY_ADS: i64 = 30;

/// How often a creator wants ads shown relative to baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdFrequency {
    Low,
    Normal,
    High,
}

impl AdFrequency {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AdFrequency::Low => "low",
            AdFrequency::Normal => "normal",
            AdFrequency::High => "high",
        }
    }
}

impl std::fmt::Display for AdFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdFrequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(AdFrequency::Low),
            "normal" => Ok(AdFrequency::Normal),
            "high" => Ok(AdFrequency::High),
            other => Err(CoreError::InvalidAdFrequency(other.to_string())),
        }
    }
}

/// Per-creator serving knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSettings {
    pub ad_frequency: AdFrequency,
    /// Weight of the revenue score in hybrid ranking, in `[0, 1]`.
    pub revenue_weight: f64,
    pub min_seconds_between_display_ads: i64,
    /// Minimum similarity for general ad matching, in `[-1, 1]`.
    pub similarity_threshold: f64,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            ad_frequency: AdFrequency::Normal,
            revenue_weight: DEFAULT_REVENUE_WEIGHT,
            min_seconds_between_display_ads: DEFAULT_MIN_SECONDS_BETWEEN_DISPLAY_ADS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}
