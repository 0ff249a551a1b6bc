//! Campaign/ad/impression vocabulary.
//!
//! Every status enum mirrors a CHECK-constrained TEXT column; `as_str` and
//! `FromStr` are the single source of truth for the wire/database spelling.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Campaign lifecycle status.
///
/// A campaign whose `spent_amount` reaches `budget_amount` is transitioned
/// to `Paused` (along with all of its ads); `Completed` is reserved for
/// campaigns past their end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(CoreError::InvalidCampaignStatus(other.to_string())),
        }
    }
}

/// Ad lifecycle status. Only `Active` ads (in `Active` campaigns) serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    Pending,
    Active,
    Paused,
}

impl AdStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AdStatus::Pending => "pending",
            AdStatus::Active => "active",
            AdStatus::Paused => "paused",
        }
    }
}

impl std::fmt::Display for AdStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AdStatus::Pending),
            "active" => Ok(AdStatus::Active),
            "paused" => Ok(AdStatus::Paused),
            other => Err(CoreError::InvalidAdStatus(other.to_string())),
        }
    }
}

/// Creative format of an ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdType {
    Text,
    Banner,
    Video,
    Hyperlink,
    Popup,
    Thinking,
}

impl AdType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AdType::Text => "text",
            AdType::Banner => "banner",
            AdType::Video => "video",
            AdType::Hyperlink => "hyperlink",
            AdType::Popup => "popup",
            AdType::Thinking => "thinking",
        }
    }

    /// Display-class ads are rate limited per session; hyperlink and text
    /// ads are inline and exempt.
    #[must_use]
    pub fn is_display(self) -> bool {
        matches!(
            self,
            AdType::Banner | AdType::Video | AdType::Popup | AdType::Thinking
        )
    }

    /// The types queued for out-of-band display serving by the tool-call
    /// surface, each searched at its own threshold.
    #[must_use]
    pub fn display_types() -> [AdType; 4] {
        [AdType::Popup, AdType::Thinking, AdType::Banner, AdType::Video]
    }
}

impl std::fmt::Display for AdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(AdType::Text),
            "banner" => Ok(AdType::Banner),
            "video" => Ok(AdType::Video),
            "hyperlink" => Ok(AdType::Hyperlink),
            "popup" => Ok(AdType::Popup),
            "thinking" => Ok(AdType::Thinking),
            other => Err(CoreError::InvalidAdType(other.to_string())),
        }
    }
}

/// Where an ad is slotted in the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    ChatInline,
    Sidebar,
    ContentPromo,
    Chat,
    Default,
}

impl Placement {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Placement::ChatInline => "chat_inline",
            Placement::Sidebar => "sidebar",
            Placement::ContentPromo => "content_promo",
            Placement::Chat => "chat",
            Placement::Default => "default",
        }
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Placement {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat_inline" => Ok(Placement::ChatInline),
            "sidebar" => Ok(Placement::Sidebar),
            "content_promo" => Ok(Placement::ContentPromo),
            "chat" => Ok(Placement::Chat),
            "default" => Ok(Placement::Default),
            other => Err(CoreError::InvalidPlacement(other.to_string())),
        }
    }
}

/// How an ad is priced. Serving computes revenue as the bid amount (CPC
/// simplification); CPM/flat callers scale upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingModel {
    Cpc,
    Cpm,
    Flat,
    Affiliate,
}

impl PricingModel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PricingModel::Cpc => "cpc",
            PricingModel::Cpm => "cpm",
            PricingModel::Flat => "flat",
            PricingModel::Affiliate => "affiliate",
        }
    }
}

impl std::fmt::Display for PricingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PricingModel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpc" => Ok(PricingModel::Cpc),
            "cpm" => Ok(PricingModel::Cpm),
            "flat" => Ok(PricingModel::Flat),
            "affiliate" => Ok(PricingModel::Affiliate),
            other => Err(CoreError::InvalidPricingModel(other.to_string())),
        }
    }
}

/// Impression billing state. Transitions are monotonic:
/// `pending -> clicked -> billed` or `pending -> billed`, never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpressionStatus {
    Pending,
    Clicked,
    Billed,
}

impl ImpressionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImpressionStatus::Pending => "pending",
            ImpressionStatus::Clicked => "clicked",
            ImpressionStatus::Billed => "billed",
        }
    }
}

impl std::fmt::Display for ImpressionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImpressionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ImpressionStatus::Pending),
            "clicked" => Ok(ImpressionStatus::Clicked),
            "billed" => Ok(ImpressionStatus::Billed),
            other => Err(CoreError::InvalidImpressionStatus(other.to_string())),
        }
    }
}

/// Typed click metadata stored as JSONB on the click row.
///
/// `version` tags the field set so older rows stay readable if fields are
/// added later; unknown inbound fields are dropped rather than preserved in
/// an untyped map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClickMetadata {
    #[serde(default = "ClickMetadata::current_version")]
    pub version: u8,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
}

impl ClickMetadata {
    fn current_version() -> u8 {
        1
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
