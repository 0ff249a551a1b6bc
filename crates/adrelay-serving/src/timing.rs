//! Display-ad admission control.
//!
//! A sliding-window policy, not a token bucket: count the session's
//! impressions in the trailing five minutes and refuse once the window is
//! full. Applies to display-class ads only; hyperlink and text ads are
//! inline and exempt.

use serde::Serialize;

use crate::types::DisplayTiming;

/// Trailing window inspected by the admission check.
pub const DISPLAY_WINDOW_SECS: i64 = 300;

/// Impressions allowed inside one window.
pub const DISPLAY_WINDOW_MAX_IMPRESSIONS: i64 = 3;

/// Endpoint handed to approved callers for the actual display serve.
pub const DISPLAY_SERVE_ENDPOINT: &str = "/api/v1/serve/display";

/// Inputs to the admission decision, gathered by the orchestrator.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimingInputs {
    /// Session impressions inside the trailing window.
    pub recent_impressions: i64,
    /// Whether any eligible banner ad exists at all.
    pub has_display_inventory: bool,
}

/// Decide whether a display ad may be shown.
///
/// Pure so the policy is testable without a store.
#[must_use]
pub fn timing_decision(inputs: TimingInputs) -> DisplayTiming {
    if inputs.recent_impressions >= DISPLAY_WINDOW_MAX_IMPRESSIONS {
        return DisplayTiming {
            should_show: false,
            reason: Some("too many recent impressions".to_string()),
            serve_endpoint: None,
        };
    }
    if !inputs.has_display_inventory {
        return DisplayTiming {
            should_show: false,
            reason: Some("no display ads available".to_string()),
            serve_endpoint: None,
        };
    }
    DisplayTiming {
        should_show: true,
        reason: None,
        serve_endpoint: Some(DISPLAY_SERVE_ENDPOINT.to_string()),
    }
}
