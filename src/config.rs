//! Controller configuration.
//!
//! Every field has a default so the host environment only overrides what it
//! needs. Field names are camelCase on the JavaScript/JSON side.

use serde::{Deserialize, Serialize};

use crate::error::{FeedpinError, Result};

/// Timing and threshold settings consumed by the core controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PinConfig {
    /// Distance from the bottom edge (px) still counted as "near bottom".
    pub bottom_threshold_px: f64,
    /// How long after a raw input signal scroll changes belong to the user.
    pub user_intent_window_ms: f64,
    /// Period of the fallback re-assertion timer.
    pub pinned_enforce_interval_ms: u32,
    /// Delay before the one-shot "stuck at top" bootstrap check.
    pub bootstrap_delay_ms: u32,
    /// Period of the discovery rescan loop.
    pub rescan_interval_ms: u32,
    /// Debounce applied to whole-document mutation signals before a rescan.
    pub rescan_debounce_ms: u32,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            bottom_threshold_px: 200.0,
            user_intent_window_ms: 1200.0,
            pinned_enforce_interval_ms: 500,
            bootstrap_delay_ms: 600,
            rescan_interval_ms: 1500,
            rescan_debounce_ms: 250,
        }
    }
}

impl PinConfig {
    /// Reject values the controller cannot work with.
    ///
    /// # Errors
    /// Returns [`FeedpinError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.bottom_threshold_px.is_finite() || self.bottom_threshold_px < 0.0 {
            return Err(FeedpinError::InvalidConfig(format!(
                "bottomThresholdPx must be a non-negative number, got {}",
                self.bottom_threshold_px
            )));
        }
        if !self.user_intent_window_ms.is_finite() || self.user_intent_window_ms < 0.0 {
            return Err(FeedpinError::InvalidConfig(format!(
                "userIntentWindowMs must be a non-negative number, got {}",
                self.user_intent_window_ms
            )));
        }
        for (name, value) in [
            ("pinnedEnforceIntervalMs", self.pinned_enforce_interval_ms),
            ("rescanIntervalMs", self.rescan_interval_ms),
        ] {
            if value == 0 {
                return Err(FeedpinError::InvalidConfig(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

/// Page-specific settings used by the browser runtime's collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostConfig {
    /// Selector matching every scrollable feed container.
    pub feed_selector: String,
    /// Selector (relative to the container) for the message list. `None`
    /// means the container is its own content root.
    pub content_selector: Option<String>,
    /// Selector (relative to the feed's host root) for the "jump to latest"
    /// button the page shows while its own auto-scroll is off.
    pub resume_selector: Option<String>,
    /// Selector (relative to the feed's host root) for the footer the toggle
    /// button is appended to. `None` disables the toggle.
    pub controls_selector: Option<String>,
    /// Selector used with `closest()` to find the feed's host root.
    pub root_selector: Option<String>,
    /// `localStorage` key of the persisted on/off preference.
    pub storage_key: String,
    pub toggle_label_on: String,
    pub toggle_label_off: String,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            feed_selector: "grnk-chat-replay .cr-message-container".to_string(),
            content_selector: None,
            resume_selector: Some("button.cr-content-float-scroll".to_string()),
            controls_selector: Some(".cr-controls".to_string()),
            root_selector: Some("grnk-chat-replay".to_string()),
            storage_key: "feedpinAutoScrollEnabled".to_string(),
            toggle_label_on: "Auto-Scroll: On".to_string(),
            toggle_label_off: "Auto-Scroll: Off".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl HostConfig {
    /// Parsed `log_level`; unknown names fall back to `Warn`.
    #[must_use]
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level
            .parse()
            .unwrap_or(log::LevelFilter::Warn)
    }
}

/// Complete configuration as supplied by the hosting environment.
///
/// Core settings sit at the top level; page selectors live under `host`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    #[serde(flatten)]
    pub pin: PinConfig,
    pub host: HostConfig,
}

impl Config {
    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    /// Returns [`FeedpinError::InvalidConfig`] for out-of-range values or an
    /// empty feed selector.
    pub fn validate(&self) -> Result<()> {
        self.pin.validate()?;
        if self.host.feed_selector.trim().is_empty() {
            return Err(FeedpinError::InvalidConfig(
                "host.feedSelector must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
