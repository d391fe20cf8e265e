//! Distance-from-bottom evaluation for a scrollable container.

/// Slack (px) under which a container counts as sitting exactly at its
/// bottom. Browsers report fractional `scrollTop` on zoomed pages.
pub const AT_BOTTOM_TOLERANCE_PX: f64 = 1.0;

/// A snapshot of the three scroll measurements of a container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// `scrollHeight - (scrollTop + clientHeight)`, never negative.
    #[must_use]
    pub fn distance_from_bottom(&self) -> f64 {
        (self.scroll_height - (self.scroll_top + self.client_height)).max(0.0)
    }

    #[must_use]
    pub fn is_near_bottom(&self, threshold_px: f64) -> bool {
        self.distance_from_bottom() <= threshold_px
    }

    #[must_use]
    pub fn is_at_bottom(&self) -> bool {
        self.distance_from_bottom() <= AT_BOTTOM_TOLERANCE_PX
    }

    /// The feed still shows its oldest content.
    #[must_use]
    pub fn is_near_top(&self, threshold_px: f64) -> bool {
        self.scroll_top <= threshold_px
    }

    /// Largest `scrollTop` the container accepts.
    #[must_use]
    pub fn max_scroll_top(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }
}
