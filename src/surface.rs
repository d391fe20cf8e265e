//! The seam between the controller and whatever owns the scrollable region.

use crate::distance::ScrollMetrics;

/// A scrollable feed container as seen by the controller.
///
/// All writes are best-effort; implementations swallow host failures.
/// Equality must mean "same underlying container" so attach stays idempotent.
pub trait ScrollSurface: PartialEq {
    /// Current scroll measurements.
    fn metrics(&self) -> ScrollMetrics;

    /// Move the viewport to the container's maximum scroll offset.
    fn scroll_to_bottom(&self);

    /// Hide (`true`) or restore (`false`) the host's "new messages below"
    /// affordance, if the page has one.
    fn set_affordance_suppressed(&self, suppressed: bool);

    /// The container is still part of the live document.
    fn is_live(&self) -> bool;
}
