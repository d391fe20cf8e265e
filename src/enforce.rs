//! Enforcement scheduling.
//!
//! Re-pin requests from content, resize and load signals are coalesced into
//! a two-frame settle-and-verify protocol:
//!
//! ```text
//! Idle -> AwaitFirstFrame -> AwaitSecondFrame -> Idle
//!                                      \-> Correcting -> Idle
//! ```
//!
//! The first frame lets a DOM insertion settle, the second lets reflow from
//! images and line wrapping settle. If content grew again between the write
//! and its verification, exactly one corrective write follows on the next
//! frame.

use crate::distance::ScrollMetrics;
use crate::surface::ScrollSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnforcePhase {
    #[default]
    Idle,
    AwaitFirstFrame,
    AwaitSecondFrame,
    Correcting,
}

/// Result of advancing the phase machine by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    /// Nothing pending for this feed.
    Idle,
    /// Another frame callback is required.
    NeedsFrame,
}

/// What a single enforcement pass did to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Feed was not pinned or no longer live; nothing written.
    Skipped,
    /// Written and verified near bottom.
    Settled,
    /// Written but content grew past the threshold in the meantime.
    Overshot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Enforcement {
    phase: EnforcePhase,
}

impl Enforcement {
    #[must_use]
    pub fn phase(&self) -> EnforcePhase {
        self.phase
    }

    /// A write is pending (`enforcementScheduled`).
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.phase != EnforcePhase::Idle
    }

    /// Schedule a settle-and-verify pass. Returns `true` when this call moved
    /// the machine out of `Idle`, i.e. the caller has to request a frame.
    pub fn request(&mut self) -> bool {
        if self.is_scheduled() {
            return false;
        }
        self.phase = EnforcePhase::AwaitFirstFrame;
        true
    }

    /// Drop any pending pass.
    pub fn cancel(&mut self) {
        self.phase = EnforcePhase::Idle;
    }

    /// Advance one rendering frame.
    pub fn on_frame<S: ScrollSurface>(
        &mut self,
        surface: &S,
        pinned: bool,
        threshold_px: f64,
    ) -> FrameStep {
        match self.phase {
            EnforcePhase::Idle => FrameStep::Idle,
            EnforcePhase::AwaitFirstFrame => {
                if !surface.is_live() {
                    self.phase = EnforcePhase::Idle;
                    return FrameStep::Idle;
                }
                self.phase = EnforcePhase::AwaitSecondFrame;
                FrameStep::NeedsFrame
            }
            EnforcePhase::AwaitSecondFrame => {
                match write_bottom(surface, pinned, threshold_px) {
                    WriteOutcome::Overshot => {
                        log::trace!("enforcement overshot, scheduling correction");
                        self.phase = EnforcePhase::Correcting;
                        FrameStep::NeedsFrame
                    }
                    WriteOutcome::Settled | WriteOutcome::Skipped => {
                        self.phase = EnforcePhase::Idle;
                        FrameStep::Idle
                    }
                }
            }
            EnforcePhase::Correcting => {
                write_bottom(surface, pinned, threshold_px);
                self.phase = EnforcePhase::Idle;
                FrameStep::Idle
            }
        }
    }
}

/// Force the container to its bottom and hide the host affordance, then
/// verify the result against `threshold_px`.
pub fn write_bottom<S: ScrollSurface>(surface: &S, pinned: bool, threshold_px: f64) -> WriteOutcome {
    if !pinned || !surface.is_live() {
        return WriteOutcome::Skipped;
    }
    surface.scroll_to_bottom();
    surface.set_affordance_suppressed(true);
    let after: ScrollMetrics = surface.metrics();
    log::trace!(
        "enforced bottom, distance now {:.1}px",
        after.distance_from_bottom()
    );
    if after.is_near_bottom(threshold_px) {
        WriteOutcome::Settled
    } else {
        WriteOutcome::Overshot
    }
}
