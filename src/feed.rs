//! One controlled feed: the per-container bundle of pin state, intent
//! tracking, enforcement phase and teardown handlers.
//!
//! Every entry point takes the current time in milliseconds and checks the
//! container's liveness before acting, so a deferred callback that fires
//! after the container left the page does nothing.

use std::fmt;

use crate::config::PinConfig;
use crate::enforce::{self, EnforcePhase, Enforcement, FrameStep, WriteOutcome};
use crate::intent::{InputKind, IntentTracker};
use crate::pin::{self, PinState, ScrollFacts};
use crate::surface::ScrollSurface;

/// A zero-argument action undoing one subscription.
pub type TeardownHandler = Box<dyn FnOnce()>;

pub struct ControlledFeed<S> {
    surface: S,
    config: PinConfig,
    pin: PinState,
    enabled: bool,
    intent: IntentTracker,
    enforcement: Enforcement,
    bootstrap_armed: bool,
    teardown: Vec<TeardownHandler>,
}

impl<S: fmt::Debug> fmt::Debug for ControlledFeed<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlledFeed")
            .field("surface", &self.surface)
            .field("pin", &self.pin)
            .field("enabled", &self.enabled)
            .field("intent", &self.intent)
            .field("enforcement", &self.enforcement)
            .field("teardown", &self.teardown.len())
            .finish()
    }
}

impl<S: ScrollSurface> ControlledFeed<S> {
    /// Take control of `surface`. The feed starts pinned when it is already
    /// near its bottom; a pinned start immediately schedules enforcement.
    pub fn new(surface: S, config: PinConfig) -> Self {
        let pin = PinState::initial(surface.metrics().is_near_bottom(config.bottom_threshold_px));
        let mut feed = Self {
            surface,
            config,
            pin,
            enabled: true,
            intent: IntentTracker::new(),
            enforcement: Enforcement::default(),
            bootstrap_armed: true,
            teardown: Vec::new(),
        };
        if feed.pin.is_pinned() {
            feed.request_enforcement();
        }
        feed
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &PinConfig {
        &self.config
    }

    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pin.is_pinned()
    }

    #[must_use]
    pub fn pin_state(&self) -> PinState {
        self.pin
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn has_user_interacted(&self) -> bool {
        self.intent.has_user_interacted()
    }

    #[must_use]
    pub fn last_intent_ms(&self) -> Option<f64> {
        self.intent.last_intent_ms()
    }

    #[must_use]
    pub fn enforcement_phase(&self) -> EnforcePhase {
        self.enforcement.phase()
    }

    #[must_use]
    pub fn is_enforcement_scheduled(&self) -> bool {
        self.enforcement.is_scheduled()
    }

    /// A frame callback is needed to advance this feed.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.enforcement.is_scheduled()
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.surface.is_live()
    }

    fn set_pin(&mut self, next: PinState, reason: &str) {
        if self.pin != next {
            log::debug!("feed {:?} -> {:?} ({reason})", self.pin, next);
            self.pin = next;
        }
    }

    /// Schedule a settle-and-verify pass. Returns `true` when the caller must
    /// request a frame.
    pub fn request_enforcement(&mut self) -> bool {
        if !self.surface.is_live() {
            return false;
        }
        self.enforcement.request()
    }

    /// Raw user input (wheel, touch, pointer, key).
    pub fn on_input(&mut self, kind: InputKind, now_ms: f64) {
        log::trace!("user intent: {kind:?}");
        self.intent.mark(now_ms);
    }

    #[must_use]
    pub fn is_within_intent_window(&self, now_ms: f64) -> bool {
        self.intent
            .is_within_window(now_ms, self.config.user_intent_window_ms)
    }

    /// A scroll event fired on the container. Returns `true` when the caller
    /// must request a frame.
    pub fn on_scroll(&mut self, now_ms: f64) -> bool {
        if !self.surface.is_live() {
            return false;
        }
        let metrics = self.surface.metrics();
        let facts = ScrollFacts {
            within_intent: self.is_within_intent_window(now_ms),
            near_bottom: metrics.is_near_bottom(self.config.bottom_threshold_px),
            at_bottom: metrics.is_at_bottom(),
            enabled: self.enabled,
        };
        let transition = pin::on_scroll(self.pin, facts);
        self.set_pin(transition.next, "scroll");
        transition.enforce && self.request_enforcement()
    }

    /// Content mutation, resize or media load inside the feed. Returns `true`
    /// when the caller must request a frame.
    pub fn on_content_changed(&mut self) -> bool {
        self.pin.is_pinned() && self.request_enforcement()
    }

    /// Advance the enforcement phase by one rendering frame.
    pub fn on_frame(&mut self) -> FrameStep {
        self.enforcement.on_frame(
            &self.surface,
            self.pin.is_pinned(),
            self.config.bottom_threshold_px,
        )
    }

    /// Periodic fallback re-assertion. Returns what the write did, if any.
    pub fn on_tick(&mut self) -> WriteOutcome {
        if !self.surface.is_live() {
            return WriteOutcome::Skipped;
        }
        if !self.pin.is_pinned() {
            self.surface.set_affordance_suppressed(false);
            return WriteOutcome::Skipped;
        }
        if self
            .surface
            .metrics()
            .is_near_bottom(self.config.bottom_threshold_px)
        {
            return WriteOutcome::Skipped;
        }
        enforce::write_bottom(&self.surface, true, self.config.bottom_threshold_px)
    }

    /// One-shot "stuck at top" correction, run `bootstrap_delay_ms` after
    /// attach. Returns `true` when the caller must request a frame.
    pub fn on_bootstrap(&mut self) -> bool {
        if !std::mem::replace(&mut self.bootstrap_armed, false) || !self.surface.is_live() {
            return false;
        }
        let near_top = self
            .surface
            .metrics()
            .is_near_top(self.config.bottom_threshold_px);
        if !pin::bootstrap_should_pin(self.has_user_interacted(), near_top, self.enabled) {
            return false;
        }
        self.set_pin(PinState::Pinned, "bootstrap");
        self.request_enforcement()
    }

    /// The host's "jump to latest" affordance was activated. Returns `true`
    /// when the caller must request a frame.
    pub fn resume(&mut self, now_ms: f64) -> bool {
        self.intent.mark(now_ms);
        self.set_pin(PinState::Pinned, "resume");
        self.request_enforcement()
    }

    /// Preference toggle. Turning on behaves like [`Self::resume`]; turning
    /// off unpins and cancels any pending pass. Returns `true` when the caller
    /// must request a frame.
    pub fn set_enabled(&mut self, enabled: bool, now_ms: f64) -> bool {
        self.enabled = enabled;
        if enabled {
            return self.resume(now_ms);
        }
        self.set_pin(PinState::Unpinned, "disabled");
        self.enforcement.cancel();
        if self.surface.is_live() {
            self.surface.set_affordance_suppressed(false);
        }
        false
    }

    /// Record a subscription to undo on teardown.
    pub fn on_teardown(&mut self, handler: impl FnOnce() + 'static) {
        self.teardown.push(Box::new(handler));
    }

    #[must_use]
    pub fn teardown_len(&self) -> usize {
        self.teardown.len()
    }

    /// Invoke every recorded teardown handler once and cancel pending work.
    /// Returns how many handlers ran.
    pub fn teardown(&mut self) -> usize {
        self.enforcement.cancel();
        self.bootstrap_armed = false;
        let handlers = std::mem::take(&mut self.teardown);
        let count = handlers.len();
        for handler in handlers {
            handler();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::ScrollMetrics;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Stub {
        metrics: RefCell<ScrollMetrics>,
        writes: Cell<u32>,
    }

    impl PartialEq for Stub {
        fn eq(&self, other: &Self) -> bool {
            std::ptr::eq(self, other)
        }
    }

    impl ScrollSurface for Stub {
        fn metrics(&self) -> ScrollMetrics {
            *self.metrics.borrow()
        }
        fn scroll_to_bottom(&self) {
            self.writes.set(self.writes.get() + 1);
            let mut m = self.metrics.borrow_mut();
            m.scroll_top = m.max_scroll_top();
        }
        fn set_affordance_suppressed(&self, _suppressed: bool) {}
        fn is_live(&self) -> bool {
            true
        }
    }

    fn feed(scroll_top: f64) -> ControlledFeed<Stub> {
        let stub = Stub::default();
        *stub.metrics.borrow_mut() = ScrollMetrics::new(scroll_top, 5000.0, 400.0);
        ControlledFeed::new(stub, PinConfig::default())
    }

    #[test]
    fn initial_state_follows_position() {
        assert!(feed(4600.0).is_pinned());
        assert!(feed(4600.0).is_enforcement_scheduled());
        assert!(!feed(0.0).is_pinned());
        assert!(!feed(0.0).is_enforcement_scheduled());
    }

    #[test]
    fn bootstrap_fires_once() {
        let mut f = feed(0.0);
        assert!(f.on_bootstrap());
        assert!(f.is_pinned());
        f.set_enabled(false, 0.0);
        f.set_enabled(true, 0.0);
        assert!(!f.on_bootstrap());
    }

    #[test]
    fn bootstrap_skipped_after_any_input() {
        let mut f = feed(0.0);
        f.on_input(InputKind::KeyDown, 10.0);
        assert!(!f.on_bootstrap());
        assert!(!f.is_pinned());
    }

    #[test]
    fn disable_cancels_pending_enforcement() {
        let mut f = feed(4600.0);
        assert!(f.is_enforcement_scheduled());
        assert!(!f.set_enabled(false, 0.0));
        assert!(!f.is_pinned());
        assert!(!f.is_enforcement_scheduled());
        f.on_frame();
        f.on_frame();
        assert_eq!(f.surface().writes.get(), 0);
    }

    #[test]
    fn resume_marks_interaction() {
        let mut f = feed(0.0);
        assert!(f.resume(42.0));
        assert!(f.has_user_interacted());
        assert_eq!(f.last_intent_ms(), Some(42.0));
    }

    #[test]
    fn teardown_runs_each_handler_once() {
        let counter = Rc::new(Cell::new(0));
        let mut f = feed(0.0);
        for _ in 0..3 {
            let counter = Rc::clone(&counter);
            f.on_teardown(move || counter.set(counter.get() + 1));
        }
        assert_eq!(f.teardown_len(), 3);
        assert_eq!(f.teardown(), 3);
        assert_eq!(f.teardown(), 0);
        assert_eq!(counter.get(), 3);
    }
}
