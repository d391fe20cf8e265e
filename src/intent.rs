//! Recency tracking for explicit user input.
//!
//! Raw scroll events cannot tell a user drag from a programmatic or
//! content-driven move. Any input-type signal marks the start of a short
//! window during which scroll positions are attributed to the user.

/// Input signals treated as "the user is about to scroll, or just did".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Wheel,
    TouchStart,
    PointerDown,
    KeyDown,
}

impl InputKind {
    /// All kinds, in listener registration order.
    pub const ALL: [InputKind; 4] = [
        InputKind::Wheel,
        InputKind::TouchStart,
        InputKind::PointerDown,
        InputKind::KeyDown,
    ];

    /// DOM event type that carries this signal.
    #[must_use]
    pub fn event_type(self) -> &'static str {
        match self {
            InputKind::Wheel => "wheel",
            InputKind::TouchStart => "touchstart",
            InputKind::PointerDown => "pointerdown",
            InputKind::KeyDown => "keydown",
        }
    }

    /// Inverse of [`Self::event_type`].
    #[must_use]
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.event_type() == event_type)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntentTracker {
    has_user_interacted: bool,
    last_intent_ms: Option<f64>,
}

impl IntentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw input signal at `now_ms`.
    pub fn mark(&mut self, now_ms: f64) {
        self.has_user_interacted = true;
        self.last_intent_ms = Some(now_ms);
    }

    /// Sticky: once set it stays set for the life of the feed.
    #[must_use]
    pub fn has_user_interacted(&self) -> bool {
        self.has_user_interacted
    }

    #[must_use]
    pub fn last_intent_ms(&self) -> Option<f64> {
        self.last_intent_ms
    }

    #[must_use]
    pub fn is_within_window(&self, now_ms: f64, window_ms: f64) -> bool {
        self.last_intent_ms
            .is_some_and(|last| now_ms - last <= window_ms)
    }
}
