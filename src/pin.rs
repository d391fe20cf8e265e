//! Pin state machine.
//!
//! Decides, for each scroll event, whether the feed keeps following its
//! bottom edge. The functions here are pure: they take the current state and
//! the measured facts and return the next state plus whether enforcement
//! should be requested. [`crate::feed::ControlledFeed`] applies the result.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinState {
    /// Every relevant signal forces the feed to its bottom.
    #[default]
    Pinned,
    /// The user is reading history; leave the position alone.
    Unpinned,
}

impl PinState {
    #[must_use]
    pub fn is_pinned(self) -> bool {
        matches!(self, PinState::Pinned)
    }

    #[must_use]
    pub fn from_pinned(pinned: bool) -> Self {
        if pinned {
            PinState::Pinned
        } else {
            PinState::Unpinned
        }
    }

    /// State for a freshly attached feed.
    #[must_use]
    pub fn initial(near_bottom: bool) -> Self {
        Self::from_pinned(near_bottom)
    }
}

/// Facts measured at a scroll event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollFacts {
    /// A raw input signal happened within the intent window.
    pub within_intent: bool,
    pub near_bottom: bool,
    pub at_bottom: bool,
    /// Automatic transitions to `Pinned` are allowed (user preference).
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: PinState,
    pub enforce: bool,
}

/// Apply the scroll-event rules to `current`.
#[must_use]
pub fn on_scroll(current: PinState, facts: ScrollFacts) -> Transition {
    if facts.within_intent {
        // The user is actively scrolling: trust the literal position.
        let next = PinState::from_pinned(facts.near_bottom && facts.enabled);
        return Transition {
            next,
            enforce: false,
        };
    }
    match current {
        // Host reflow is never a decision to stop following.
        PinState::Pinned => Transition {
            next: PinState::Pinned,
            enforce: !facts.at_bottom,
        },
        PinState::Unpinned if facts.near_bottom && facts.enabled => Transition {
            next: PinState::Pinned,
            enforce: false,
        },
        PinState::Unpinned => Transition {
            next: PinState::Unpinned,
            enforce: false,
        },
    }
}

/// Whether the one-shot bootstrap check should force `Pinned`.
#[must_use]
pub fn bootstrap_should_pin(has_user_interacted: bool, near_top: bool, enabled: bool) -> bool {
    enabled && !has_user_interacted && near_top
}
