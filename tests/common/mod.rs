//! Common test utilities: an in-memory scroll container.
//!
//! `FakeFeed` is cheap to clone; clones share one container, so a test can
//! keep a handle to mutate content while the controller owns another.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic
)]

use std::cell::RefCell;
use std::rc::Rc;

use feedpin::{PinConfig, ScrollMetrics, ScrollSurface};

#[derive(Debug)]
pub struct FakeState {
    pub id: u32,
    pub metrics: ScrollMetrics,
    pub writes: u32,
    pub affordance_suppressed: bool,
    pub live: bool,
    /// Content appended right after the next write (reflow racing the write).
    pub grow_after_write: f64,
}

#[derive(Debug, Clone)]
pub struct FakeFeed(pub Rc<RefCell<FakeState>>);

impl FakeFeed {
    pub fn new(id: u32, scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self(Rc::new(RefCell::new(FakeState {
            id,
            metrics: ScrollMetrics::new(scroll_top, scroll_height, client_height),
            writes: 0,
            affordance_suppressed: false,
            live: true,
            grow_after_write: 0.0,
        })))
    }

    /// A 5000px feed in a 400px viewport, scrolled to the bottom.
    pub fn at_bottom(id: u32) -> Self {
        Self::new(id, 4600.0, 5000.0, 400.0)
    }

    /// A 5000px feed in a 400px viewport, stuck at the top.
    pub fn at_top(id: u32) -> Self {
        Self::new(id, 0.0, 5000.0, 400.0)
    }

    pub fn writes(&self) -> u32 {
        self.0.borrow().writes
    }

    pub fn distance(&self) -> f64 {
        self.0.borrow().metrics.distance_from_bottom()
    }

    pub fn suppressed(&self) -> bool {
        self.0.borrow().affordance_suppressed
    }

    /// New messages arrive below the viewport.
    pub fn append(&self, px: f64) {
        self.0.borrow_mut().metrics.scroll_height += px;
    }

    /// The user (or host) moves the viewport.
    pub fn scroll_to(&self, scroll_top: f64) {
        let mut state = self.0.borrow_mut();
        let max = state.metrics.max_scroll_top();
        state.metrics.scroll_top = scroll_top.clamp(0.0, max);
    }

    pub fn grow_after_next_write(&self, px: f64) {
        self.0.borrow_mut().grow_after_write = px;
    }

    pub fn remove_from_page(&self) {
        self.0.borrow_mut().live = false;
    }
}

impl PartialEq for FakeFeed {
    fn eq(&self, other: &Self) -> bool {
        self.0.borrow().id == other.0.borrow().id
    }
}

impl PartialEq<u32> for FakeFeed {
    fn eq(&self, other: &u32) -> bool {
        self.0.borrow().id == *other
    }
}

impl ScrollSurface for FakeFeed {
    fn metrics(&self) -> ScrollMetrics {
        self.0.borrow().metrics
    }

    fn scroll_to_bottom(&self) {
        let mut state = self.0.borrow_mut();
        state.writes += 1;
        state.metrics.scroll_top = state.metrics.max_scroll_top();
        let grow = std::mem::take(&mut state.grow_after_write);
        state.metrics.scroll_height += grow;
    }

    fn set_affordance_suppressed(&self, suppressed: bool) {
        self.0.borrow_mut().affordance_suppressed = suppressed;
    }

    fn is_live(&self) -> bool {
        self.0.borrow().live
    }
}

pub fn config() -> PinConfig {
    PinConfig::default()
}

/// Run frame callbacks until nothing is pending (bounded).
pub fn settle(feed: &mut feedpin::ControlledFeed<FakeFeed>) -> u32 {
    let mut frames = 0;
    while feed.needs_frame() && frames < 16 {
        feed.on_frame();
        frames += 1;
    }
    frames
}
