//! Behavioral tests for the sticky-bottom controller.
//!
//! Drives a `ControlledFeed` over an in-memory container with explicit
//! timestamps and frame ticks.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::{config, settle, FakeFeed};
use feedpin::enforce::{EnforcePhase, WriteOutcome};
use feedpin::intent::InputKind;
use feedpin::{ControlledFeed, ScrollMetrics};
use test_case::test_case;

fn attach(surface: &FakeFeed) -> ControlledFeed<FakeFeed> {
    ControlledFeed::new(surface.clone(), config())
}

// =============================================================================
// DISTANCE / THRESHOLD
// =============================================================================

#[test_case(398.0, false ; "distance 202 is not near bottom")]
#[test_case(400.0, true ; "distance 200 is near bottom")]
fn test_threshold_boundary(scroll_top: f64, expected: bool) {
    let metrics = ScrollMetrics::new(scroll_top, 1000.0, 400.0);
    assert_eq!(metrics.is_near_bottom(200.0), expected);

    let surface = FakeFeed::new(1, scroll_top, 1000.0, 400.0);
    let feed = attach(&surface);
    assert_eq!(
        feed.is_pinned(),
        expected,
        "initial pin state should follow the threshold"
    );
}

// =============================================================================
// PIN STABILITY UNDER DRIFT
// =============================================================================

#[test]
fn test_pinned_feed_follows_new_content() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);

    for _ in 0..10 {
        surface.append(300.0);
        assert!(feed.on_content_changed(), "pinned feed should request a frame");
        let frames = settle(&mut feed);
        assert!(frames <= 3, "settle took {frames} frames");
        assert!(feed.is_pinned());
        assert_eq!(surface.distance(), 0.0);
    }
}

#[test]
fn test_host_nudge_without_input_keeps_pin() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);

    // Host reflow jumps the view far up, no user input involved.
    surface.scroll_to(1000.0);
    assert!(feed.on_scroll(5_000.0), "drift should request enforcement");
    assert!(feed.is_pinned(), "host reflow must not unpin");
    settle(&mut feed);
    assert_eq!(surface.distance(), 0.0);
}

#[test]
fn test_content_burst_coalesces_into_one_write() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);
    let before = surface.writes();

    assert!(feed.on_content_changed());
    for _ in 0..20 {
        surface.append(40.0);
        assert!(!feed.on_content_changed(), "already scheduled");
    }
    settle(&mut feed);
    assert_eq!(surface.writes() - before, 1);
    assert_eq!(surface.distance(), 0.0);
}

#[test]
fn test_write_happens_on_second_frame() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);
    let before = surface.writes();

    surface.append(500.0);
    feed.on_content_changed();
    assert_eq!(feed.enforcement_phase(), EnforcePhase::AwaitFirstFrame);
    feed.on_frame();
    assert_eq!(surface.writes(), before, "no write on the first frame");
    feed.on_frame();
    assert_eq!(surface.writes(), before + 1);
    assert!(surface.suppressed(), "host affordance hidden while pinned");
}

#[test]
fn test_growth_during_write_gets_one_correction() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);
    let before = surface.writes();

    surface.append(200.0);
    surface.grow_after_next_write(800.0);
    feed.on_content_changed();
    feed.on_frame();
    feed.on_frame();
    assert_eq!(feed.enforcement_phase(), EnforcePhase::Correcting);
    feed.on_frame();
    assert_eq!(feed.enforcement_phase(), EnforcePhase::Idle);
    assert_eq!(surface.writes() - before, 2);
    assert_eq!(surface.distance(), 0.0);
}

// =============================================================================
// USER OVERRIDE
// =============================================================================

#[test]
fn test_user_scroll_away_unpins() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);

    feed.on_input(InputKind::Wheel, 1_000.0);
    surface.scroll_to(2_000.0);
    assert!(!feed.on_scroll(1_100.0));
    assert!(!feed.is_pinned());

    // New content no longer moves the view.
    let before = surface.writes();
    surface.append(600.0);
    assert!(!feed.on_content_changed());
    settle(&mut feed);
    assert_eq!(surface.writes(), before);
    assert_eq!(surface.0.borrow().metrics.scroll_top, 2_000.0);
}

#[test_case(InputKind::Wheel ; "wheel")]
#[test_case(InputKind::TouchStart ; "touch")]
#[test_case(InputKind::PointerDown ; "pointer")]
#[test_case(InputKind::KeyDown ; "key")]
fn test_every_input_kind_opens_the_window(kind: InputKind) {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    feed.on_input(kind, 0.0);
    surface.scroll_to(100.0);
    feed.on_scroll(1_200.0);
    assert!(!feed.is_pinned(), "{kind:?} should count as user intent");
}

#[test]
fn test_user_override_applies_from_unpinned_state_too() {
    let surface = FakeFeed::at_top(1);
    let mut feed = attach(&surface);
    assert!(!feed.is_pinned());
    feed.on_input(InputKind::TouchStart, 0.0);
    surface.scroll_to(1_500.0);
    feed.on_scroll(10.0);
    assert!(!feed.is_pinned());
}

#[test]
fn test_user_scrolling_back_down_repins() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    feed.on_input(InputKind::Wheel, 0.0);
    surface.scroll_to(1_000.0);
    feed.on_scroll(50.0);
    assert!(!feed.is_pinned());

    feed.on_input(InputKind::Wheel, 3_000.0);
    surface.scroll_to(4_450.0);
    feed.on_scroll(3_050.0);
    assert!(feed.is_pinned(), "within 200px of the bottom pins again");
}

#[test]
fn test_scroll_after_intent_window_is_treated_as_drift() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);
    feed.on_input(InputKind::KeyDown, 0.0);
    surface.scroll_to(100.0);
    assert!(feed.on_scroll(1_201.0));
    assert!(feed.is_pinned());
}

#[test]
fn test_unpinned_feed_returned_to_bottom_externally_resumes() {
    let surface = FakeFeed::at_top(1);
    let mut feed = attach(&surface);
    feed.on_input(InputKind::Wheel, 0.0);
    assert!(!feed.is_pinned());

    // The host's own logic jumps to the latest message.
    surface.scroll_to(4_600.0);
    feed.on_scroll(10_000.0);
    assert!(feed.is_pinned());
}

// =============================================================================
// RESUME
// =============================================================================

#[test]
fn test_resume_converges_to_bottom() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);
    feed.on_input(InputKind::Wheel, 0.0);
    surface.scroll_to(0.0);
    feed.on_scroll(10.0);
    assert!(!feed.is_pinned());

    surface.append(1_000.0);
    surface.grow_after_next_write(700.0);
    assert!(feed.resume(20_000.0));
    assert!(feed.is_pinned());
    assert!(feed.has_user_interacted());
    assert_eq!(feed.last_intent_ms(), Some(20_000.0));
    settle(&mut feed);
    assert_eq!(surface.distance(), 0.0);
}

#[test]
fn test_resume_while_pinned_is_harmless() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    feed.resume(0.0);
    settle(&mut feed);
    assert!(feed.is_pinned());
    assert_eq!(surface.distance(), 0.0);
}

// =============================================================================
// BOOTSTRAP CORRECTION
// =============================================================================

#[test]
fn test_bootstrap_pins_feed_stuck_at_top() {
    let surface = FakeFeed::new(1, 0.0, 5000.0, 400.0);
    let mut feed = attach(&surface);
    assert!(!feed.is_pinned());
    assert_eq!(surface.writes(), 0);

    // 600ms later, still no input.
    assert!(feed.on_bootstrap());
    assert!(feed.is_pinned());
    settle(&mut feed);
    assert!(surface.writes() >= 1);
    assert_eq!(surface.distance(), 0.0);
}

#[test]
fn test_bootstrap_never_fires_after_input() {
    let surface = FakeFeed::at_top(1);
    let mut feed = attach(&surface);
    feed.on_input(InputKind::PointerDown, 100.0);
    assert!(!feed.on_bootstrap());
    settle(&mut feed);
    assert!(!feed.is_pinned());
    assert_eq!(surface.writes(), 0);
}

#[test]
fn test_bootstrap_leaves_scrolled_feed_alone() {
    let surface = FakeFeed::new(1, 2_000.0, 5000.0, 400.0);
    let mut feed = attach(&surface);
    assert!(!feed.on_bootstrap());
    assert!(!feed.is_pinned());
}

// =============================================================================
// PERIODIC RE-ASSERTION
// =============================================================================

#[test]
fn test_tick_repairs_silent_reset() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);

    // Host resets the position without any observable event.
    surface.scroll_to(0.0);
    assert_eq!(feed.on_tick(), WriteOutcome::Settled);
    assert_eq!(surface.distance(), 0.0);
}

#[test]
fn test_tick_is_quiet_near_bottom() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);
    let before = surface.writes();
    surface.append(150.0);
    assert_eq!(feed.on_tick(), WriteOutcome::Skipped);
    assert_eq!(surface.writes(), before);
}

#[test]
fn test_tick_restores_affordance_when_unpinned() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);
    assert!(surface.suppressed());

    feed.on_input(InputKind::Wheel, 0.0);
    surface.scroll_to(0.0);
    feed.on_scroll(10.0);
    feed.on_tick();
    assert!(!surface.suppressed(), "host affordance visible while reading history");
}

// =============================================================================
// PREFERENCE
// =============================================================================

#[test]
fn test_disable_stops_following() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    settle(&mut feed);
    let before = surface.writes();

    assert!(!feed.set_enabled(false, 0.0));
    assert!(!feed.is_pinned());
    surface.append(900.0);
    assert!(!feed.on_content_changed());
    feed.on_tick();
    assert!(!feed.on_bootstrap());
    // Even landing on the bottom does not resume while disabled.
    surface.scroll_to(f64::MAX);
    feed.on_scroll(10_000.0);
    assert!(!feed.is_pinned());
    assert_eq!(surface.writes(), before);
}

#[test]
fn test_enable_behaves_like_resume() {
    let surface = FakeFeed::at_top(1);
    let mut feed = attach(&surface);
    feed.set_enabled(false, 0.0);
    assert!(feed.set_enabled(true, 50.0));
    assert!(feed.is_pinned());
    assert!(feed.has_user_interacted());
    settle(&mut feed);
    assert_eq!(surface.distance(), 0.0);
}

// =============================================================================
// STALE REFERENCES
// =============================================================================

#[test]
fn test_detached_container_ignores_everything() {
    let surface = FakeFeed::at_bottom(1);
    let mut feed = attach(&surface);
    assert!(feed.needs_frame());
    surface.remove_from_page();

    assert_eq!(feed.on_frame(), feedpin::enforce::FrameStep::Idle);
    assert!(!feed.needs_frame());
    assert!(!feed.on_scroll(0.0));
    assert!(!feed.on_content_changed());
    assert!(!feed.resume(0.0));
    assert_eq!(feed.on_tick(), WriteOutcome::Skipped);
    assert!(!feed.on_bootstrap());
    assert_eq!(surface.writes(), 0);
}
