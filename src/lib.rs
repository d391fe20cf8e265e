//! feedpin - sticky-bottom scrolling for live chat feeds
//!
//! Keeps a host page's message feed pinned to its bottom edge while the
//! viewer follows along, and lets go the moment they scroll back to read:
//! - Pin state machine that tells user scrolling apart from host reflow
//! - Two-frame settle-and-verify enforcement with one corrective write
//! - Low-frequency fallback re-assertion against silent host resets
//! - Idempotent attach/detach for feeds that mount and unmount at will
//!
//! The core (`distance` through `registry`) is plain Rust driven by explicit
//! timestamps and frame ticks. The `web` module (wasm32 only) wires it to the
//! DOM.
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { FeedPin } from 'feedpin';
//! await init();
//! const pin = new FeedPin({ bottomThresholdPx: 150 });
//! pin.setEnabled(false);
//! ```

// Core controller
pub mod config;
pub mod discovery;
pub mod distance;
pub mod enforce;
pub mod error;
pub mod feed;
pub mod intent;
pub mod pin;
pub mod preference;
pub mod registry;
pub mod surface;

// Browser runtime
#[cfg(target_arch = "wasm32")]
pub mod web;

use wasm_bindgen::prelude::*;

pub use config::{Config, HostConfig, PinConfig};
pub use distance::ScrollMetrics;
pub use error::{FeedpinError, Result};
pub use feed::ControlledFeed;
pub use registry::{Attach, FeedHandle, FeedRegistry};
pub use surface::ScrollSurface;

#[cfg(target_arch = "wasm32")]
pub use web::FeedPin;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
