//! Browser runtime (wasm32 only).
//!
//! Implements the host-page collaborators around the core controller:
//! - [`DomSurface`]: the live scroll container
//! - [`SelectorDiscovery`]: CSS-selector feed lookup
//! - [`LocalStorage`]: the persisted on/off preference
//! - the footer toggle button
//! - [`FeedPin`]: the `wasm-bindgen` entry point that owns the registry,
//!   the rescan loop, and every DOM subscription

mod discovery;
mod dom;
mod runtime;
mod storage;
mod toggle;

pub use discovery::SelectorDiscovery;
pub use dom::DomSurface;
pub use runtime::FeedPin;
pub use storage::LocalStorage;

/// Milliseconds on the page's monotonic clock.
pub(crate) fn now_ms() -> f64 {
    if let Some(window) = web_sys::window() {
        if let Some(perf) = window.performance() {
            return perf.now();
        }
    }
    js_sys::Date::now()
}
