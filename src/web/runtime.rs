//! `FeedPin`: wires DOM signals into the feed registry.
//!
//! All state sits behind one `Rc<RefCell<SharedState>>`. Closures owned by a
//! feed's teardown handlers only hold a `Weak` to it, so the registry never
//! keeps itself alive. Feeds are detached only from runtime-level callbacks
//! (rescan, shutdown), never from inside a closure the detach would drop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Once;

use log::LevelFilter;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Element, Event, EventTarget, HtmlElement, MutationObserver,
    MutationObserverInit, Node, ResizeObserver, Window,
};

use super::discovery::SelectorDiscovery;
use super::dom::{self, DomSurface};
use super::storage::LocalStorage;
use super::{now_ms, toggle};
use crate::config::{Config, PinConfig};
use crate::discovery::{self, Discovery};
use crate::error::{FeedpinError, Result};
use crate::feed::TeardownHandler;
use crate::intent::InputKind;
use crate::preference::Preference;
use crate::registry::{FeedHandle, FeedRegistry};

pub(crate) struct SharedState {
    registry: FeedRegistry<DomSurface>,
    discovery: SelectorDiscovery,
    preference: Preference<LocalStorage>,
    config: PinConfig,
    frame_request: Option<i32>,
    frame_closure: Option<Closure<dyn FnMut()>>,
    rescan_timer: Option<i32>,
    rescan_closure: Option<Closure<dyn FnMut()>>,
    loop_teardown: Vec<TeardownHandler>,
    toggles: Vec<OwnedToggle>,
}

/// A toggle button this runtime created, with its click listener.
struct OwnedToggle {
    button: HtmlElement,
    teardown: TeardownHandler,
}

type Shared = Rc<RefCell<SharedState>>;

impl SharedState {
    fn toggle_preference(&mut self) -> bool {
        let enabled = self.preference.toggle();
        log::info!("auto-scroll {}", if enabled { "enabled" } else { "disabled" });
        toggle::update_all(self.discovery.document(), enabled, self.discovery.host());
        self.registry.set_enabled_all(enabled, now_ms())
    }

    fn set_preference(&mut self, enabled: bool) -> bool {
        if let Err(err) = self.preference.set(enabled) {
            log::warn!("could not persist preference: {err}");
        }
        toggle::update_all(self.discovery.document(), enabled, self.discovery.host());
        self.registry.set_enabled_all(enabled, now_ms())
    }
}

/// The auto-scroll controller for every feed on the page.
#[wasm_bindgen]
pub struct FeedPin {
    state: Shared,
}

fn parse_config(value: JsValue) -> Result<Config> {
    let config: Config = if value.is_undefined() || value.is_null() {
        Config::default()
    } else {
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| FeedpinError::InvalidConfig(e.to_string()))?
    };
    config.validate()?;
    Ok(config)
}

static LOGGER: Once = Once::new();

/// Route `log` records to the browser console. The first boot in a page
/// installs the logger; later boots only adjust the max level.
fn init_logging(filter: LevelFilter) {
    LOGGER.call_once(|| {
        let level = filter.to_level().unwrap_or(log::Level::Error);
        wasm_logger::init(wasm_logger::Config::new(level).module_prefix("feedpin"));
    });
    log::set_max_level(filter);
}

fn millis(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}

// ============================================================================
// Subscription helpers. Each returns the handler that undoes it, or `None`
// when the host refused (logged, not fatal).
// ============================================================================

fn listen(
    target: &EventTarget,
    event_type: &'static str,
    capture: bool,
    handler: impl FnMut(Event) + 'static,
) -> Option<TeardownHandler> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    let options = AddEventListenerOptions::new();
    options.set_passive(true);
    options.set_capture(capture);
    if let Err(err) = target.add_event_listener_with_callback_and_add_event_listener_options(
        event_type,
        closure.as_ref().unchecked_ref(),
        &options,
    ) {
        log::warn!("{}", FeedpinError::host(event_type, &err));
        return None;
    }
    let target = target.clone();
    Some(Box::new(move || {
        let _ = target.remove_event_listener_with_callback_and_bool(
            event_type,
            closure.as_ref().unchecked_ref(),
            capture,
        );
        drop(closure);
    }))
}

fn every(window: &Window, period_ms: u32, handler: impl FnMut() + 'static) -> Option<TeardownHandler> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    let id = window
        .set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            millis(period_ms),
        )
        .map_err(|err| log::warn!("{}", FeedpinError::host("setInterval", &err)))
        .ok()?;
    let window = window.clone();
    Some(Box::new(move || {
        window.clear_interval_with_handle(id);
        drop(closure);
    }))
}

fn after(window: &Window, delay_ms: u32, handler: impl FnMut() + 'static) -> Option<TeardownHandler> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    let id = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            millis(delay_ms),
        )
        .map_err(|err| log::warn!("{}", FeedpinError::host("setTimeout", &err)))
        .ok()?;
    let window = window.clone();
    Some(Box::new(move || {
        window.clear_timeout_with_handle(id);
        drop(closure);
    }))
}

fn observe_mutations(
    target: &Node,
    character_data: bool,
    handler: impl FnMut() + 'static,
) -> Option<TeardownHandler> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    let observer = MutationObserver::new(closure.as_ref().unchecked_ref())
        .map_err(|err| log::warn!("{}", FeedpinError::host("MutationObserver", &err)))
        .ok()?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    init.set_character_data(character_data);
    observer
        .observe_with_options(target, &init)
        .map_err(|err| log::warn!("{}", FeedpinError::host("MutationObserver.observe", &err)))
        .ok()?;
    Some(Box::new(move || {
        observer.disconnect();
        drop(closure);
    }))
}

/// `None` when the environment has no `ResizeObserver`.
fn observe_resize(targets: &[&Element], handler: impl FnMut() + 'static) -> Option<TeardownHandler> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    let observer = ResizeObserver::new(closure.as_ref().unchecked_ref()).ok()?;
    for target in targets {
        observer.observe(target);
    }
    Some(Box::new(move || {
        observer.disconnect();
        drop(closure);
    }))
}

// ============================================================================
// Frame loop
// ============================================================================

/// Request one shared animation frame if some feed awaits it.
fn ensure_frame(state: &Shared) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let mut s = state.borrow_mut();
    if s.frame_request.is_some() || !s.registry.needs_frame() {
        return;
    }
    if s.frame_closure.is_none() {
        let weak_state = Rc::downgrade(state);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(state) = weak_state.upgrade() {
                handle_frame(&state);
            }
        }) as Box<dyn FnMut()>);
        s.frame_closure = Some(closure);
    }
    let Some(callback) = s.frame_closure.as_ref() else {
        return;
    };
    let requested = window.request_animation_frame(callback.as_ref().unchecked_ref());
    s.frame_request = requested.ok();
}

fn handle_frame(state: &Shared) {
    {
        let mut s = state.borrow_mut();
        s.frame_request = None;
        s.registry.on_frame();
    }
    ensure_frame(state);
}

/// Run `f` against live state, then request a frame if it asks for one.
fn dispatch(weak: &Weak<RefCell<SharedState>>, f: impl FnOnce(&mut SharedState) -> bool) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let Ok(mut s) = state.try_borrow_mut() else {
        log::trace!("state busy, dropping re-entrant callback");
        return;
    };
    let wants_frame = f(&mut s);
    drop(s);
    if wants_frame {
        ensure_frame(&state);
    }
}

// ============================================================================
// Discovery loop
// ============================================================================

fn rescan(state: &Shared) {
    let report = {
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        discovery::rescan(&mut s.registry, &s.discovery, |d, container| {
            d.build_surface(container)
        })
    };
    if !report.detached.is_empty() || !report.attached.is_empty() {
        log::debug!(
            "rescan: {} attached, {} detached, {} skipped",
            report.attached.len(),
            report.detached.len(),
            report.skipped
        );
    }
    for handle in report.attached {
        wire_feed(state, handle);
    }
    sync_toggles(state);
    ensure_frame(state);
}

/// Keep a toggle in the footer of every live feed. The host may re-render
/// its footer while the feed container stays, so this runs on every pass;
/// toggles that left the page are released.
fn sync_toggles(state: &Shared) {
    let (document, host, enabled, footers) = {
        let s = state.borrow();
        let footers: Vec<HtmlElement> = s
            .registry
            .handles()
            .into_iter()
            .filter_map(|handle| s.registry.get(handle))
            .filter_map(|feed| s.discovery.find_controls(feed.surface().container()))
            .collect();
        (
            s.discovery.document().clone(),
            s.discovery.host().clone(),
            s.preference.is_enabled(),
            footers,
        )
    };

    let stale: Vec<OwnedToggle> = {
        let mut s = state.borrow_mut();
        let (live, stale) = std::mem::take(&mut s.toggles)
            .into_iter()
            .partition(|owned| owned.button.is_connected());
        s.toggles = live;
        stale
    };
    for owned in stale {
        (owned.teardown)();
    }

    for footer in footers {
        let Some((button, created)) = toggle::ensure(&document, &footer) else {
            continue;
        };
        if !created {
            continue;
        }
        toggle::update(&button, enabled, &host);
        let weak = Rc::downgrade(state);
        let Some(listener) = listen(&button, "click", false, move |_| {
            dispatch(&weak, SharedState::toggle_preference);
        }) else {
            toggle::remove(&button);
            continue;
        };
        let owned_button = button.clone();
        state.borrow_mut().toggles.push(OwnedToggle {
            button,
            teardown: Box::new(move || {
                listener();
                toggle::remove(&owned_button);
            }),
        });
    }
}

/// Coalesce whole-document mutations into one rescan after the debounce
/// delay. A pending rescan is not pushed back by further mutations, so a
/// busy feed cannot starve discovery.
fn schedule_rescan(state: &Shared) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let mut s = state.borrow_mut();
    if s.rescan_timer.is_some() {
        return;
    }
    if s.rescan_closure.is_none() {
        let weak_state = Rc::downgrade(state);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(state) = weak_state.upgrade() {
                state.borrow_mut().rescan_timer = None;
                rescan(&state);
            }
        }) as Box<dyn FnMut()>);
        s.rescan_closure = Some(closure);
    }
    let Some(callback) = s.rescan_closure.as_ref() else {
        return;
    };
    let scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.as_ref().unchecked_ref(),
        millis(s.config.rescan_debounce_ms),
    );
    s.rescan_timer = scheduled.ok();
}

fn start_discovery_loop(state: &Shared, window: &Window) {
    let mut handlers: Vec<TeardownHandler> = Vec::new();
    let (interval, root) = {
        let s = state.borrow();
        (
            s.config.rescan_interval_ms,
            s.discovery.document().document_element(),
        )
    };
    {
        let weak_state = Rc::downgrade(state);
        handlers.extend(every(window, interval, move || {
            if let Some(state) = weak_state.upgrade() {
                rescan(&state);
            }
        }));
    }
    if let Some(root) = root {
        let weak_state = Rc::downgrade(state);
        handlers.extend(observe_mutations(&root, false, move || {
            if let Some(state) = weak_state.upgrade() {
                schedule_rescan(&state);
            }
        }));
    }
    state.borrow_mut().loop_teardown = handlers;
}

// ============================================================================
// Per-feed wiring
// ============================================================================

fn wire_feed(state: &Shared, handle: FeedHandle) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let (surface, config, enabled) = {
        let s = state.borrow();
        let Some(feed) = s.registry.get(handle) else {
            return;
        };
        (feed.surface().clone(), s.config, s.preference.is_enabled())
    };
    let weak = Rc::downgrade(state);
    let container = surface.container().clone();
    let content = surface.content_root().clone();
    let host_root = surface.affordance_root().clone();
    let mut handlers: Vec<TeardownHandler> = Vec::new();

    {
        let saved_container = dom::disable_scroll_anchoring(&container);
        let saved_content =
            (content != container).then(|| dom::disable_scroll_anchoring(&content));
        let container = container.clone();
        let content = content.clone();
        handlers.push(Box::new(move || {
            dom::restore_scroll_anchoring(&container, &saved_container);
            if let Some(saved) = &saved_content {
                dom::restore_scroll_anchoring(&content, saved);
            }
        }));
    }

    {
        let weak = weak.clone();
        handlers.extend(listen(&container, "scroll", false, move |_| {
            dispatch(&weak, |s| s.registry.on_scroll(handle, now_ms()));
        }));
    }

    for kind in InputKind::ALL {
        // Keys reach the focused element, which may sit outside the list.
        let target: &EventTarget = if kind == InputKind::KeyDown {
            &host_root
        } else {
            &container
        };
        let weak = weak.clone();
        handlers.extend(listen(target, kind.event_type(), false, move |_| {
            dispatch(&weak, |s| {
                s.registry.on_input(handle, kind, now_ms());
                false
            });
        }));
    }

    {
        let weak = weak.clone();
        handlers.extend(observe_mutations(&content, true, move || {
            dispatch(&weak, |s| s.registry.on_content_changed(handle));
        }));
    }

    {
        let weak = weak.clone();
        let targets: [&Element; 2] = [&container, &content];
        match observe_resize(&targets, move || {
            dispatch(&weak, |s| s.registry.on_content_changed(handle));
        }) {
            Some(handler) => handlers.push(handler),
            None => log::warn!("ResizeObserver unavailable, resize re-pinning disabled"),
        }
    }

    {
        // `load` does not bubble; capture it for images and emotes.
        let weak = weak.clone();
        handlers.extend(listen(&content, "load", true, move |_| {
            dispatch(&weak, |s| s.registry.on_content_changed(handle));
        }));
    }

    if surface.resume_selector().is_some() {
        // Captured on the widget root: the host may remove its button in
        // its own click handler.
        let weak = weak.clone();
        let container = container.clone();
        handlers.extend(listen(&host_root, "click", true, move |event: Event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) else {
                return;
            };
            dispatch(&weak, |s| {
                let hit = s
                    .discovery
                    .find_resume_affordance(&container)
                    .is_some_and(|button| button.contains(Some(&target)));
                hit && s.registry.resume(handle, now_ms())
            });
        }));
    }

    {
        let weak = weak.clone();
        handlers.extend(every(&window, config.pinned_enforce_interval_ms, move || {
            dispatch(&weak, |s| {
                s.registry.on_tick(handle);
                false
            });
        }));
    }

    handlers.extend(after(&window, config.bootstrap_delay_ms, move || {
        dispatch(&weak, |s| s.registry.on_bootstrap(handle));
    }));

    let mut s = state.borrow_mut();
    let wants_frame = !enabled && s.registry.set_enabled(handle, false, now_ms());
    let Some(feed) = s.registry.get_mut(handle) else {
        // Detached while wiring; undo right away.
        drop(s);
        for handler in handlers {
            handler();
        }
        return;
    };
    for handler in handlers {
        feed.on_teardown(handler);
    }
    drop(s);
    if wants_frame || enabled {
        ensure_frame(state);
    }
}

// ============================================================================
// JavaScript API
// ============================================================================

#[wasm_bindgen]
impl FeedPin {
    /// Boot the controller: discover feeds now, then keep rescanning.
    ///
    /// `config` is an optional object with camelCase keys; see `Config`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> std::result::Result<FeedPin, JsValue> {
        console_error_panic_hook::set_once();

        let config = parse_config(config)?;
        init_logging(config.host.level_filter());

        let window = web_sys::window().ok_or_else(|| FeedpinError::HostApi("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| FeedpinError::HostApi("no document".into()))?;

        let preference = Preference::load(LocalStorage::new(config.host.storage_key.clone()));
        let state = Rc::new(RefCell::new(SharedState {
            registry: FeedRegistry::new(config.pin),
            discovery: SelectorDiscovery::new(document, config.host),
            preference,
            config: config.pin,
            frame_request: None,
            frame_closure: None,
            rescan_timer: None,
            rescan_closure: None,
            loop_teardown: Vec::new(),
            toggles: Vec::new(),
        }));

        start_discovery_loop(&state, &window);
        rescan(&state);
        log::info!(
            "feedpin {} started ({} feeds)",
            env!("CARGO_PKG_VERSION"),
            state.borrow().registry.len()
        );
        Ok(FeedPin { state })
    }

    /// Run a discovery pass immediately.
    pub fn rescan(&self) {
        rescan(&self.state);
    }

    #[wasm_bindgen(js_name = "feedCount")]
    pub fn feed_count(&self) -> u32 {
        u32::try_from(self.state.borrow().registry.len()).unwrap_or(u32::MAX)
    }

    #[wasm_bindgen(js_name = "pinnedCount")]
    pub fn pinned_count(&self) -> u32 {
        u32::try_from(self.state.borrow().registry.pinned_count()).unwrap_or(u32::MAX)
    }

    #[wasm_bindgen(js_name = "isEnabled")]
    pub fn is_enabled(&self) -> bool {
        self.state.borrow().preference.is_enabled()
    }

    /// Persist the preference and apply it to every feed.
    #[wasm_bindgen(js_name = "setEnabled")]
    pub fn set_enabled(&self, enabled: bool) {
        let wants_frame = self.state.borrow_mut().set_preference(enabled);
        if wants_frame {
            ensure_frame(&self.state);
        }
    }

    /// Detach every feed and stop the discovery loop.
    pub fn shutdown(&self) {
        let Ok(mut s) = self.state.try_borrow_mut() else {
            log::warn!("shutdown requested from inside a callback, ignored");
            return;
        };
        let detached = s.registry.clear();
        for handler in std::mem::take(&mut s.loop_teardown) {
            handler();
        }
        for owned in std::mem::take(&mut s.toggles) {
            (owned.teardown)();
        }
        if let Some(window) = web_sys::window() {
            if let Some(id) = s.frame_request.take() {
                let _ = window.cancel_animation_frame(id);
            }
            if let Some(id) = s.rescan_timer.take() {
                window.clear_timeout_with_handle(id);
            }
        }
        log::info!("feedpin stopped ({detached} feeds detached)");
    }
}

impl Drop for FeedPin {
    fn drop(&mut self) {
        self.shutdown();
    }
}
