//! DOM-backed [`ScrollSurface`].

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement};

use crate::distance::ScrollMetrics;
use crate::surface::ScrollSurface;

/// Fractional `scrollTop` (the `i32` getter rounds on zoomed pages).
fn scroll_top_f64(element: &HtmlElement) -> f64 {
    Reflect::get(element.as_ref(), &JsValue::from_str("scrollTop"))
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or_else(|| f64::from(element.scroll_top()))
}

const OVERFLOW_ANCHOR: &str = "overflow-anchor";

/// Inline `overflow-anchor` declaration as the host page left it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SavedAnchoring {
    value: String,
    priority: String,
}

/// Turn off browser scroll anchoring so layout-driven corrections don't
/// fight the controller. Returns the declaration it replaced.
pub(crate) fn disable_scroll_anchoring(element: &HtmlElement) -> SavedAnchoring {
    let style = element.style();
    let saved = SavedAnchoring {
        value: style.get_property_value(OVERFLOW_ANCHOR).unwrap_or_default(),
        priority: style.get_property_priority(OVERFLOW_ANCHOR),
    };
    let _ = style.set_property_with_priority(OVERFLOW_ANCHOR, "none", "important");
    saved
}

pub(crate) fn restore_scroll_anchoring(element: &HtmlElement, saved: &SavedAnchoring) {
    let style = element.style();
    if saved.value.is_empty() {
        let _ = style.remove_property(OVERFLOW_ANCHOR);
    } else {
        let _ = style.set_property_with_priority(OVERFLOW_ANCHOR, &saved.value, &saved.priority);
    }
}

/// One feed container in the live page.
#[derive(Debug, Clone)]
pub struct DomSurface {
    container: HtmlElement,
    content_root: HtmlElement,
    /// Element the resume affordance is looked up under.
    affordance_root: Element,
    resume_selector: Option<String>,
}

impl DomSurface {
    pub(crate) fn new(
        container: HtmlElement,
        content_root: HtmlElement,
        affordance_root: Element,
        resume_selector: Option<String>,
    ) -> Self {
        Self {
            container,
            content_root,
            affordance_root,
            resume_selector,
        }
    }

    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    pub fn content_root(&self) -> &HtmlElement {
        &self.content_root
    }

    pub(crate) fn affordance_root(&self) -> &Element {
        &self.affordance_root
    }

    pub(crate) fn resume_selector(&self) -> Option<&str> {
        self.resume_selector.as_deref()
    }

    /// The host re-renders its button freely, so it is looked up each time.
    fn affordance(&self) -> Option<HtmlElement> {
        let selector = self.resume_selector.as_deref()?;
        self.affordance_root
            .query_selector(selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }
}

impl PartialEq for DomSurface {
    fn eq(&self, other: &Self) -> bool {
        self.container == other.container
    }
}

impl PartialEq<HtmlElement> for DomSurface {
    fn eq(&self, other: &HtmlElement) -> bool {
        &self.container == other
    }
}

impl ScrollSurface for DomSurface {
    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics::new(
            scroll_top_f64(&self.container),
            f64::from(self.container.scroll_height()),
            f64::from(self.container.client_height()),
        )
    }

    fn scroll_to_bottom(&self) {
        self.container.set_scroll_top(self.container.scroll_height());
    }

    fn set_affordance_suppressed(&self, suppressed: bool) {
        let Some(button) = self.affordance() else {
            return;
        };
        let style = button.style();
        if suppressed {
            let _ = style.set_property_with_priority("display", "none", "important");
        } else {
            let _ = style.remove_property("display");
        }
    }

    fn is_live(&self) -> bool {
        self.container.is_connected()
    }
}
