//! Footer toggle button reflecting the on/off preference.

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use crate::config::HostConfig;

pub(crate) const TOGGLE_CLASS: &str = "feedpin-toggle";

/// Find or create the toggle inside `controls`. Returns the button and
/// whether it was created by this call.
pub(crate) fn ensure(document: &Document, controls: &HtmlElement) -> Option<(HtmlElement, bool)> {
    let selector = format!(".{TOGGLE_CLASS}");
    if let Some(existing) = controls
        .query_selector(&selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        return Some((existing, false));
    }

    let button = document
        .create_element("button")
        .ok()?
        .dyn_into::<HtmlElement>()
        .ok()?;
    let _ = button.set_attribute("type", "button");
    button.set_class_name(TOGGLE_CLASS);

    let style = button.style();
    let _ = style.set_property("display", "inline-flex");
    let _ = style.set_property("align-items", "center");
    let _ = style.set_property("gap", "0.35rem");
    let _ = style.set_property("padding", "0.35rem 0.5rem");
    let _ = style.set_property("border-radius", "0.5rem");
    let _ = style.set_property("color", "inherit");
    let _ = style.set_property("cursor", "pointer");
    let _ = style.set_property("font-size", "11px");
    let _ = style.set_property("line-height", "1");
    let _ = style.set_property("white-space", "nowrap");

    controls.append_child(&button).ok()?;
    Some((button, true))
}

/// Sync label, ARIA state and colors with `enabled`.
pub(crate) fn update(button: &HtmlElement, enabled: bool, host: &HostConfig) {
    let label = if enabled {
        &host.toggle_label_on
    } else {
        &host.toggle_label_off
    };
    button.set_text_content(Some(label));
    let _ = button.set_attribute("data-enabled", if enabled { "1" } else { "0" });
    let _ = button.set_attribute("aria-pressed", if enabled { "true" } else { "false" });
    let _ = button.set_attribute("aria-label", label);
    button.set_title(label);

    let style = button.style();
    if enabled {
        let _ = style.set_property("background", "rgba(74, 234, 128, 0.16)");
        let _ = style.set_property("border", "1px solid rgba(74, 234, 128, 0.45)");
        let _ = style.set_property("opacity", "1");
    } else {
        let _ = style.set_property("background", "rgba(255, 255, 255, 0.06)");
        let _ = style.set_property("border", "1px solid rgba(255, 255, 255, 0.18)");
        let _ = style.set_property("opacity", "0.75");
    }
}

/// Sync every toggle in the document.
pub(crate) fn update_all(document: &Document, enabled: bool, host: &HostConfig) {
    let Ok(nodes) = document.query_selector_all(&format!(".{TOGGLE_CLASS}")) else {
        return;
    };
    for button in (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
    {
        update(&button, enabled, host);
    }
}

/// Remove a toggle this crate created.
pub(crate) fn remove(button: &HtmlElement) {
    if let Some(parent) = button.parent_node() {
        let _ = parent.remove_child(button);
    }
}
