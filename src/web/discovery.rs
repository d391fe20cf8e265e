//! Selector-based feed discovery.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use super::dom::DomSurface;
use crate::config::HostConfig;
use crate::discovery::Discovery;
use crate::error::{FeedpinError, Result};

pub struct SelectorDiscovery {
    document: Document,
    host: HostConfig,
}

impl SelectorDiscovery {
    pub fn new(document: Document, host: HostConfig) -> Self {
        Self { document, host }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn host(&self) -> &HostConfig {
        &self.host
    }

    /// The widget element enclosing `container`, used for affordances that
    /// sit outside the scrollable region.
    pub fn host_root(&self, container: &HtmlElement) -> Element {
        self.host
            .root_selector
            .as_deref()
            .and_then(|selector| container.closest(selector).ok().flatten())
            .or_else(|| container.parent_element())
            .unwrap_or_else(|| container.clone().into())
    }

    /// Footer the toggle button lives in.
    pub fn find_controls(&self, container: &HtmlElement) -> Option<HtmlElement> {
        let selector = self.host.controls_selector.as_deref()?;
        query_html(&self.host_root(container), selector)
    }

    /// Wrap a discovered container for the controller.
    ///
    /// # Errors
    /// Returns [`FeedpinError::MissingContentRoot`] when the content selector
    /// matches nothing yet (lazy mount); the next scan retries.
    pub fn build_surface(&self, container: HtmlElement) -> Result<DomSurface> {
        let content_root = self
            .find_content_root(&container)
            .ok_or(FeedpinError::MissingContentRoot)?;
        let affordance_root = self.host_root(&container);
        Ok(DomSurface::new(
            container,
            content_root,
            affordance_root,
            self.host.resume_selector.clone(),
        ))
    }
}

fn query_html(root: &Element, selector: &str) -> Option<HtmlElement> {
    root.query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

impl Discovery for SelectorDiscovery {
    type Node = HtmlElement;

    fn find_scrollable_feeds(&self) -> Vec<HtmlElement> {
        let Ok(nodes) = self.document.query_selector_all(&self.host.feed_selector) else {
            log::warn!("invalid feed selector: {}", self.host.feed_selector);
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|i| nodes.get(i))
            .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
            .collect()
    }

    fn find_content_root(&self, container: &HtmlElement) -> Option<HtmlElement> {
        match self.host.content_selector.as_deref() {
            Some(selector) => query_html(container, selector),
            None => Some(container.clone()),
        }
    }

    fn find_resume_affordance(&self, container: &HtmlElement) -> Option<HtmlElement> {
        let selector = self.host.resume_selector.as_deref()?;
        query_html(&self.host_root(container), selector)
    }
}
