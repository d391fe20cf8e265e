//! Feed discovery contract and the rescan pass built on it.
//!
//! Discovery itself is a plain lookup (selectors in the browser runtime);
//! [`rescan`] turns one lookup into attach/detach decisions against a
//! [`FeedRegistry`].

use crate::error::{FeedpinError, Result};
use crate::registry::{Attach, FeedHandle, FeedRegistry};
use crate::surface::ScrollSurface;

/// Locates feed containers and their parts in the host page.
pub trait Discovery {
    /// Reference to a container or sub-element.
    type Node: Clone;

    fn find_scrollable_feeds(&self) -> Vec<Self::Node>;
    fn find_content_root(&self, container: &Self::Node) -> Option<Self::Node>;
    fn find_resume_affordance(&self, container: &Self::Node) -> Option<Self::Node>;
}

/// Outcome of one rescan pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RescanReport {
    /// Newly attached feeds; their listeners still need wiring.
    pub attached: Vec<FeedHandle>,
    /// Feeds detached because their container left the page.
    pub detached: Vec<FeedHandle>,
    /// Containers skipped this pass (missing content root and similar).
    pub skipped: usize,
}

/// Reconcile `registry` with what `discovery` currently sees.
///
/// Stale feeds are detached first. Each discovered container that is not yet
/// controlled (`S == Node` identifies the container a surface wraps) is
/// turned into a surface by `build`; a build error skips the container until
/// the next pass.
pub fn rescan<D, S, F>(registry: &mut FeedRegistry<S>, discovery: &D, mut build: F) -> RescanReport
where
    D: Discovery,
    S: ScrollSurface + PartialEq<D::Node>,
    F: FnMut(&D, D::Node) -> Result<S>,
{
    let mut report = RescanReport {
        detached: registry.detach_stale(),
        ..RescanReport::default()
    };
    for node in discovery.find_scrollable_feeds() {
        if registry.find_by(|surface| *surface == node).is_some() {
            continue;
        }
        match build(discovery, node) {
            Ok(surface) => {
                if let Attach::New(handle) = registry.attach(surface) {
                    report.attached.push(handle);
                }
            }
            Err(FeedpinError::MissingContentRoot) => {
                log::trace!("feed container without content root, retrying next scan");
                report.skipped += 1;
            }
            Err(err) => {
                log::warn!("skipping feed container: {err}");
                report.skipped += 1;
            }
        }
    }
    report
}
