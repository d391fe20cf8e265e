//! Instance-owning registry of controlled feeds.
//!
//! Feeds live in an arena of slots addressed by a generation-checked
//! [`FeedHandle`]. A handle kept by a deferred callback resolves to nothing
//! once its feed was detached, even if the slot has since been reused.

use crate::config::PinConfig;
use crate::enforce::{FrameStep, WriteOutcome};
use crate::feed::ControlledFeed;
use crate::intent::InputKind;
use crate::surface::ScrollSurface;

/// Stable identifier of one attached feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedHandle {
    index: u32,
    generation: u32,
}

impl FeedHandle {
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }
}

/// Result of [`FeedRegistry::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attach {
    /// A new feed was created; the caller wires its listeners.
    New(FeedHandle),
    /// The container was already controlled; nothing changed.
    Existing(FeedHandle),
}

impl Attach {
    #[must_use]
    pub fn handle(self) -> FeedHandle {
        match self {
            Attach::New(handle) | Attach::Existing(handle) => handle,
        }
    }

    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, Attach::New(_))
    }
}

struct Slot<S> {
    generation: u32,
    feed: Option<ControlledFeed<S>>,
}

pub struct FeedRegistry<S> {
    config: PinConfig,
    slots: Vec<Slot<S>>,
    free: Vec<u32>,
}

impl<S: ScrollSurface> FeedRegistry<S> {
    pub fn new(config: PinConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn config(&self) -> &PinConfig {
        &self.config
    }

    /// Number of live feeds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.feed.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn handles(&self) -> Vec<FeedHandle> {
        self.slots
            .iter()
            .zip(0u32..)
            .filter(|(slot, _)| slot.feed.is_some())
            .map(|(slot, index)| FeedHandle {
                index,
                generation: slot.generation,
            })
            .collect()
    }

    /// Handle of the feed whose surface satisfies `pred`.
    pub fn find_by(&self, pred: impl Fn(&S) -> bool) -> Option<FeedHandle> {
        self.slots.iter().zip(0u32..).find_map(|(slot, index)| {
            let feed = slot.feed.as_ref()?;
            pred(feed.surface()).then_some(FeedHandle {
                index,
                generation: slot.generation,
            })
        })
    }

    /// Take control of `surface` unless an equal surface is already attached.
    pub fn attach(&mut self, surface: S) -> Attach {
        if let Some(handle) = self.find_by(|existing| *existing == surface) {
            return Attach::Existing(handle);
        }
        let feed = ControlledFeed::new(surface, self.config);
        log::debug!(
            "attached feed (pinned: {}, {} live)",
            feed.is_pinned(),
            self.len() + 1
        );
        let handle = match self.free.pop() {
            Some(index) => {
                let generation = match self.slots.get_mut(index as usize) {
                    Some(slot) => {
                        slot.generation = slot.generation.wrapping_add(1);
                        slot.feed = Some(feed);
                        slot.generation
                    }
                    None => 0,
                };
                FeedHandle { index, generation }
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    feed: Some(feed),
                });
                FeedHandle {
                    index,
                    generation: 0,
                }
            }
        };
        Attach::New(handle)
    }

    pub fn get(&self, handle: FeedHandle) -> Option<&ControlledFeed<S>> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.feed.as_ref())
    }

    pub fn get_mut(&mut self, handle: FeedHandle) -> Option<&mut ControlledFeed<S>> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.feed.as_mut())
    }

    /// Remove a feed from the live set, then run its teardown handlers.
    /// Returns `false` when the handle was already detached.
    pub fn detach(&mut self, handle: FeedHandle) -> bool {
        let Some(mut feed) = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.feed.take())
        else {
            return false;
        };
        self.free.push(handle.index);
        let ran = feed.teardown();
        log::debug!("detached feed ({ran} subscriptions released)");
        true
    }

    /// Detach every feed whose container left the live document.
    pub fn detach_stale(&mut self) -> Vec<FeedHandle> {
        let stale: Vec<FeedHandle> = self
            .handles()
            .into_iter()
            .filter(|&h| self.get(h).is_some_and(|feed| !feed.is_live()))
            .collect();
        for &handle in &stale {
            self.detach(handle);
        }
        stale
    }

    /// Detach everything.
    pub fn clear(&mut self) -> usize {
        let handles = self.handles();
        for &handle in &handles {
            self.detach(handle);
        }
        handles.len()
    }

    #[must_use]
    pub fn is_pinned(&self, handle: FeedHandle) -> Option<bool> {
        self.get(handle).map(ControlledFeed::is_pinned)
    }

    #[must_use]
    pub fn pinned_count(&self) -> usize {
        self.feeds().filter(|f| f.is_pinned()).count()
    }

    fn feeds(&self) -> impl Iterator<Item = &ControlledFeed<S>> {
        self.slots.iter().filter_map(|slot| slot.feed.as_ref())
    }

    fn feeds_mut(&mut self) -> impl Iterator<Item = &mut ControlledFeed<S>> {
        self.slots.iter_mut().filter_map(|slot| slot.feed.as_mut())
    }

    /// Some feed is waiting on a rendering frame.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.feeds().any(ControlledFeed::needs_frame)
    }

    /// Advance every feed's enforcement by one frame. Returns whether another
    /// frame is needed.
    pub fn on_frame(&mut self) -> bool {
        let mut again = false;
        for feed in self.feeds_mut() {
            again |= feed.on_frame() == FrameStep::NeedsFrame;
        }
        again
    }

    // Per-handle signal routing. Each returns `true` when a frame must be
    // requested; unknown handles are ignored.

    pub fn on_scroll(&mut self, handle: FeedHandle, now_ms: f64) -> bool {
        self.get_mut(handle).is_some_and(|f| f.on_scroll(now_ms))
    }

    pub fn on_input(&mut self, handle: FeedHandle, kind: InputKind, now_ms: f64) {
        if let Some(feed) = self.get_mut(handle) {
            feed.on_input(kind, now_ms);
        }
    }

    pub fn on_content_changed(&mut self, handle: FeedHandle) -> bool {
        self.get_mut(handle)
            .is_some_and(ControlledFeed::on_content_changed)
    }

    pub fn on_tick(&mut self, handle: FeedHandle) -> WriteOutcome {
        self.get_mut(handle)
            .map_or(WriteOutcome::Skipped, ControlledFeed::on_tick)
    }

    pub fn on_bootstrap(&mut self, handle: FeedHandle) -> bool {
        self.get_mut(handle)
            .is_some_and(ControlledFeed::on_bootstrap)
    }

    pub fn resume(&mut self, handle: FeedHandle, now_ms: f64) -> bool {
        self.get_mut(handle).is_some_and(|f| f.resume(now_ms))
    }

    pub fn set_enabled(&mut self, handle: FeedHandle, enabled: bool, now_ms: f64) -> bool {
        self.get_mut(handle)
            .is_some_and(|f| f.set_enabled(enabled, now_ms))
    }

    /// Apply the preference to every feed.
    pub fn set_enabled_all(&mut self, enabled: bool, now_ms: f64) -> bool {
        let mut frame = false;
        for feed in self.feeds_mut() {
            frame |= feed.set_enabled(enabled, now_ms);
        }
        frame
    }
}
