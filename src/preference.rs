//! The persisted on/off preference.
//!
//! A single boolean under an external key: read once at startup, written on
//! every toggle. A missing value means "on".

use crate::error::Result;

/// Key/value backend holding the raw preference string.
pub trait PreferenceStore {
    /// # Errors
    /// Returns [`crate::FeedpinError::Storage`] when the backend is unusable.
    fn load(&self) -> Result<Option<String>>;

    /// # Errors
    /// Returns [`crate::FeedpinError::Storage`] when the backend is unusable.
    fn store(&self, value: &str) -> Result<()>;
}

/// Decode a stored value. Only `"1"` and `"true"` mean enabled.
#[must_use]
pub fn decode(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(value) => value == "1" || value == "true",
    }
}

#[must_use]
pub fn encode(enabled: bool) -> &'static str {
    if enabled {
        "1"
    } else {
        "0"
    }
}

/// Cached preference over a [`PreferenceStore`].
pub struct Preference<P> {
    store: P,
    enabled: bool,
}

impl<P: PreferenceStore> Preference<P> {
    /// Read the stored value. An unreadable store counts as "on".
    pub fn load(store: P) -> Self {
        let enabled = match store.load() {
            Ok(raw) => decode(raw.as_deref()),
            Err(err) => {
                log::warn!("preference unreadable, defaulting to enabled: {err}");
                true
            }
        };
        Self { store, enabled }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Update the cached value and persist it.
    ///
    /// # Errors
    /// Returns the store's error; the cached value is updated regardless.
    pub fn set(&mut self, enabled: bool) -> Result<()> {
        self.enabled = enabled;
        self.store.store(encode(enabled))
    }

    /// Flip the preference, returning the new value.
    pub fn toggle(&mut self) -> bool {
        let next = !self.enabled;
        if let Err(err) = self.set(next) {
            log::warn!("could not persist preference: {err}");
        }
        next
    }
}
