//! `localStorage`-backed preference store.

use web_sys::Storage;

use crate::error::{FeedpinError, Result};
use crate::preference::PreferenceStore;

pub struct LocalStorage {
    key: String,
}

impl LocalStorage {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Result<Storage> {
        web_sys::window()
            .ok_or_else(|| FeedpinError::Storage("no window".to_string()))?
            .local_storage()
            .map_err(|e| FeedpinError::Storage(format!("{e:?}")))?
            .ok_or_else(|| FeedpinError::Storage("localStorage disabled".to_string()))
    }
}

impl PreferenceStore for LocalStorage {
    fn load(&self) -> Result<Option<String>> {
        Self::storage()?
            .get_item(&self.key)
            .map_err(|e| FeedpinError::Storage(format!("{e:?}")))
    }

    fn store(&self, value: &str) -> Result<()> {
        Self::storage()?
            .set_item(&self.key, value)
            .map_err(|e| FeedpinError::Storage(format!("{e:?}")))
    }
}
