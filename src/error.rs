//! Structured error types for feedpin.
//!
//! Nothing in the controller is fatal: these errors surface at the boundaries
//! (configuration, host APIs, storage) and are either returned to JavaScript
//! or logged and swallowed for the current cycle.

/// All errors that can occur while configuring or wiring feedpin.
#[derive(Debug, thiserror::Error)]
pub enum FeedpinError {
    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration (or a simulator script) is not valid JSON for its type.
    #[error("JSON parse: {0}")]
    Config(#[from] serde_json::Error),

    /// Discovery found a feed container but no content root inside it.
    #[error("No content root for feed container")]
    MissingContentRoot,

    /// A browser API call failed or the API is absent.
    #[error("Host API unavailable: {0}")]
    HostApi(String),

    /// Preference storage could not be read or written.
    #[error("Storage: {0}")]
    Storage(String),

    /// Reading or writing a file (simulator only).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FeedpinError>;

#[cfg(target_arch = "wasm32")]
impl From<FeedpinError> for wasm_bindgen::JsValue {
    fn from(e: FeedpinError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl FeedpinError {
    /// Wrap a thrown JavaScript value as a host API failure.
    pub(crate) fn host(context: &str, value: &wasm_bindgen::JsValue) -> Self {
        let detail = value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}"));
        Self::HostApi(format!("{context}: {detail}"))
    }
}
