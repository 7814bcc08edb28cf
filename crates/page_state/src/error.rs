use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageStateError {
    #[error("page '{base_path}' has no view model; it must be constructed before initialization")]
    MissingViewModel { base_path: String },
    #[error("navigation to '{url}' failed: {source}")]
    Navigation { url: String, source: anyhow::Error },
    #[error("failed to persist page state under '{key}': {source}")]
    Storage { key: String, source: anyhow::Error },
    #[error("failed to serialize page state for '{key}': {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
}

impl PageStateError {
    /// Storage failures leave the URL updated; callers may retry or ignore them.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}
