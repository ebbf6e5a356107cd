use std::fmt::Display;

/// Errors from the batching renderer and its configuration.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A texture key could not be turned into a bindable handle. Recoverable per group.
    #[error("texture '{key}' could not be resolved: {reason}")]
    ResourceMissing { key: String, reason: String },
    #[error("invalid renderer config: {0}")]
    InvalidConfig(String),
    #[error("invalid animation: {0}")]
    InvalidAnimation(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    pub fn resource_missing(key: &str, reason: impl Display) -> Self {
        Self::ResourceMissing {
            key: key.to_owned(),
            reason: reason.to_string(),
        }
    }
}
