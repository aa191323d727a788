use thiserror::Error;

/// Fatal document-level failures. Per-field problems never surface here;
/// they are logged and skipped.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
