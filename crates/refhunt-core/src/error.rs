/// Error type shared by every fallible operation in the core.
///
/// Per-asset and per-pattern problems are deliberately *not* errors: they
/// are logged and the offending item is excluded. `HuntError` is reserved
/// for whole-operation failures (unreadable manifest, settings file that
/// cannot be written, export sink failure).
#[derive(Debug, thiserror::Error)]
pub enum HuntError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Invalid ignore pattern #{index} `{pattern}`: {message}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, HuntError>;
