use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    /// The document repository could not be checked out.
    #[error("git error: {0}")]
    Git(String),

    #[error("document source error: {0}")]
    Source(String),

    /// A document does not follow the breaking-change template.
    #[error("parse error in {file} at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// True for errors caused by a single document rather than the run as a whole.
    pub fn is_malformed_document(&self) -> bool {
        matches!(self, AppError::Parse { .. } | AppError::Read { .. })
    }
}
