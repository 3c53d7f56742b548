use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("dataset is still loading; retry shortly")]
    NotReady,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Backend failure: {0}")]
    Backend(String),
}

/// The two failure kinds a caller has to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retry later; the dataset has not finished loading.
    NotReady,
    /// Any I/O or execution failure. Surface as a generic internal error.
    BackendFailure,
}

impl QueryError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotReady => ErrorKind::NotReady,
            _ => ErrorKind::BackendFailure,
        }
    }

    #[must_use]
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }
}

impl From<std::io::Error> for QueryError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<tokio::task::JoinError> for QueryError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Backend(format!("loader task failed: {e}"))
    }
}
