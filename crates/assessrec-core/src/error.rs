use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The query was empty or whitespace-only.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Catalog, index or model is not loaded (or was built from another snapshot).
    /// Callers may retry once the missing piece has been (re)built.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The embedding or nearest-neighbour call failed.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Wrap an upstream failure, keeping the whole context chain in the message.
    pub fn retrieval(err: &anyhow::Error) -> Self {
        Self::Retrieval(format!("{err:#}"))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
