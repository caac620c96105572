//! Catalog error types.

/// Errors that can occur when loading the station/route catalog.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("failed to read catalog {path}: {message}")]
    Io { path: String, message: String },

    /// Catalog contents could not be parsed
    #[error("catalog parse error: {message}")]
    Json { message: String },

    /// The backing source is not reachable
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}
