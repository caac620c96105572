//! Favorites store error types.

/// Errors that can occur when reading or writing favorites.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FavoritesError {
    /// Store contents could not be read or written
    #[error("favorites storage error: {message}")]
    Storage { message: String },

    /// Stored favorites could not be parsed
    #[error("favorites parse error: {message}")]
    Corrupt { message: String },
}
