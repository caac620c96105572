//! User favorites storage.
//!
//! Sessions never edit favorites locally: every add or remove goes to the
//! store, and the session re-lists afterwards so it always shows what the
//! store accepted.

mod error;
mod file;
mod store;

pub use error::FavoritesError;
pub use file::FileFavoritesStore;
pub use store::{FavoritesStore, MemoryFavorites};
