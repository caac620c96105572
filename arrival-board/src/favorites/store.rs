//! Favorites store trait and in-memory implementation.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::FavoriteItem;

use super::error::FavoritesError;

/// The user's favorites collection.
///
/// The store owns uniqueness: adding an existing item and removing a
/// missing one both succeed without changing the collection.
pub trait FavoritesStore: Send + Sync + 'static {
    /// List every favorite across all stations.
    fn list(&self) -> impl Future<Output = Result<Vec<FavoriteItem>, FavoritesError>> + Send;

    fn add(&self, item: &FavoriteItem) -> impl Future<Output = Result<(), FavoritesError>> + Send;

    fn remove(
        &self,
        item: &FavoriteItem,
    ) -> impl Future<Output = Result<(), FavoritesError>> + Send;
}

/// Favorites held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryFavorites {
    items: Arc<RwLock<Vec<FavoriteItem>>>,
}

impl MemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `items` (duplicates are dropped).
    pub fn with_items(items: impl IntoIterator<Item = FavoriteItem>) -> Self {
        let mut unique = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Self {
            items: Arc::new(RwLock::new(unique)),
        }
    }
}

impl FavoritesStore for MemoryFavorites {
    async fn list(&self) -> Result<Vec<FavoriteItem>, FavoritesError> {
        Ok(self.items.read().await.clone())
    }

    async fn add(&self, item: &FavoriteItem) -> Result<(), FavoritesError> {
        let mut items = self.items.write().await;
        if !items.contains(item) {
            items.push(item.clone());
        }
        Ok(())
    }

    async fn remove(&self, item: &FavoriteItem) -> Result<(), FavoritesError> {
        self.items.write().await.retain(|existing| existing != item);
        Ok(())
    }
}
