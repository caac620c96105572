//! JSON-file favorites store.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::FavoriteItem;

use super::error::FavoritesError;
use super::store::FavoritesStore;

/// Favorites persisted as a JSON array.
///
/// A missing file is an empty collection. Writes go through a lock so
/// concurrent add/remove calls do not lose each other's updates.
#[derive(Debug)]
pub struct FileFavoritesStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileFavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the favorites file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<FavoriteItem>, FavoritesError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(FavoritesError::Storage {
                    message: format!("failed to read {}: {}", self.path.display(), e),
                });
            }
        };

        serde_json::from_str(&contents).map_err(|e| FavoritesError::Corrupt {
            message: e.to_string(),
        })
    }

    async fn write(&self, items: &[FavoriteItem]) -> Result<(), FavoritesError> {
        // Create parent directories if needed
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FavoritesError::Storage {
                    message: format!("failed to create favorites directory: {}", e),
                })?;
        }

        let json = serde_json::to_string_pretty(items).map_err(|e| FavoritesError::Storage {
            message: format!("failed to serialize favorites: {}", e),
        })?;

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| FavoritesError::Storage {
                message: format!("failed to write favorites file: {}", e),
            })
    }
}

impl FavoritesStore for FileFavoritesStore {
    async fn list(&self) -> Result<Vec<FavoriteItem>, FavoritesError> {
        self.read().await
    }

    async fn add(&self, item: &FavoriteItem) -> Result<(), FavoritesError> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read().await?;
        if items.contains(item) {
            debug!(?item, "favorite already stored");
            return Ok(());
        }
        items.push(item.clone());
        self.write(&items).await
    }

    async fn remove(&self, item: &FavoriteItem) -> Result<(), FavoritesError> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read().await?;
        let before = items.len();
        items.retain(|existing| existing != item);
        if items.len() == before {
            return Ok(());
        }
        self.write(&items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RouteId, StationId};
    use tempfile::tempdir;

    fn item(station: &str, route: &str) -> FavoriteItem {
        FavoriteItem::new(
            StationId::parse(station).unwrap(),
            RouteId::parse(route).unwrap(),
        )
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let store = FileFavoritesStore::new("/nonexistent/path/favorites.json");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_remove_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        let store = FileFavoritesStore::new(&path);

        store.add(&item("01001", "100")).await.unwrap();
        store.add(&item("02002", "200")).await.unwrap();
        store.add(&item("01001", "100")).await.unwrap();

        // A fresh store sees what the first one wrote
        let reopened = FileFavoritesStore::new(&path);
        assert_eq!(
            reopened.list().await.unwrap(),
            vec![item("01001", "100"), item("02002", "200")]
        );

        reopened.remove(&item("01001", "100")).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![item("02002", "200")]);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("favorites.json");
        let store = FileFavoritesStore::new(&path);

        store.add(&item("01001", "100")).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        std::fs::write(&path, "{").unwrap();

        let result = FileFavoritesStore::new(&path).list().await;
        assert!(matches!(result, Err(FavoritesError::Corrupt { .. })));
    }
}
