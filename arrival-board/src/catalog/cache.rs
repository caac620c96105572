//! Shared caching layer for the catalog.
//!
//! Every station session resolves its metadata from the full catalog. The
//! catalog changes rarely, so sessions share one cached copy; concurrent
//! misses are coalesced into a single fetch.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::domain::{RouteId, StationMetadata};

use super::error::CatalogError;
use super::source::StationCatalog;

/// Configuration for the catalog cache.
#[derive(Debug, Clone)]
pub struct CatalogCacheConfig {
    /// How long a fetched catalog stays valid.
    pub ttl: Duration,
}

impl Default for CatalogCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Catalog source with caching.
///
/// Wraps any [`StationCatalog`] and caches both of its listings.
pub struct CachedCatalog<C> {
    inner: Arc<C>,
    stations: MokaCache<(), Arc<Vec<StationMetadata>>>,
    routes: MokaCache<(), Arc<Vec<RouteId>>>,
}

impl<C: StationCatalog> CachedCatalog<C> {
    /// Create a new cached catalog.
    pub fn new(inner: C, config: &CatalogCacheConfig) -> Self {
        Self {
            inner: Arc::new(inner),
            stations: MokaCache::builder()
                .time_to_live(config.ttl)
                .max_capacity(1)
                .build(),
            routes: MokaCache::builder()
                .time_to_live(config.ttl)
                .max_capacity(1)
                .build(),
        }
    }

    /// Access the underlying source for operations that bypass the cache.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Drop cached listings so the next fetch reloads them.
    pub fn invalidate(&self) {
        self.stations.invalidate_all();
        self.routes.invalidate_all();
    }
}

impl<C: StationCatalog> StationCatalog for CachedCatalog<C> {
    async fn fetch_stations(&self) -> Result<Vec<StationMetadata>, CatalogError> {
        let inner = Arc::clone(&self.inner);
        let stations = self
            .stations
            .try_get_with((), async move {
                debug!("loading station catalog");
                inner.fetch_stations().await.map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())?;
        Ok(stations.as_ref().clone())
    }

    async fn fetch_routes(&self) -> Result<Vec<RouteId>, CatalogError> {
        let inner = Arc::clone(&self.inner);
        let routes = self
            .routes
            .try_get_with((), async move {
                debug!("loading route catalog");
                inner.fetch_routes().await.map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())?;
        Ok(routes.as_ref().clone())
    }
}
