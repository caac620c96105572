//! JSON-file station catalog.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{RouteId, StationId, StationMetadata};

use super::error::CatalogError;
use super::source::StationCatalog;

/// On-disk catalog layout.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub stations: Vec<StationDto>,
    #[serde(default)]
    pub routes: Vec<RouteDto>,
}

/// Minimal DTO for a station entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDto {
    pub ars_id: String,
    pub station_name: String,
    #[serde(default)]
    pub direction: String,
}

/// Minimal DTO for a route entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDto {
    pub route_id: String,
    #[serde(default)]
    pub route_name: String,
}

/// Catalog backed by a JSON file, re-read on every fetch.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the catalog file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<CatalogFile, CatalogError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| CatalogError::Io {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                })?;

        serde_json::from_str(&contents).map_err(|e| CatalogError::Json {
            message: e.to_string(),
        })
    }
}

impl StationCatalog for FileCatalog {
    async fn fetch_stations(&self) -> Result<Vec<StationMetadata>, CatalogError> {
        let file = self.load().await?;
        Ok(convert_stations(file.stations))
    }

    async fn fetch_routes(&self) -> Result<Vec<RouteId>, CatalogError> {
        let file = self.load().await?;
        Ok(file
            .routes
            .into_iter()
            .filter_map(|r| RouteId::parse(&r.route_id).ok())
            .collect())
    }
}

/// Convert station DTOs, skipping entries with an invalid stop number.
fn convert_stations(stations: Vec<StationDto>) -> Vec<StationMetadata> {
    stations
        .into_iter()
        .filter_map(|s| match StationId::parse(&s.ars_id) {
            Ok(id) => Some(StationMetadata {
                id,
                name: s.station_name,
                direction: s.direction,
            }),
            Err(e) => {
                debug!(ars_id = %s.ars_id, error = %e, "skipping catalog station");
                None
            }
        })
        .collect()
}
