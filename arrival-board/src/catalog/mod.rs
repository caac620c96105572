//! Station and route catalog.
//!
//! Provides stop number → station metadata resolution and the list of
//! routes the board should show. The catalog is loaded once per session and
//! can be shared between sessions through [`CachedCatalog`].

mod cache;
mod error;
mod file;
mod source;

pub use cache::{CachedCatalog, CatalogCacheConfig};
pub use error::CatalogError;
pub use file::{CatalogFile, FileCatalog, RouteDto, StationDto};
pub use source::{StationCatalog, find_station};
