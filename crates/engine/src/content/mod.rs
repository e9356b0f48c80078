mod catalog;

pub use catalog::{CatalogError, TileCatalog, TileType, FALLBACK_CELL};
