use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::console::{LIGHT_GRAY, SPACE_GLYPH};
use crate::graph::Cell;

/// Rendered in place of any tile id the catalog does not define.
pub const FALLBACK_CELL: Cell = Cell {
    glyph: SPACE_GLYPH,
    color: LIGHT_GRAY,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileType {
    pub floor_char: u32,
    pub floor_color: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    types: Vec<TileType>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read tile catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tile catalog {path} at {at}: {source}")]
    Parse {
        path: PathBuf,
        at: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only table of tile types indexed by tile id. Loaded once and shared
/// by every layer of a world.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileCatalog {
    types: Vec<TileType>,
}

impl TileCatalog {
    pub fn from_types(types: Vec<TileType>) -> Self {
        Self { types }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&raw, path)?;
        info!(
            path = %path.display(),
            tile_types = catalog.len(),
            "catalog_loaded"
        );
        Ok(catalog)
    }

    /// Parses a `{"types": [...]}` document; `origin` is only used in errors.
    pub fn parse(raw: &str, origin: &Path) -> Result<Self, CatalogError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let file = serde_path_to_error::deserialize::<_, CatalogFile>(&mut deserializer).map_err(
            |error| {
                let at = error.path().to_string();
                CatalogError::Parse {
                    path: origin.to_path_buf(),
                    at,
                    source: error.into_inner(),
                }
            },
        )?;
        Ok(Self::from_types(file.types))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, tile_id: u32) -> Option<&TileType> {
        self.types.get(tile_id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<u32> {
        self.types
            .iter()
            .position(|tile| tile.name.as_deref() == Some(name))
            .map(|index| index as u32)
    }

    /// Glyph and color for `tile_id`, or [`FALLBACK_CELL`] for unknown ids.
    pub fn render(&self, tile_id: u32) -> Cell {
        match self.get(tile_id) {
            Some(tile) => Cell {
                glyph: tile.floor_char,
                color: tile.floor_color,
            },
            None => FALLBACK_CELL,
        }
    }
}
