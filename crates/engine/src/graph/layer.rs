use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::console::{ConsoleBuffer, LIGHT_GRAY};
use crate::content::TileCatalog;
use crate::persist::{Field, Footprint, LoadContext, Persist, PersistError};

use super::actor::Actor;
use super::bounds::{Bounded, Bounds};
use super::glyph::{Cell, GlyphSurface};
use super::{DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH};

pub const DEFAULT_LAYER_NAME: &str = "New Layer";

/// Semantic content of one map cell. Persisted as `[tile_id, color, param]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u32, u8, i32)", into = "(u32, u8, i32)")]
pub struct TileEntry {
    pub tile_id: u32,
    pub color: u8,
    /// Free payload for game logic; never rendered.
    pub param: i32,
}

impl TileEntry {
    pub fn new(tile_id: u32, color: u8, param: i32) -> Self {
        Self {
            tile_id,
            color,
            param,
        }
    }

    /// `tile_id` with the default light-gray color and no payload.
    pub fn plain(tile_id: u32) -> Self {
        Self::new(tile_id, LIGHT_GRAY, 0)
    }
}

impl Default for TileEntry {
    fn default() -> Self {
        Self::plain(1)
    }
}

impl From<(u32, u8, i32)> for TileEntry {
    fn from((tile_id, color, param): (u32, u8, i32)) -> Self {
        Self::new(tile_id, color, param)
    }
}

impl From<TileEntry> for (u32, u8, i32) {
    fn from(entry: TileEntry) -> Self {
        (entry.tile_id, entry.color, entry.param)
    }
}

/// A tile map plus the glyph surface it renders into.
///
/// Two dirty flags are in play. The layer's own flag means the tile map
/// changed since the last [`TileLayer::flip`]; the surface's flag means its
/// cells changed since they were last painted. Direct surface edits such as
/// [`TileLayer::draw_tile`] only raise the second one and are overwritten by
/// the next flip.
#[derive(Debug, Clone)]
pub struct TileLayer {
    pub(crate) bounds: Bounds,
    pub(crate) name: String,
    pub(crate) tiles: Vec<TileEntry>,
    pub(crate) surface: GlyphSurface,
    pub(crate) actors: Vec<Actor>,
    pub(crate) dirty: bool,
    pub(crate) catalog: Arc<TileCatalog>,
    pub(crate) subtype: Option<String>,
}

impl TileLayer {
    pub fn new(catalog: Arc<TileCatalog>, bounds: Bounds, name: impl Into<String>) -> Self {
        Self {
            bounds,
            name: name.into(),
            tiles: vec![TileEntry::default(); bounds.area()],
            surface: GlyphSurface::new(bounds),
            actors: Vec::new(),
            dirty: true,
            catalog,
            subtype: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn catalog(&self) -> &Arc<TileCatalog> {
        &self.catalog
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn tiles(&self) -> &[TileEntry] {
        &self.tiles
    }

    pub fn surface(&self) -> &GlyphSurface {
        &self.surface
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<TileEntry> {
        if x < 0 || y < 0 || x >= self.bounds.w || y >= self.bounds.h {
            return None;
        }
        self.tiles.get(self.bounds.index_of(x, y)).copied()
    }

    /// Catalog glyph for `tile_id`. The entry's own color and param do not
    /// affect the rendered cell.
    pub fn render_tile(&self, tile: TileEntry) -> Cell {
        self.catalog.render(tile.tile_id)
    }

    /// # Panics
    ///
    /// Panics when `(x, y)` lies outside the layer.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: TileEntry) {
        let index = self.bounds.index_of(x, y);
        self.tiles[index] = tile;
        self.dirty = true;
    }

    /// Updates only the payload. Nothing visible changes, so the layer stays
    /// clean.
    pub fn set_tile_param(&mut self, x: i32, y: i32, param: i32) {
        let index = self.bounds.index_of(x, y);
        self.tiles[index].param = param;
    }

    /// Paints `tile` onto the surface without recording it in the tile map.
    pub fn draw_tile(&mut self, x: i32, y: i32, tile: TileEntry) {
        let cell = self.render_tile(tile);
        self.surface.set_cell(x, y, cell.glyph, Some(cell.color));
    }

    pub fn fill(&mut self, tile: TileEntry) {
        self.tiles.fill(tile);
        self.dirty = true;
    }

    /// Rebuilds every entry from its row-major index.
    pub fn fill_with(&mut self, mut generate: impl FnMut(usize) -> TileEntry) {
        for (index, entry) in self.tiles.iter_mut().enumerate() {
            *entry = generate(index);
        }
        self.dirty = true;
    }

    pub fn fill_surface(&mut self, glyph: Option<u32>, color: Option<u8>) {
        self.surface.fill(glyph, color);
    }

    /// Re-renders the whole tile map into the surface and refreshes it onto
    /// `dest`. Does nothing unless the tile map changed.
    pub fn flip(&mut self, dest: &mut ConsoleBuffer) {
        if !self.dirty {
            return;
        }
        let cells = self
            .tiles
            .iter()
            .map(|tile| self.catalog.render(tile.tile_id))
            .collect();
        self.surface.replace_cells(cells);
        self.surface.refresh(dest);
        self.dirty = false;
    }

    /// Flip or repaint as needed, then the surface, then actors last-added
    /// first so the earliest actor ends on top.
    pub fn blit(&mut self, dest: &mut ConsoleBuffer) {
        if self.dirty {
            self.flip(dest);
        } else {
            self.surface.repaint();
        }
        self.surface.blit(dest, self.bounds.x, self.bounds.y);
        for actor in self.actors.iter_mut().rev() {
            actor.blit(dest);
        }
    }

    /// Brings the surface up to date, touching `dest` only if something
    /// changed.
    pub fn refresh(&mut self, dest: &mut ConsoleBuffer) {
        if self.dirty {
            self.flip(dest);
        } else {
            self.surface.refresh(dest);
        }
    }

    pub fn tick(&mut self) {
        for actor in &mut self.actors {
            actor.tick();
        }
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actors_mut(&mut self) -> &mut [Actor] {
        &mut self.actors
    }

    /// Appends `actor` and returns its index.
    pub fn add_actor(&mut self, actor: Actor) -> usize {
        self.actors.push(actor);
        self.actors.len() - 1
    }

    pub fn remove_actor(&mut self, index: usize) -> Option<Actor> {
        (index < self.actors.len()).then(|| self.actors.remove(index))
    }
}

/// Layers compare by content: tile map, actors and metadata. Render caches
/// and the shared catalog are not part of a layer's identity.
impl PartialEq for TileLayer {
    fn eq(&self, other: &Self) -> bool {
        self.bounds == other.bounds
            && self.name == other.name
            && self.tiles == other.tiles
            && self.actors == other.actors
            && self.subtype == other.subtype
    }
}

impl Bounded for TileLayer {
    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl Persist for TileLayer {
    const KIND: &'static str = "layer";

    fn footprint() -> Footprint<Self> {
        Footprint::new(vec![
            Field::scalar("w", |l: &Self| &l.bounds.w, |l: &mut Self| &mut l.bounds.w),
            Field::scalar("h", |l: &Self| &l.bounds.h, |l: &mut Self| &mut l.bounds.h),
            Field::scalar("x", |l: &Self| &l.bounds.x, |l: &mut Self| &mut l.bounds.x),
            Field::scalar("y", |l: &Self| &l.bounds.y, |l: &mut Self| &mut l.bounds.y),
            Field::scalar("name", |l: &Self| &l.name, |l: &mut Self| &mut l.name),
            Field::scalar("gamemap", |l: &Self| &l.tiles, |l: &mut Self| &mut l.tiles),
            Field::children("actors", |l: &Self| &l.actors, |l: &mut Self| &mut l.actors),
        ])
    }

    fn instantiate(ctx: &LoadContext) -> Self {
        Self::new(
            Arc::clone(ctx.catalog()),
            Bounds::sized(DEFAULT_BOARD_WIDTH, DEFAULT_BOARD_HEIGHT),
            DEFAULT_LAYER_NAME,
        )
    }

    fn after_load(&mut self, path: &str) -> Result<(), PersistError> {
        if !self.bounds.is_valid() {
            return Err(PersistError::invalid(
                path,
                format!("layer must be at least 1x1 and inside the grid, got {:?}", self.bounds),
            ));
        }
        if self.tiles.len() != self.bounds.area() {
            return Err(PersistError::invalid(
                path,
                format!(
                    "gamemap holds {} tiles, expected {}",
                    self.tiles.len(),
                    self.bounds.area()
                ),
            ));
        }
        self.surface = GlyphSurface::new(self.bounds);
        self.dirty = true;
        Ok(())
    }

    fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    fn set_subtype(&mut self, name: String) {
        self.subtype = Some(name);
    }
}
