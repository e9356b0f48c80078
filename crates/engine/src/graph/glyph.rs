use serde::{Deserialize, Serialize};

use crate::console::{ConsoleBuffer, KEY_COLOR, LIGHT_GRAY};
use crate::persist::{Field, Footprint, LoadContext, Persist, PersistError};

use super::bounds::{Bounded, Bounds};

/// Glyph value treated as "nothing here" unless a surface overrides it.
pub const TRANSPARENT_GLYPH: u32 = 0;

/// One glyph with a packed color pair: foreground in the low nibble,
/// background in the high nibble. Persisted as `[glyph, color]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u32, u8)", into = "(u32, u8)")]
pub struct Cell {
    pub glyph: u32,
    pub color: u8,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        glyph: TRANSPARENT_GLYPH,
        color: LIGHT_GRAY,
    };

    pub fn new(glyph: u32, color: u8) -> Self {
        Self { glyph, color }
    }

    pub fn foreground(self) -> u8 {
        self.color & 0x0f
    }

    pub fn background(self) -> u8 {
        self.color >> 4
    }
}

pub fn color_pair(fg: u8, bg: u8) -> u8 {
    (bg & 0x0f) << 4 | (fg & 0x0f)
}

impl From<(u32, u8)> for Cell {
    fn from((glyph, color): (u32, u8)) -> Self {
        Self { glyph, color }
    }
}

impl From<Cell> for (u32, u8) {
    fn from(cell: Cell) -> Self {
        (cell.glyph, cell.color)
    }
}

/// Cell grid plus the off-screen buffer it renders into.
///
/// Mutations only touch `cells` and raise `dirty`; the buffer is repainted
/// lazily, at most once per batch of mutations, by [`GlyphSurface::repaint`]
/// or [`GlyphSurface::refresh`]. Cell coordinates are local to the surface.
#[derive(Debug, Clone)]
pub struct GlyphSurface {
    bounds: Bounds,
    cells: Vec<Cell>,
    transparent_glyph: u32,
    dirty: bool,
    buffer: ConsoleBuffer,
    subtype: Option<String>,
}

impl GlyphSurface {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            cells: vec![Cell::EMPTY; bounds.area()],
            transparent_glyph: TRANSPARENT_GLYPH,
            dirty: true,
            buffer: buffer_for(bounds),
            subtype: None,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 || x >= self.bounds.w || y >= self.bounds.h {
            return None;
        }
        self.cells.get(self.bounds.index_of(x, y)).copied()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn transparent_glyph(&self) -> u32 {
        self.transparent_glyph
    }

    pub fn set_transparent_glyph(&mut self, glyph: u32) {
        self.transparent_glyph = glyph;
        self.dirty = true;
    }

    pub fn buffer(&self) -> &ConsoleBuffer {
        &self.buffer
    }

    /// Sets the glyph at `(x, y)`; the color only changes when one is given.
    ///
    /// # Panics
    ///
    /// Panics when `(x, y)` lies outside the surface.
    pub fn set_cell(&mut self, x: i32, y: i32, glyph: u32, color: Option<u8>) {
        let index = self.bounds.index_of(x, y);
        let cell = &mut self.cells[index];
        cell.glyph = glyph;
        if let Some(color) = color {
            cell.color = color;
        }
        self.dirty = true;
    }

    /// Overwrites whichever channels are given across every cell.
    pub fn fill(&mut self, glyph: Option<u32>, color: Option<u8>) {
        match (glyph, color) {
            (None, None) => return,
            (Some(glyph), None) => self.cells.iter_mut().for_each(|cell| cell.glyph = glyph),
            (None, Some(color)) => self.cells.iter_mut().for_each(|cell| cell.color = color),
            (Some(glyph), Some(color)) => self.cells.fill(Cell { glyph, color }),
        }
        self.dirty = true;
    }

    /// # Panics
    ///
    /// Panics when `cells` does not hold exactly `w * h` entries.
    pub fn replace_cells(&mut self, cells: Vec<Cell>) {
        assert_eq!(
            cells.len(),
            self.bounds.area(),
            "cell buffer does not match surface dimensions"
        );
        self.cells = cells;
        self.dirty = true;
    }

    /// Paints every cell into the off-screen buffer when dirty. Returns whether
    /// anything was painted.
    pub fn repaint(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        let width = self.bounds.w as usize;
        for (index, cell) in self.cells.iter().enumerate() {
            let bg = if cell.glyph == self.transparent_glyph {
                KEY_COLOR
            } else {
                cell.background()
            };
            self.buffer.put(
                (index % width) as i32,
                (index / width) as i32,
                cell.glyph,
                cell.foreground(),
                bg,
            );
        }
        self.dirty = false;
        true
    }

    /// Repaints when dirty and then blits onto `dest` at the surface origin.
    /// A clean surface does nothing at all.
    pub fn refresh(&mut self, dest: &mut ConsoleBuffer) {
        if self.repaint() {
            self.buffer.blit_onto(dest, self.bounds.x, self.bounds.y);
        }
    }

    /// Copies the off-screen buffer as it stands; never repaints.
    pub fn blit(&self, dest: &mut ConsoleBuffer, x: i32, y: i32) {
        self.buffer.blit_onto(dest, x, y);
    }
}

fn buffer_for(bounds: Bounds) -> ConsoleBuffer {
    ConsoleBuffer::with_key_color(bounds.w as u32, bounds.h as u32, KEY_COLOR)
}

impl PartialEq for GlyphSurface {
    fn eq(&self, other: &Self) -> bool {
        self.bounds == other.bounds
            && self.cells == other.cells
            && self.transparent_glyph == other.transparent_glyph
            && self.subtype == other.subtype
    }
}

impl Bounded for GlyphSurface {
    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl Persist for GlyphSurface {
    const KIND: &'static str = "sprite";

    fn footprint() -> Footprint<Self> {
        Footprint::new(vec![
            Field::scalar("w", |s: &Self| &s.bounds.w, |s: &mut Self| &mut s.bounds.w),
            Field::scalar("h", |s: &Self| &s.bounds.h, |s: &mut Self| &mut s.bounds.h),
            Field::scalar("x", |s: &Self| &s.bounds.x, |s: &mut Self| &mut s.bounds.x),
            Field::scalar("y", |s: &Self| &s.bounds.y, |s: &mut Self| &mut s.bounds.y),
            Field::scalar("tilemap", |s: &Self| &s.cells, |s: &mut Self| &mut s.cells),
            Field::scalar(
                "tilemask",
                |s: &Self| &s.transparent_glyph,
                |s: &mut Self| &mut s.transparent_glyph,
            ),
        ])
    }

    fn instantiate(_ctx: &LoadContext) -> Self {
        Self::new(Bounds::default())
    }

    fn after_load(&mut self, path: &str) -> Result<(), PersistError> {
        if !self.bounds.is_valid() {
            return Err(PersistError::invalid(
                path,
                format!("surface must be at least 1x1 and inside the grid, got {:?}", self.bounds),
            ));
        }
        if self.cells.len() != self.bounds.area() {
            return Err(PersistError::invalid(
                path,
                format!(
                    "tilemap holds {} cells, expected {}",
                    self.cells.len(),
                    self.bounds.area()
                ),
            ));
        }
        self.buffer = buffer_for(self.bounds);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ConsoleCell, SPACE_GLYPH};

    fn clean_surface(w: i32, h: i32) -> GlyphSurface {
        let mut surface = GlyphSurface::new(Bounds::sized(w, h));
        surface.fill(Some(46), Some(color_pair(7, 1)));
        surface.repaint();
        surface
    }

    #[test]
    fn set_cell_without_color_keeps_existing_color() {
        let mut surface = clean_surface(3, 2);
        surface.set_cell(1, 1, 64, None);
        assert_eq!(surface.cell(1, 1), Some(Cell::new(64, color_pair(7, 1))));
        assert!(surface.is_dirty());

        surface.set_cell(2, 0, 65, Some(3));
        assert_eq!(surface.cell(2, 0), Some(Cell::new(65, 3)));
    }

    #[test]
    fn fill_updates_only_given_channels() {
        let mut surface = clean_surface(2, 2);

        surface.fill(None, None);
        assert!(!surface.is_dirty());

        surface.fill(Some(35), None);
        assert!(surface.cells().iter().all(|cell| *cell == Cell::new(35, color_pair(7, 1))));

        surface.fill(None, Some(4));
        assert!(surface.cells().iter().all(|cell| *cell == Cell::new(35, 4)));

        surface.fill(Some(1), Some(2));
        assert!(surface.cells().iter().all(|cell| *cell == Cell::new(1, 2)));
        assert!(surface.is_dirty());
    }

    #[test]
    fn clean_refresh_paints_nothing() {
        let mut surface = clean_surface(4, 3);
        let buffer_writes = surface.buffer().writes();
        let mut dest = ConsoleBuffer::new(4, 3);

        surface.refresh(&mut dest);

        assert_eq!(surface.buffer().writes(), buffer_writes);
        assert_eq!(dest.writes(), 0);
    }

    #[test]
    fn one_refresh_clears_dirty_after_a_batch_of_mutations() {
        let mut surface = clean_surface(4, 3);
        surface.set_cell(0, 0, 65, Some(2));
        surface.set_cell(1, 0, 66, Some(2));
        let mut dest = ConsoleBuffer::new(4, 3);

        surface.refresh(&mut dest);
        assert!(!surface.is_dirty());
        assert_eq!(dest.writes(), 12);

        let after_first = dest.writes();
        surface.refresh(&mut dest);
        assert_eq!(dest.writes(), after_first);
    }

    #[test]
    fn transparent_glyph_paints_key_background() {
        let mut surface = GlyphSurface::new(Bounds::sized(2, 1));
        surface.set_cell(0, 0, TRANSPARENT_GLYPH, Some(color_pair(2, 5)));
        surface.set_cell(1, 0, 88, Some(color_pair(2, 5)));

        surface.repaint();

        assert_eq!(
            surface.buffer().cell(0, 0),
            Some(ConsoleCell {
                glyph: TRANSPARENT_GLYPH,
                fg: 2,
                bg: KEY_COLOR
            })
        );
        assert_eq!(
            surface.buffer().cell(1, 0),
            Some(ConsoleCell {
                glyph: 88,
                fg: 2,
                bg: 5
            })
        );
    }

    #[test]
    fn transparent_cells_do_not_cover_destination() {
        let mut surface = GlyphSurface::new(Bounds::sized(2, 1));
        surface.set_cell(1, 0, 88, Some(7));
        let mut dest = ConsoleBuffer::new(2, 1);
        dest.put(0, 0, 42, 1, 0);

        surface.refresh(&mut dest);

        assert_eq!(dest.cell(0, 0).map(|cell| cell.glyph), Some(42));
        assert_eq!(dest.cell(1, 0).map(|cell| cell.glyph), Some(88));
    }

    #[test]
    fn blit_does_not_touch_dirty_or_cells() {
        let mut surface = GlyphSurface::new(Bounds::sized(1, 1));
        surface.set_cell(0, 0, 70, Some(7));
        let mut dest = ConsoleBuffer::new(3, 3);

        surface.blit(&mut dest, 2, 2);

        assert!(surface.is_dirty());
        assert_eq!(surface.cell(0, 0), Some(Cell::new(70, 7)));
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn replace_cells_rejects_wrong_length() {
        let mut surface = GlyphSurface::new(Bounds::sized(2, 2));
        surface.replace_cells(vec![Cell::EMPTY; 3]);
    }

    #[test]
    fn cell_pairs_serialize_as_arrays() {
        let json = serde_json::to_value(Cell::new(64, 0x17)).expect("encode");
        assert_eq!(json, serde_json::json!([64, 23]));
        let back: Cell = serde_json::from_value(json).expect("decode");
        assert_eq!(back, Cell::new(64, 0x17));
    }

    #[test]
    fn custom_tilemask_keys_out_matching_cells() {
        let mut surface = GlyphSurface::new(Bounds::sized(2, 1));
        surface.set_cell(0, 0, SPACE_GLYPH, Some(color_pair(7, 1)));
        surface.set_cell(1, 0, 65, Some(color_pair(2, 1)));
        surface.repaint();

        surface.set_transparent_glyph(SPACE_GLYPH);
        assert!(surface.is_dirty());

        let mut dest = ConsoleBuffer::new(2, 1);
        dest.put(0, 0, 88, 4, 0);
        surface.refresh(&mut dest);

        assert_eq!(dest.cell(0, 0).map(|cell| cell.glyph), Some(88));
        assert_eq!(dest.cell(1, 0).map(|cell| cell.glyph), Some(65));
    }
}
