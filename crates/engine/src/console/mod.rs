mod palette;

pub use palette::{palette_rgba, BLACK, KEY_COLOR, LIGHT_GRAY, PALETTE_LEN, PALETTE_RGB};

pub const SPACE_GLYPH: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleCell {
    pub glyph: u32,
    pub fg: u8,
    pub bg: u8,
}

impl ConsoleCell {
    pub const BLANK: ConsoleCell = ConsoleCell {
        glyph: SPACE_GLYPH,
        fg: LIGHT_GRAY,
        bg: BLACK,
    };
}

impl Default for ConsoleCell {
    fn default() -> Self {
        Self::BLANK
    }
}

/// Off-screen glyph buffer. Every glyph surface owns one, and the frame root
/// is one too; presenting the root is left to the renderer.
///
/// Writes outside the buffer are clipped. `writes()` counts every cell that
/// was actually painted, including cells received through `blit_onto`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleBuffer {
    width: u32,
    height: u32,
    cells: Vec<ConsoleCell>,
    key_color: Option<u8>,
    writes: u64,
}

impl ConsoleBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![ConsoleCell::BLANK; width as usize * height as usize],
            key_color: None,
            writes: 0,
        }
    }

    /// Buffer whose key-colored cells are transparent when blitted.
    pub fn with_key_color(width: u32, height: u32, key_color: u8) -> Self {
        Self {
            key_color: Some(key_color),
            ..Self::new(width, height)
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn key_color(&self) -> Option<u8> {
        self.key_color
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn cells(&self) -> &[ConsoleCell] {
        &self.cells
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<ConsoleCell> {
        self.index_of(x, y).map(|index| self.cells[index])
    }

    pub fn put(&mut self, x: i32, y: i32, glyph: u32, fg: u8, bg: u8) {
        let Some(index) = self.index_of(x, y) else {
            return;
        };
        self.cells[index] = ConsoleCell { glyph, fg, bg };
        self.writes = self.writes.saturating_add(1);
    }

    pub fn clear(&mut self) {
        self.cells.fill(ConsoleCell::BLANK);
    }

    /// Copies this buffer onto `dest` with its top-left corner at `(x, y)`.
    pub fn blit_onto(&self, dest: &mut ConsoleBuffer, x: i32, y: i32) {
        for (index, cell) in self.cells.iter().enumerate() {
            if self.key_color == Some(cell.bg) {
                continue;
            }
            let sx = (index % self.width as usize) as i32;
            let sy = (index / self.width as usize) as i32;
            dest.put(x + sx, y + sy, cell.glyph, cell.fg, cell.bg);
        }
    }
}
