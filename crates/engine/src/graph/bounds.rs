/// Half-open rectangle `[x, x + w) × [y, y + h)` with `w, h ≥ 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub(crate) w: i32,
    pub(crate) h: i32,
}

impl Bounds {
    /// # Panics
    ///
    /// Panics when `w` or `h` is smaller than one, or when the far edge
    /// does not fit in an `i32`.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        assert!(w >= 1 && h >= 1, "bounds must be at least 1x1, got {w}x{h}");
        assert!(
            x.checked_add(w).is_some() && y.checked_add(h).is_some(),
            "bounds at ({x}, {y}) sized {w}x{h} overflow the grid"
        );
        Self { x, y, w, h }
    }

    pub fn sized(w: i32, h: i32) -> Self {
        Self::new(0, 0, w, h)
    }

    pub fn width(&self) -> i32 {
        self.w
    }

    pub fn height(&self) -> i32 {
        self.h
    }

    pub fn area(&self) -> usize {
        self.w as usize * self.h as usize
    }

    /// Loaded documents can carry any size, so this also rejects rects whose
    /// far edge overflows.
    pub fn is_valid(&self) -> bool {
        self.w >= 1
            && self.h >= 1
            && self.x.checked_add(self.w).is_some()
            && self.y.checked_add(self.h).is_some()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x <= self.last_x() && y >= self.y && y <= self.last_y()
    }

    pub fn clamp(&self, x: i32, y: i32) -> (i32, i32) {
        (
            x.min(self.last_x()).max(self.x),
            y.min(self.last_y()).max(self.y),
        )
    }

    fn last_x(&self) -> i32 {
        self.x.saturating_add(self.w - 1)
    }

    fn last_y(&self) -> i32 {
        self.y.saturating_add(self.h - 1)
    }

    /// Row-major index of a cell in a `w * h` buffer.
    pub fn index_of(&self, x: i32, y: i32) -> usize {
        (y * self.w + x) as usize
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::sized(1, 1)
    }
}

/// Anything positioned on the grid. Procedural painters only need this.
pub trait Bounded {
    fn bounds(&self) -> Bounds;

    fn clamp_to_bounds(&self, x: i32, y: i32) -> (i32, i32) {
        self.bounds().clamp(x, y)
    }
}

impl Bounded for Bounds {
    fn bounds(&self) -> Bounds {
        *self
    }
}
