use std::path::{Path, PathBuf};

use image::{ImageError, ImageReader};
use thiserror::Error;

use crate::console::{palette_rgba, ConsoleBuffer, ConsoleCell, SPACE_GLYPH};
use crate::graph::TRANSPARENT_GLYPH;

/// Glyph atlases are 16 columns by 16 rows, one glyph per code 0..=255.
pub const ATLAS_GRID: u32 = 16;
/// Channel value above which an atlas pixel counts as ink.
const INK_THRESHOLD: u8 = 128;

#[derive(Debug, Error)]
pub enum FontAtlasError {
    #[error("failed to open font atlas {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode font atlas {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("font atlas {path} is {width}x{height}; both sides must be non-zero multiples of 16")]
    Size { path: PathBuf, width: u32, height: u32 },
}

/// Pixel size of one console cell on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub width: u32,
    pub height: u32,
}

/// Greyscale bitmap font. Only ink coverage is kept; colors come from the
/// console cell being drawn.
#[derive(Debug, Clone)]
pub struct FontAtlas {
    glyph_width: u32,
    glyph_height: u32,
    atlas_width: u32,
    ink: Vec<bool>,
}

impl FontAtlas {
    pub fn load(path: &Path) -> Result<Self, FontAtlasError> {
        let reader = ImageReader::open(path).map_err(|source| FontAtlasError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| FontAtlasError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let image = decoded.to_rgba8();
        Self::from_rgba(image.width(), image.height(), image.as_raw()).ok_or_else(|| {
            FontAtlasError::Size {
                path: path.to_path_buf(),
                width: image.width(),
                height: image.height(),
            }
        })
    }

    /// `None` when the dimensions cannot hold a 16x16 grid or `rgba` is short.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Option<Self> {
        if width == 0 || height == 0 || width % ATLAS_GRID != 0 || height % ATLAS_GRID != 0 {
            return None;
        }
        if rgba.len() < (width * height * 4) as usize {
            return None;
        }
        let ink = rgba
            .chunks_exact(4)
            .take((width * height) as usize)
            .map(|pixel| {
                pixel[3] >= INK_THRESHOLD && pixel[0].max(pixel[1]).max(pixel[2]) >= INK_THRESHOLD
            })
            .collect();
        Some(Self {
            glyph_width: width / ATLAS_GRID,
            glyph_height: height / ATLAS_GRID,
            atlas_width: width,
            ink,
        })
    }

    /// Whether `glyph` has ink at the cell-relative pixel `(px, py)` of a
    /// cell sized by `metrics`. The atlas glyph is scaled to fit.
    pub fn covers(&self, glyph: u32, px: u32, py: u32, metrics: CellMetrics) -> bool {
        let code = glyph % (ATLAS_GRID * ATLAS_GRID);
        let gx = px * self.glyph_width / metrics.width.max(1);
        let gy = py * self.glyph_height / metrics.height.max(1);
        let ax = (code % ATLAS_GRID) * self.glyph_width + gx.min(self.glyph_width - 1);
        let ay = (code / ATLAS_GRID) * self.glyph_height + gy.min(self.glyph_height - 1);
        self.ink
            .get((ay * self.atlas_width + ax) as usize)
            .copied()
            .unwrap_or(false)
    }
}

/// Rasterizes `console` into an RGBA frame `frame_width` pixels wide.
/// Without an atlas, visible glyphs are drawn as inset blocks.
pub fn draw_console(
    frame: &mut [u8],
    frame_width: u32,
    console: &ConsoleBuffer,
    metrics: CellMetrics,
    font: Option<&FontAtlas>,
) {
    if frame_width == 0 || metrics.width == 0 || metrics.height == 0 {
        return;
    }
    let frame_height = (frame.len() / 4) as u32 / frame_width;
    for cy in 0..console.height() {
        for cx in 0..console.width() {
            let Some(cell) = console.cell(cx as i32, cy as i32) else {
                continue;
            };
            draw_cell(frame, (frame_width, frame_height), cx, cy, cell, metrics, font);
        }
    }
}

fn draw_cell(
    frame: &mut [u8],
    (frame_width, frame_height): (u32, u32),
    cx: u32,
    cy: u32,
    cell: ConsoleCell,
    metrics: CellMetrics,
    font: Option<&FontAtlas>,
) {
    let fg = palette_rgba(cell.fg);
    let bg = palette_rgba(cell.bg);
    let blank = cell.glyph == SPACE_GLYPH || cell.glyph == TRANSPARENT_GLYPH;
    for py in 0..metrics.height {
        let y = cy * metrics.height + py;
        if y >= frame_height {
            break;
        }
        for px in 0..metrics.width {
            let x = cx * metrics.width + px;
            if x >= frame_width {
                break;
            }
            let ink = !blank
                && match font {
                    Some(font) => font.covers(cell.glyph, px, py, metrics),
                    None => placeholder_covers(px, py, metrics),
                };
            let offset = ((y * frame_width + x) * 4) as usize;
            frame[offset..offset + 4].copy_from_slice(if ink { &fg } else { &bg });
        }
    }
}

fn placeholder_covers(px: u32, py: u32, metrics: CellMetrics) -> bool {
    px >= 1 && py >= 2 && px + 1 < metrics.width && py + 2 < metrics.height
}
