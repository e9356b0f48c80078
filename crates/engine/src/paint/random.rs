use rand::Rng;

use crate::content::TileCatalog;
use crate::graph::Bounds;

pub fn random_glyph<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(0..=255)
}

/// A foreground color from the 16-color palette.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(0..=15)
}

/// Any catalog id, or one past the end, which renders as the fallback tile.
pub fn random_tile_id<R: Rng + ?Sized>(rng: &mut R, catalog: &TileCatalog) -> u32 {
    rng.gen_range(0..=catalog.len() as u32)
}

pub fn random_position<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> (i32, i32) {
    (
        rng.gen_range(bounds.x..bounds.x + bounds.width()),
        rng.gen_range(bounds.y..bounds.y + bounds.height()),
    )
}
