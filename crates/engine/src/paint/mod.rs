//! Procedural painters. Each one computes a sequence of points, clamps every
//! point to the target's bounds and hands it to a caller-supplied mutator.

mod random;

use rand::Rng;

use crate::graph::Bounded;

pub use random::{random_color, random_glyph, random_position, random_tile_id};

/// Unit steps in the order the direction roll indexes them: up, down,
/// right, left.
const WALK_STEPS: [(i32, i32); 4] = [(0, -1), (0, 1), (1, 0), (-1, 0)];

/// Brownian walk of `steps` unit moves starting at `start`.
///
/// Each move picks one of the four cardinal directions, clamps the new point
/// into `target` and calls `mutate` with it. Returns the final point.
pub fn random_walk<T, R, F>(
    target: &mut T,
    steps: usize,
    start: (i32, i32),
    rng: &mut R,
    mut mutate: F,
) -> (i32, i32)
where
    T: Bounded + ?Sized,
    R: Rng + ?Sized,
    F: FnMut(&mut T, i32, i32),
{
    let (mut x, mut y) = start;
    for _ in 0..steps {
        let (dx, dy) = WALK_STEPS[rng.gen_range(0..WALK_STEPS.len())];
        (x, y) = target.clamp_to_bounds(x + dx, y + dy);
        mutate(target, x, y);
    }
    (x, y)
}

/// Number of points [`rasterize_line`] visits between two endpoints.
///
/// Heavy lines use the Manhattan length, which yields a 4-connected stroke;
/// thin lines use the Chebyshev length.
pub fn line_steps(from: (i32, i32), to: (i32, i32), heavy: bool) -> u64 {
    let dx = u64::from(from.0.abs_diff(to.0));
    let dy = u64::from(from.1.abs_diff(to.1));
    if heavy {
        dx + dy
    } else {
        dx.max(dy)
    }
}

/// Interpolates from `to` towards `from` and calls `mutate` on every clamped
/// point. Identical endpoints visit nothing. Returns the number of calls.
pub fn rasterize_line<T, F>(
    target: &mut T,
    from: (i32, i32),
    to: (i32, i32),
    heavy: bool,
    mut mutate: F,
) -> u64
where
    T: Bounded + ?Sized,
    F: FnMut(&mut T, i32, i32),
{
    let steps = line_steps(from, to, heavy);
    let total = steps as f64;
    for i in 0..steps {
        let near = i as f64 / total;
        let far = (steps - i) as f64 / total;
        let x = (f64::from(from.0) * near + f64::from(to.0) * far) as i32;
        let y = (f64::from(from.1) * near + f64::from(to.1) * far) as i32;
        let (x, y) = target.clamp_to_bounds(x, y);
        mutate(target, x, y);
    }
    steps
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::content::TileCatalog;
    use crate::graph::{Bounds, TileEntry, TileLayer};

    fn record_walk(bounds: Bounds, seed: u64, steps: usize, start: (i32, i32)) -> Vec<(i32, i32)> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut target = bounds;
        let mut visited = Vec::new();
        random_walk(&mut target, steps, start, &mut rng, |_, x, y| visited.push((x, y)));
        visited
    }

    #[test]
    fn walk_stays_inside_bounds() {
        let bounds = Bounds::new(2, 3, 5, 4);
        let visited = record_walk(bounds, 7, 500, (0, 0));
        assert_eq!(visited.len(), 500);
        assert!(visited.iter().all(|&(x, y)| bounds.contains(x, y)));
    }

    #[test]
    fn walk_is_reproducible_for_a_seed() {
        let bounds = Bounds::sized(20, 10);
        assert_eq!(record_walk(bounds, 99, 64, (5, 5)), record_walk(bounds, 99, 64, (5, 5)));
    }

    #[test]
    fn walk_moves_one_cell_at_a_time() {
        let bounds = Bounds::sized(30, 30);
        let visited = record_walk(bounds, 3, 200, (15, 15));
        let mut previous: (i32, i32) = (15, 15);
        for &(x, y) in &visited {
            let distance = previous.0.abs_diff(x) + previous.1.abs_diff(y);
            assert!(distance <= 1, "jumped from {previous:?} to {:?}", (x, y));
            previous = (x, y);
        }
    }

    #[test]
    fn walk_returns_last_visited_point() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut target = Bounds::sized(8, 8);
        let mut last = None;
        let end = random_walk(&mut target, 10, (4, 4), &mut rng, |_, x, y| last = Some((x, y)));
        assert_eq!(Some(end), last);
    }

    #[test]
    fn walk_paints_layer_through_mutator() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let catalog = Arc::new(TileCatalog::default());
        let mut layer = TileLayer::new(catalog, Bounds::sized(6, 6), "walk");
        layer.fill(TileEntry::plain(0));

        let (x, y) = random_walk(&mut layer, 40, (3, 3), &mut rng, |layer, x, y| {
            layer.set_tile(x, y, TileEntry::plain(4))
        });

        assert_eq!(layer.tile(x, y), Some(TileEntry::plain(4)));
        assert!(layer.is_dirty());
    }

    #[test]
    fn identical_endpoints_draw_nothing() {
        let mut target = Bounds::sized(10, 10);
        let mut calls = 0;
        let steps = rasterize_line(&mut target, (4, 4), (4, 4), true, |_, _, _| calls += 1);
        assert_eq!(steps, 0);
        assert_eq!(calls, 0);
    }

    #[test]
    fn horizontal_line_starts_at_second_endpoint() {
        let mut target = Bounds::sized(10, 10);
        let mut visited = Vec::new();
        rasterize_line(&mut target, (0, 2), (4, 2), false, |_, x, y| visited.push((x, y)));
        assert_eq!(visited, vec![(4, 2), (3, 2), (2, 2), (1, 2)]);
    }

    #[test]
    fn heavy_line_visits_manhattan_length() {
        let mut target = Bounds::sized(10, 10);
        let mut visited = Vec::new();
        let steps = rasterize_line(&mut target, (0, 0), (3, 2), true, |_, x, y| {
            visited.push((x, y))
        });
        assert_eq!(steps, 5);
        assert_eq!(visited.len(), 5);
        assert_eq!(line_steps((0, 0), (3, 2), false), 3);
    }

    #[test]
    fn step_count_spans_the_full_coordinate_range() {
        let far = (i32::MAX, i32::MAX);
        let near = (i32::MIN, i32::MIN);
        assert_eq!(line_steps(near, far, true), 2 * u64::from(u32::MAX));
        assert_eq!(line_steps(near, far, false), u64::from(u32::MAX));
    }

    #[test]
    fn line_points_are_clamped() {
        let bounds = Bounds::sized(5, 5);
        let mut target = bounds;
        let mut visited = Vec::new();
        rasterize_line(&mut target, (-20, -3), (30, 12), false, |_, x, y| {
            visited.push((x, y))
        });
        assert_eq!(visited.len(), 50);
        assert!(visited.iter().all(|&(x, y)| bounds.contains(x, y)));
    }
}
