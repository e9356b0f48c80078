//! Scene graph: world → boards → layers → actors.
//!
//! Every node exclusively owns its children. Frames are composed bottom-up
//! with a painter's algorithm where index 0 of any collection ends on top.

mod actor;
mod board;
mod bounds;
mod glyph;
mod layer;
mod node;
mod world;

use std::collections::BTreeMap;

pub use actor::{Actor, DEFAULT_ACTOR_NAME};
pub use board::{Board, DEFAULT_BOARD_NAME};
pub use bounds::{Bounded, Bounds};
pub use glyph::{color_pair, Cell, GlyphSurface, TRANSPARENT_GLYPH};
pub use layer::{TileEntry, TileLayer, DEFAULT_LAYER_NAME};
pub use node::{census, redraw, walk, Census, NodeKind, NodeMut, NodeRef};
pub use world::{BoardIndexError, World, WorldFileError, DEFAULT_SAVE_FILE, DEFAULT_WORLD_NAME};

pub const DEFAULT_BOARD_WIDTH: i32 = 80;
pub const DEFAULT_BOARD_HEIGHT: i32 = 25;

/// Named numeric counters attached to worlds, boards and actors.
pub type Counters = BTreeMap<String, i64>;
