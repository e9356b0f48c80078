mod font;
mod renderer;

pub use font::{draw_console, CellMetrics, FontAtlas, FontAtlasError, ATLAS_GRID};
pub use renderer::Renderer;
