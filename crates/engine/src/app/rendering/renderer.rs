use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::console::ConsoleBuffer;

use super::font::{draw_console, CellMetrics, FontAtlas};

/// Presents the root console buffer in a window. The pixel buffer is sized
/// to the console grid and scaled to whatever the window surface is.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer_width: u32,
    buffer_height: u32,
    metrics: CellMetrics,
    font: Option<FontAtlas>,
}

impl Renderer {
    pub fn new(
        window: Arc<Window>,
        columns: u32,
        rows: u32,
        metrics: CellMetrics,
        font: Option<FontAtlas>,
    ) -> Result<Self, Error> {
        let buffer_width = columns * metrics.width;
        let buffer_height = rows * metrics.height;
        let size = window.inner_size();
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            (size.width, size.height),
            (buffer_width, buffer_height),
        )?;
        Ok(Self {
            window,
            pixels,
            buffer_width,
            buffer_height,
            metrics,
            font,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(
            Arc::clone(&self.window),
            (width, height),
            (self.buffer_width, self.buffer_height),
        )?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        (surface_width, surface_height): (u32, u32),
        (buffer_width, buffer_height): (u32, u32),
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width, surface_height, window);
        Pixels::new(buffer_width, buffer_height, surface)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn draw(&mut self, console: &ConsoleBuffer) -> Result<(), Error> {
        draw_console(
            self.pixels.frame_mut(),
            self.buffer_width,
            console,
            self.metrics,
            self.font.as_ref(),
        );
        self.pixels.render()
    }
}
