use crate::console::ConsoleBuffer;
use crate::persist::{Field, Footprint, LoadContext, Persist, PersistError};

use super::actor::Actor;
use super::bounds::{Bounded, Bounds};
use super::layer::TileLayer;
use super::{Counters, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH};

pub const DEFAULT_BOARD_NAME: &str = "New Board";

/// A named region holding a stack of layers. Layer 0 is the top of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub(crate) bounds: Bounds,
    pub(crate) name: String,
    pub(crate) counters: Counters,
    pub(crate) layers: Vec<TileLayer>,
    pub(crate) actors: Vec<Actor>,
    pub(crate) subtype: Option<String>,
}

impl Board {
    pub fn new(bounds: Bounds, name: impl Into<String>) -> Self {
        Self {
            bounds,
            name: name.into(),
            counters: Counters::new(),
            layers: Vec::new(),
            actors: Vec::new(),
            subtype: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [TileLayer] {
        &mut self.layers
    }

    /// Appends `layer` beneath the existing ones and returns its index.
    pub fn add_layer(&mut self, layer: TileLayer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    pub fn remove_layer(&mut self, index: usize) -> Option<TileLayer> {
        (index < self.layers.len()).then(|| self.layers.remove(index))
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actors_mut(&mut self) -> &mut [Actor] {
        &mut self.actors
    }

    pub fn add_actor(&mut self, actor: Actor) -> usize {
        self.actors.push(actor);
        self.actors.len() - 1
    }

    pub fn remove_actor(&mut self, index: usize) -> Option<Actor> {
        (index < self.actors.len()).then(|| self.actors.remove(index))
    }

    pub fn tick(&mut self) {
        for actor in &mut self.actors {
            actor.tick();
        }
        for layer in &mut self.layers {
            layer.tick();
        }
    }

    /// Paints the last layer first, so layer 0 ends on top.
    pub fn blit(&mut self, dest: &mut ConsoleBuffer) {
        for layer in self.layers.iter_mut().rev() {
            layer.blit(dest);
        }
    }
}

impl Bounded for Board {
    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl Persist for Board {
    const KIND: &'static str = "board";

    fn footprint() -> Footprint<Self> {
        Footprint::new(vec![
            Field::scalar("w", |b: &Self| &b.bounds.w, |b: &mut Self| &mut b.bounds.w),
            Field::scalar("h", |b: &Self| &b.bounds.h, |b: &mut Self| &mut b.bounds.h),
            Field::scalar("x", |b: &Self| &b.bounds.x, |b: &mut Self| &mut b.bounds.x),
            Field::scalar("y", |b: &Self| &b.bounds.y, |b: &mut Self| &mut b.bounds.y),
            Field::scalar("name", |b: &Self| &b.name, |b: &mut Self| &mut b.name),
            Field::scalar("counters", |b: &Self| &b.counters, |b: &mut Self| &mut b.counters),
            Field::children("actors", |b: &Self| &b.actors, |b: &mut Self| &mut b.actors),
            Field::children("layers", |b: &Self| &b.layers, |b: &mut Self| &mut b.layers),
        ])
    }

    fn instantiate(_ctx: &LoadContext) -> Self {
        Self::new(
            Bounds::sized(DEFAULT_BOARD_WIDTH, DEFAULT_BOARD_HEIGHT),
            DEFAULT_BOARD_NAME,
        )
    }

    fn after_load(&mut self, path: &str) -> Result<(), PersistError> {
        if !self.bounds.is_valid() {
            return Err(PersistError::invalid(
                path,
                format!("board must be at least 1x1 and inside the grid, got {:?}", self.bounds),
            ));
        }
        Ok(())
    }

    fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    fn set_subtype(&mut self, name: String) {
        self.subtype = Some(name);
    }
}
