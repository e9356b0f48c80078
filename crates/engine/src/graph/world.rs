use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::console::ConsoleBuffer;
use crate::content::TileCatalog;
use crate::persist::{
    self, read_document, write_document_atomic, DocumentFileError, Field, Footprint, LoadContext,
    Persist, PersistError,
};

use super::actor::Actor;
use super::board::{Board, DEFAULT_BOARD_NAME};
use super::bounds::Bounds;
use super::layer::{TileLayer, DEFAULT_LAYER_NAME};
use super::node::{self, Census, NodeMut, NodeRef};
use super::{Counters, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH};

pub const DEFAULT_WORLD_NAME: &str = "New World";
pub const DEFAULT_SAVE_FILE: &str = "saved.json";

#[derive(Debug, Error)]
pub enum WorldFileError {
    #[error(transparent)]
    File(#[from] DocumentFileError),
    #[error("world document {path} is malformed: {source}")]
    Structure {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardIndexError {
    #[error("board index {index} out of range (world has {len} boards)")]
    OutOfRange { index: usize, len: usize },
    #[error("cannot remove the only board of a world")]
    LastBoard,
}

/// Root of the scene graph.
///
/// A world always holds at least one board, and `current_board` always
/// indexes one of them.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub(crate) name: String,
    pub(crate) counters: Counters,
    pub(crate) actors: Vec<Actor>,
    pub(crate) layers: Vec<TileLayer>,
    pub(crate) boards: Vec<Board>,
    pub(crate) current_board: usize,
    pub(crate) catalog: Arc<TileCatalog>,
    pub(crate) subtype: Option<String>,
}

impl World {
    /// Default world: one full-size board holding one blank layer.
    pub fn new(catalog: Arc<TileCatalog>) -> Self {
        let bounds = Bounds::sized(DEFAULT_BOARD_WIDTH, DEFAULT_BOARD_HEIGHT);
        let mut board = Board::new(bounds, DEFAULT_BOARD_NAME);
        board.add_layer(TileLayer::new(Arc::clone(&catalog), bounds, DEFAULT_LAYER_NAME));
        Self {
            name: DEFAULT_WORLD_NAME.to_string(),
            counters: Counters::new(),
            actors: Vec::new(),
            layers: Vec::new(),
            boards: vec![board],
            current_board: 0,
            catalog,
            subtype: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn catalog(&self) -> &Arc<TileCatalog> {
        &self.catalog
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    /// Layer sharing this world's catalog.
    pub fn new_layer(&self, bounds: Bounds, name: impl Into<String>) -> TileLayer {
        TileLayer::new(Arc::clone(&self.catalog), bounds, name)
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn add_actor(&mut self, actor: Actor) -> usize {
        self.actors.push(actor);
        self.actors.len() - 1
    }

    pub fn remove_actor(&mut self, index: usize) -> Option<Actor> {
        (index < self.actors.len()).then(|| self.actors.remove(index))
    }

    /// Global layers, drawn beneath the current board.
    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [TileLayer] {
        &mut self.layers
    }

    pub fn add_layer(&mut self, layer: TileLayer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    pub fn remove_layer(&mut self, index: usize) -> Option<TileLayer> {
        (index < self.layers.len()).then(|| self.layers.remove(index))
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn board_mut(&mut self, index: usize) -> Option<&mut Board> {
        self.boards.get_mut(index)
    }

    pub fn add_board(&mut self, board: Board) -> usize {
        self.boards.push(board);
        self.boards.len() - 1
    }

    /// Removes a board, keeping the current board on the same board when it
    /// survives and on its nearest neighbour otherwise.
    pub fn remove_board(&mut self, index: usize) -> Result<Board, BoardIndexError> {
        self.check_board_index(index)?;
        if self.boards.len() == 1 {
            return Err(BoardIndexError::LastBoard);
        }
        let removed = self.boards.remove(index);
        if index < self.current_board || self.current_board == self.boards.len() {
            self.current_board -= 1;
        }
        Ok(removed)
    }

    pub fn current_board_index(&self) -> usize {
        self.current_board
    }

    pub fn current_board(&self) -> &Board {
        &self.boards[self.current_board]
    }

    pub fn current_board_mut(&mut self) -> &mut Board {
        &mut self.boards[self.current_board]
    }

    pub fn set_current_board(&mut self, index: usize) -> Result<(), BoardIndexError> {
        self.check_board_index(index)?;
        self.current_board = index;
        info!(
            board = index,
            name = %self.boards[index].name,
            "board_switched"
        );
        Ok(())
    }

    fn check_board_index(&self, index: usize) -> Result<(), BoardIndexError> {
        if index >= self.boards.len() {
            return Err(BoardIndexError::OutOfRange {
                index,
                len: self.boards.len(),
            });
        }
        Ok(())
    }

    /// Ticks world actors, then global layers, then every board.
    pub fn tick(&mut self) {
        for actor in &mut self.actors {
            actor.tick();
        }
        for layer in &mut self.layers {
            layer.tick();
        }
        for board in &mut self.boards {
            board.tick();
        }
    }

    /// Full frame: clear, global layers last-first, then the current board.
    pub fn blit(&mut self, dest: &mut ConsoleBuffer) {
        dest.clear();
        for layer in self.layers.iter_mut().rev() {
            layer.blit(dest);
        }
        self.boards[self.current_board].blit(dest);
    }

    /// Refreshes every stale surface without clearing `dest`.
    pub fn redraw(&mut self, dest: &mut ConsoleBuffer) {
        node::redraw(NodeMut::World(self), dest);
    }

    pub fn census(&self) -> Census {
        node::census(NodeRef::World(self))
    }

    pub fn to_document(&self) -> Result<Value, PersistError> {
        persist::serialize(self)
    }

    pub fn from_document(doc: &Value, ctx: &LoadContext) -> Result<Self, PersistError> {
        persist::load_node(doc, ctx)
    }

    /// Saves to `path`, or to [`DEFAULT_SAVE_FILE`] in the working directory.
    /// Failures are logged and reported as `false`.
    pub fn save(&self, path: Option<&Path>) -> bool {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_SAVE_FILE));
        match self.save_to(path) {
            Ok(()) => true,
            Err(error) => {
                error!(path = %path.display(), error = %error, "save_failed");
                false
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), WorldFileError> {
        let doc = self.to_document().map_err(|source| WorldFileError::Structure {
            path: path.to_path_buf(),
            source,
        })?;
        write_document_atomic(path, &doc)?;
        let census = self.census();
        info!(
            path = %path.display(),
            boards = census.boards,
            layers = census.layers,
            actors = census.actors,
            "world_saved"
        );
        Ok(())
    }

    pub fn load_file(path: &Path, ctx: &LoadContext) -> Result<Self, WorldFileError> {
        let doc = read_document(path)?;
        let world =
            Self::from_document(&doc, ctx).map_err(|source| WorldFileError::Structure {
                path: path.to_path_buf(),
                source,
            })?;
        let census = world.census();
        info!(
            path = %path.display(),
            name = %world.name,
            boards = census.boards,
            layers = census.layers,
            actors = census.actors,
            "world_loaded"
        );
        Ok(world)
    }

    /// Replaces this world with the one stored at `path`. On failure the
    /// current world is kept as it was.
    pub fn reload_from(&mut self, path: &Path, ctx: &LoadContext) -> Result<(), WorldFileError> {
        *self = Self::load_file(path, ctx)?;
        Ok(())
    }
}

impl Persist for World {
    const KIND: &'static str = "world";

    fn footprint() -> Footprint<Self> {
        Footprint::new(vec![
            Field::scalar("name", |w: &Self| &w.name, |w: &mut Self| &mut w.name),
            Field::scalar("counters", |w: &Self| &w.counters, |w: &mut Self| &mut w.counters),
            Field::children("actors", |w: &Self| &w.actors, |w: &mut Self| &mut w.actors),
            Field::children("layers", |w: &Self| &w.layers, |w: &mut Self| &mut w.layers),
            Field::children("boards", |w: &Self| &w.boards, |w: &mut Self| &mut w.boards),
            Field::scalar(
                "current_board",
                |w: &Self| &w.current_board,
                |w: &mut Self| &mut w.current_board,
            ),
        ])
    }

    fn instantiate(ctx: &LoadContext) -> Self {
        Self::new(Arc::clone(ctx.catalog()))
    }

    fn after_load(&mut self, path: &str) -> Result<(), PersistError> {
        if self.boards.is_empty() {
            return Err(PersistError::invalid(path, "world has no boards"));
        }
        if self.current_board >= self.boards.len() {
            return Err(PersistError::invalid(
                path,
                format!(
                    "current_board {} out of range (world has {} boards)",
                    self.current_board,
                    self.boards.len()
                ),
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
