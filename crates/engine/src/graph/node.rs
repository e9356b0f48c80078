use crate::console::ConsoleBuffer;

use super::actor::Actor;
use super::board::Board;
use super::bounds::{Bounded, Bounds};
use super::layer::TileLayer;
use super::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    World,
    Board,
    Layer,
    Actor,
}

/// Borrowed view of any node in the scene graph.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    World(&'a World),
    Board(&'a Board),
    Layer(&'a TileLayer),
    Actor(&'a Actor),
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::World(_) => NodeKind::World,
            Self::Board(_) => NodeKind::Board,
            Self::Layer(_) => NodeKind::Layer,
            Self::Actor(_) => NodeKind::Actor,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Self::World(world) => world.name(),
            Self::Board(board) => board.name(),
            Self::Layer(layer) => layer.name(),
            Self::Actor(actor) => actor.name(),
        }
    }

    /// `None` for the world, which has no position.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Self::World(_) => None,
            Self::Board(board) => Some(board.bounds()),
            Self::Layer(layer) => Some(layer.bounds()),
            Self::Actor(actor) => Some(actor.bounds()),
        }
    }

    /// Owned children in tick order: actors, then layers, then boards.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match *self {
            Self::World(world) => world
                .actors
                .iter()
                .map(NodeRef::Actor)
                .chain(world.layers.iter().map(NodeRef::Layer))
                .chain(world.boards.iter().map(NodeRef::Board))
                .collect(),
            Self::Board(board) => board
                .actors
                .iter()
                .map(NodeRef::Actor)
                .chain(board.layers.iter().map(NodeRef::Layer))
                .collect(),
            Self::Layer(layer) => layer.actors.iter().map(NodeRef::Actor).collect(),
            Self::Actor(_) => Vec::new(),
        }
    }
}

/// Mutable view of any node in the scene graph.
#[derive(Debug)]
pub enum NodeMut<'a> {
    World(&'a mut World),
    Board(&'a mut Board),
    Layer(&'a mut TileLayer),
    Actor(&'a mut Actor),
}

impl NodeMut<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::World(_) => NodeKind::World,
            Self::Board(_) => NodeKind::Board,
            Self::Layer(_) => NodeKind::Layer,
            Self::Actor(_) => NodeKind::Actor,
        }
    }
}

/// Visits `node` and all of its descendants, parents before children.
pub fn walk<'a>(node: NodeRef<'a>, visit: &mut impl FnMut(NodeRef<'a>)) {
    visit(node);
    for child in node.children() {
        walk(child, visit);
    }
}

/// Node counts below (and including) a root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Census {
    pub boards: usize,
    pub layers: usize,
    pub actors: usize,
}

pub fn census(root: NodeRef<'_>) -> Census {
    let mut census = Census::default();
    walk(root, &mut |node| match node.kind() {
        NodeKind::World => {}
        NodeKind::Board => census.boards += 1,
        NodeKind::Layer => census.layers += 1,
        NodeKind::Actor => census.actors += 1,
    });
    census
}

/// Brings every stale surface under `node` up to date.
///
/// Only surfaces that are composited during a normal blit reach `dest`:
/// global layers, the current board's layers and the actors standing on
/// layers. World and board actors are repainted in place. Boards other than
/// the current one are left alone.
pub fn redraw(node: NodeMut<'_>, dest: &mut ConsoleBuffer) {
    match node {
        NodeMut::World(world) => {
            for actor in &mut world.actors {
                actor.sprite.repaint();
            }
            for layer in world.layers.iter_mut().rev() {
                redraw(NodeMut::Layer(layer), dest);
            }
            if let Some(board) = world.boards.get_mut(world.current_board) {
                redraw(NodeMut::Board(board), dest);
            }
        }
        NodeMut::Board(board) => {
            for actor in &mut board.actors {
                actor.sprite.repaint();
            }
            for layer in board.layers.iter_mut().rev() {
                redraw(NodeMut::Layer(layer), dest);
            }
        }
        NodeMut::Layer(layer) => {
            layer.refresh(dest);
            for actor in layer.actors.iter_mut().rev() {
                actor.refresh(dest);
            }
        }
        NodeMut::Actor(actor) => actor.refresh(dest),
    }
}
