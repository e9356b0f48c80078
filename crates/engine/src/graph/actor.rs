use crate::console::ConsoleBuffer;
use crate::persist::{Field, Footprint, LoadContext, Persist, PersistError};

use super::bounds::{Bounded, Bounds};
use super::glyph::GlyphSurface;
use super::Counters;

pub const DEFAULT_ACTOR_NAME: &str = "New Actor";

/// A positioned entity with its own sprite. `program` is carried through
/// save and load untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub(crate) bounds: Bounds,
    pub(crate) name: String,
    pub(crate) sprite: GlyphSurface,
    pub(crate) counters: Counters,
    pub(crate) program: String,
    pub(crate) subtype: Option<String>,
}

impl Actor {
    pub fn new(bounds: Bounds, name: impl Into<String>) -> Self {
        Self {
            bounds,
            name: name.into(),
            sprite: GlyphSurface::new(Bounds::sized(bounds.w, bounds.h)),
            counters: Counters::new(),
            program: String::new(),
            subtype: None,
        }
    }

    /// 1x1 actor showing `glyph` in `color` at `(x, y)`.
    pub fn glyph_at(x: i32, y: i32, glyph: u32, color: u8) -> Self {
        let mut actor = Self::new(Bounds::new(x, y, 1, 1), DEFAULT_ACTOR_NAME);
        actor.sprite.set_cell(0, 0, glyph, Some(color));
        actor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn position(&self) -> (i32, i32) {
        (self.bounds.x, self.bounds.y)
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.bounds.x = x;
        self.bounds.y = y;
    }

    pub fn sprite(&self) -> &GlyphSurface {
        &self.sprite
    }

    pub fn sprite_mut(&mut self) -> &mut GlyphSurface {
        &mut self.sprite
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn set_program(&mut self, program: impl Into<String>) {
        self.program = program.into();
    }

    /// Behavior hook; actors are inert for now.
    pub fn tick(&mut self) {}

    /// Repaints the sprite if needed and copies it to the actor's position.
    pub fn blit(&mut self, dest: &mut ConsoleBuffer) {
        self.sprite.repaint();
        self.sprite.blit(dest, self.bounds.x, self.bounds.y);
    }

    /// Like [`Actor::blit`], but only when the sprite had pending changes.
    pub fn refresh(&mut self, dest: &mut ConsoleBuffer) {
        if self.sprite.repaint() {
            self.sprite.blit(dest, self.bounds.x, self.bounds.y);
        }
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::new(Bounds::default(), DEFAULT_ACTOR_NAME)
    }
}

impl Bounded for Actor {
    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl Persist for Actor {
    const KIND: &'static str = "actor";

    fn footprint() -> Footprint<Self> {
        Footprint::new(vec![
            Field::scalar("w", |a: &Self| &a.bounds.w, |a: &mut Self| &mut a.bounds.w),
            Field::scalar("h", |a: &Self| &a.bounds.h, |a: &mut Self| &mut a.bounds.h),
            Field::scalar("x", |a: &Self| &a.bounds.x, |a: &mut Self| &mut a.bounds.x),
            Field::scalar("y", |a: &Self| &a.bounds.y, |a: &mut Self| &mut a.bounds.y),
            Field::scalar("name", |a: &Self| &a.name, |a: &mut Self| &mut a.name),
            Field::single("sprite", |a: &Self| &a.sprite, |a: &mut Self| &mut a.sprite),
            Field::scalar("counters", |a: &Self| &a.counters, |a: &mut Self| &mut a.counters),
            Field::scalar("program", |a: &Self| &a.program, |a: &mut Self| &mut a.program),
        ])
    }

    fn instantiate(_ctx: &LoadContext) -> Self {
        Self::default()
    }

    fn after_load(&mut self, path: &str) -> Result<(), PersistError> {
        if !self.bounds.is_valid() {
            return Err(PersistError::invalid(
                path,
                format!("actor must be at least 1x1 and inside the grid, got {:?}", self.bounds),
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

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::content::TileCatalog;
    use crate::persist::{load_node, serialize, SubtypeRegistry};
    use serde_json::json;

    fn context() -> LoadContext {
        LoadContext::new(Arc::new(TileCatalog::default()), SubtypeRegistry::new())
    }

    #[test]
    fn blit_draws_sprite_at_actor_position() {
        let mut actor = Actor::glyph_at(3, 1, 64, 0x0e);
        let mut dest = ConsoleBuffer::new(5, 3);

        actor.blit(&mut dest);

        let cell = dest.cell(3, 1).expect("in range");
        assert_eq!((cell.glyph, cell.fg, cell.bg), (64, 0x0e, 0));
    }

    #[test]
    fn refresh_skips_clean_sprite() {
        let mut actor = Actor::glyph_at(0, 0, 64, 7);
        let mut dest = ConsoleBuffer::new(2, 2);
        actor.refresh(&mut dest);
        let writes = dest.writes();

        actor.refresh(&mut dest);

        assert_eq!(dest.writes(), writes);
    }

    #[test]
    fn document_uses_one_element_sprite_collection() {
        let mut actor = Actor::glyph_at(2, 4, 1, 2);
        actor.set_program("wander");
        actor.counters_mut().insert("hp".to_string(), 3);

        let doc = serialize(&actor).expect("serialize");

        assert_eq!(doc["sprite"].as_array().map(Vec::len), Some(1));
        assert_eq!(doc["sprite"][0]["tilemap"], json!([[1, 2]]));
        assert_eq!(doc["program"], json!("wander"));
        assert_eq!(doc["counters"], json!({ "hp": 3 }));

        let back: Actor = load_node(&doc, &context()).expect("load");
        assert_eq!(back, actor);
    }

    #[test]
    fn sprite_count_other_than_one_is_rejected() {
        let doc = json!({ "name": "a", "sprite": [] });
        let error = load_node::<Actor>(&doc, &context()).expect_err("must fail");
        assert!(matches!(
            error,
            PersistError::ChildCount { expected: 1, actual: 0, .. }
        ));
    }

    #[test]
    fn zero_sized_actor_fails_validation() {
        let sprite = serialize(&GlyphSurface::new(Bounds::default())).expect("sprite");
        let doc = json!({ "w": 0, "sprite": [sprite] });
        let error = load_node::<Actor>(&doc, &context()).expect_err("must fail");
        assert!(matches!(error, PersistError::Invalid { .. }));
    }

    #[test]
    fn sprite_subtype_survives_a_save_cycle() {
        let mut registry = SubtypeRegistry::new();
        registry.register("masked", |_ctx: &LoadContext| {
            let mut sprite = GlyphSurface::new(Bounds::sized(1, 1));
            sprite.set_transparent_glyph(32);
            sprite
        });
        let ctx = LoadContext::new(Arc::new(TileCatalog::default()), registry);
        let doc = json!({
            "w": 1, "h": 1, "x": 0, "y": 0,
            "sprite": [{ "subclass": "masked", "w": 1, "h": 1, "x": 0, "y": 0, "tilemap": [[32, 7]] }],
        });

        let actor: Actor = load_node(&doc, &ctx).expect("load");
        assert_eq!(actor.sprite().transparent_glyph(), 32);

        let saved = serialize(&actor).expect("serialize");
        assert_eq!(saved["sprite"][0]["subclass"], json!("masked"));
        assert_eq!(saved["sprite"][0]["tilemask"], json!(32));

        let reloaded: Actor = load_node(&saved, &ctx).expect("reload");
        assert_eq!(reloaded, actor);
    }
}
