use std::path::PathBuf;

use dust_engine::paint::{
    random_color, random_glyph, random_position, random_tile_id, random_walk, rasterize_line,
};
use dust_engine::{
    Actor, Bounded, ConsoleBuffer, InputAction, InputSnapshot, LoadContext, Scene, SceneCommand,
    TileEntry, TileLayer, World,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

const WALK_COUNT: usize = 10;
const WALK_STEPS: usize = 100;

/// Interactive driver over a single world. Every command paints into the
/// bottom layer of the current board.
pub(crate) struct SandboxScene {
    world: World,
    ctx: LoadContext,
    rng: ChaCha8Rng,
    save_path: PathBuf,
}

impl SandboxScene {
    pub(crate) fn new(world: World, ctx: LoadContext, seed: u64, save_path: PathBuf) -> Self {
        Self {
            world,
            ctx,
            rng: ChaCha8Rng::seed_from_u64(seed),
            save_path,
        }
    }

    fn random_tile(rng: &mut ChaCha8Rng, layer: &TileLayer) -> TileEntry {
        let tile_id = random_tile_id(rng, layer.catalog());
        let color = random_color(rng);
        let param = random_glyph(rng) as i32;
        TileEntry::new(tile_id, color, param)
    }

    fn spawn_actor(&mut self) {
        let Some(layer) = self.world.current_board_mut().layers_mut().last_mut() else {
            return;
        };
        let (x, y) = random_position(&mut self.rng, layer.bounds());
        let glyph = random_glyph(&mut self.rng);
        let color = random_color(&mut self.rng);
        let index = layer.add_actor(Actor::glyph_at(x, y, glyph, color));
        debug!(x, y, glyph, color, index, "actor_spawned");
    }

    fn paint_random_line(&mut self) {
        let Some(layer) = self.world.current_board_mut().layers_mut().last_mut() else {
            return;
        };
        let from = random_position(&mut self.rng, layer.bounds());
        let to = random_position(&mut self.rng, layer.bounds());
        let tile = Self::random_tile(&mut self.rng, layer);
        let painted = rasterize_line(layer, from, to, true, |layer, x, y| {
            set_tile_absolute(layer, x, y, tile)
        });
        debug!(?from, ?to, tile_id = tile.tile_id, painted, "line_painted");
    }

    fn paint_random_walks(&mut self) {
        let Some(layer) = self.world.current_board_mut().layers_mut().last_mut() else {
            return;
        };
        for _ in 0..WALK_COUNT {
            let tile = Self::random_tile(&mut self.rng, layer);
            let start = random_position(&mut self.rng, layer.bounds());
            random_walk(layer, WALK_STEPS, start, &mut self.rng, |layer, x, y| {
                set_tile_absolute(layer, x, y, tile)
            });
        }
        debug!(walks = WALK_COUNT, steps = WALK_STEPS, "walks_painted");
    }

    fn fill_board(&mut self) {
        for layer in self.world.current_board_mut().layers_mut() {
            layer.fill(TileEntry::new(1, 7, 0));
        }
    }

    fn save(&self) -> bool {
        self.world.save(Some(&self.save_path))
    }

    fn reload(&mut self) {
        match self.world.reload_from(&self.save_path, &self.ctx) {
            Ok(()) => info!(path = %self.save_path.display(), "world_reloaded"),
            Err(error) => warn!(
                path = %self.save_path.display(),
                error = %error,
                "reload_failed"
            ),
        }
    }

    fn next_board(&mut self) {
        let next = (self.world.current_board_index() + 1) % self.world.boards().len();
        if let Err(error) = self.world.set_current_board(next) {
            warn!(error = %error, "board_switch_failed");
        }
    }
}

/// Painters hand out absolute points; tile maps are addressed from the
/// layer's own origin.
fn set_tile_absolute(layer: &mut TileLayer, x: i32, y: i32, tile: TileEntry) {
    let origin = layer.bounds();
    layer.set_tile(x - origin.x, y - origin.y, tile);
}

impl Scene for SandboxScene {
    fn load(&mut self) {
        let census = self.world.census();
        info!(
            world = %self.world.name(),
            boards = census.boards,
            layers = census.layers,
            actors = census.actors,
            "sandbox_loaded"
        );
    }

    fn update(&mut self, _fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        if input.pressed(InputAction::SpawnActor) {
            self.spawn_actor();
        }
        if input.pressed(InputAction::RandomLine) {
            self.paint_random_line();
        }
        if input.pressed(InputAction::RandomWalk) {
            self.paint_random_walks();
        }
        if input.pressed(InputAction::Fill) {
            self.fill_board();
        }
        if input.pressed(InputAction::Save) {
            self.save();
        }
        if input.pressed(InputAction::Reload) {
            self.reload();
        }
        if input.pressed(InputAction::NextBoard) {
            self.next_board();
        }

        self.world.tick();
        SceneCommand::None
    }

    fn render(&mut self, console: &mut ConsoleBuffer) {
        self.world.blit(console);
    }

    fn unload(&mut self) {
        self.save();
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!(
            "Dust | {} | {} ({}/{})",
            self.world.name(),
            self.world.current_board().name(),
            self.world.current_board_index() + 1,
            self.world.boards().len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dust_engine::graph::{Board, Bounds};
    use dust_engine::{TileCatalog, TileType};

    use super::*;
    use crate::app::bootstrap::build_registry;

    fn catalog() -> Arc<TileCatalog> {
        Arc::new(TileCatalog::from_types(vec![
            TileType {
                floor_char: 46,
                floor_color: 8,
                name: None,
            },
            TileType {
                floor_char: 35,
                floor_color: 7,
                name: None,
            },
            TileType {
                floor_char: 126,
                floor_color: 2,
                name: None,
            },
        ]))
    }

    fn scene_in(dir: &tempfile::TempDir, seed: u64) -> SandboxScene {
        let catalog = catalog();
        let ctx = LoadContext::new(Arc::clone(&catalog), build_registry());
        SandboxScene::new(World::new(catalog), ctx, seed, dir.path().join("saved.json"))
    }

    fn press(scene: &mut SandboxScene, action: InputAction) -> SceneCommand {
        scene.update(0.02, &InputSnapshot::empty().with_pressed(action))
    }

    fn painted_layer(scene: &SandboxScene) -> &TileLayer {
        scene
            .world
            .current_board()
            .layers()
            .last()
            .expect("board layer")
    }

    #[test]
    fn quit_request_stops_the_loop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = scene_in(&dir, 1);
        let quit = InputSnapshot::empty().with_quit_requested(true);

        assert_eq!(scene.update(0.02, &quit), SceneCommand::Quit);
        assert_eq!(scene.update(0.02, &InputSnapshot::empty()), SceneCommand::None);
    }

    #[test]
    fn spawned_actor_lands_inside_layer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = scene_in(&dir, 7);

        press(&mut scene, InputAction::SpawnActor);
        press(&mut scene, InputAction::SpawnActor);

        let layer = painted_layer(&scene);
        assert_eq!(layer.actors().len(), 2);
        for actor in layer.actors() {
            let (x, y) = actor.position();
            assert!(layer.bounds().contains(x, y));
        }
    }

    #[test]
    fn painting_is_reproducible_for_a_seed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut first = scene_in(&dir, 99);
        let mut second = scene_in(&dir, 99);

        for scene in [&mut first, &mut second] {
            press(scene, InputAction::RandomLine);
            press(scene, InputAction::RandomWalk);
        }

        assert_eq!(painted_layer(&first).tiles(), painted_layer(&second).tiles());
    }

    #[test]
    fn random_walks_dirty_the_layer_after_a_frame() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = scene_in(&dir, 3);
        let mut console = ConsoleBuffer::new(80, 25);
        scene.render(&mut console);
        assert!(!painted_layer(&scene).is_dirty());

        press(&mut scene, InputAction::RandomWalk);

        assert!(painted_layer(&scene).is_dirty());
    }

    #[test]
    fn fill_resets_every_tile_on_the_board() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = scene_in(&dir, 5);
        press(&mut scene, InputAction::RandomWalk);

        press(&mut scene, InputAction::Fill);

        assert!(painted_layer(&scene)
            .tiles()
            .iter()
            .all(|tile| *tile == TileEntry::new(1, 7, 0)));
    }

    #[test]
    fn render_composes_the_current_board() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = scene_in(&dir, 5);
        let mut console = ConsoleBuffer::new(80, 25);

        scene.render(&mut console);

        let cell = console.cell(0, 0).expect("cell");
        assert_eq!(cell.glyph, 35);
        assert_eq!(cell.fg, 7);
    }

    #[test]
    fn reload_restores_the_saved_world() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = scene_in(&dir, 11);
        press(&mut scene, InputAction::SpawnActor);
        press(&mut scene, InputAction::Save);
        press(&mut scene, InputAction::SpawnActor);
        assert_eq!(painted_layer(&scene).actors().len(), 2);

        press(&mut scene, InputAction::Reload);

        assert_eq!(painted_layer(&scene).actors().len(), 1);
    }

    #[test]
    fn reload_without_save_keeps_world() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = scene_in(&dir, 11);
        press(&mut scene, InputAction::SpawnActor);

        press(&mut scene, InputAction::Reload);

        assert_eq!(painted_layer(&scene).actors().len(), 1);
    }

    #[test]
    fn unload_writes_the_save_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = scene_in(&dir, 2);

        scene.unload();

        assert!(dir.path().join("saved.json").is_file());
    }

    #[test]
    fn next_board_wraps_around() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = scene_in(&dir, 2);
        scene
            .world
            .add_board(Board::new(Bounds::sized(10, 5), "Cellar"));

        press(&mut scene, InputAction::NextBoard);
        assert_eq!(scene.world.current_board().name(), "Cellar");
        assert_eq!(scene.debug_title().as_deref(), Some("Dust | New World | Cellar (2/2)"));

        press(&mut scene, InputAction::NextBoard);
        assert_eq!(scene.world.current_board_index(), 0);
    }

    #[test]
    fn commands_on_a_board_without_layers_do_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = scene_in(&dir, 2);
        scene
            .world
            .add_board(Board::new(Bounds::sized(10, 5), "Empty"));
        press(&mut scene, InputAction::NextBoard);

        for action in [
            InputAction::SpawnActor,
            InputAction::RandomLine,
            InputAction::RandomWalk,
            InputAction::Fill,
        ] {
            assert_eq!(press(&mut scene, action), SceneCommand::None);
        }
        assert!(scene.world.current_board().layers().is_empty());
    }
}
