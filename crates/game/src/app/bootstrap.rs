use std::env;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dust_engine::graph::DEFAULT_SAVE_FILE;
use dust_engine::{
    resolve_app_paths, Actor, CatalogError, LoadContext, LoopConfig, Scene, StartupError,
    SubtypeRegistry, TileCatalog, World,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::sandbox::SandboxScene;

const SAVE_FILE_ENV_VAR: &str = "DUST_SAVE_FILE";
const SEED_ENV_VAR: &str = "DUST_SEED";
const FRESH_WORLD_ENV_VAR: &str = "DUST_FRESH_WORLD";
const DEFAULT_SEED: u64 = 15_121_197_032;

/// Actor subtype a save file may name under `subclass`.
const SPARK_SUBTYPE: &str = "spark";
const SPARK_GLYPH: u32 = b'*' as u32;
const SPARK_COLOR: u8 = 14;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{var} must be an unsigned integer, got {value:?}: {source}")]
    InvalidSeed {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Dust Startup ===");

    let paths = resolve_app_paths()?;
    let catalog = Arc::new(TileCatalog::load(&paths.catalog_path)?);
    let ctx = LoadContext::new(Arc::clone(&catalog), build_registry());

    let seed = parse_seed(env::var(SEED_ENV_VAR).ok().as_deref())?;
    let save_path = save_path_from(
        &paths.root,
        env::var_os(SAVE_FILE_ENV_VAR).map(PathBuf::from),
    );
    let fresh = is_flag_set(env::var(FRESH_WORLD_ENV_VAR).ok().as_deref());
    let world = load_world(&save_path, &ctx, fresh);

    info!(
        root = %paths.root.display(),
        save_path = %save_path.display(),
        seed,
        fresh,
        "bootstrap_complete"
    );

    let config = LoopConfig {
        font_path: Some(paths.font_path),
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        scene: Box::new(SandboxScene::new(world, ctx, seed, save_path)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn build_registry() -> SubtypeRegistry {
    let mut registry = SubtypeRegistry::new();
    registry.register(SPARK_SUBTYPE, |_ctx: &LoadContext| {
        let mut spark = Actor::glyph_at(0, 0, SPARK_GLYPH, SPARK_COLOR);
        spark.set_name("Spark");
        spark
    });
    registry
}

fn parse_seed(raw: Option<&str>) -> Result<u64, BootstrapError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(DEFAULT_SEED);
    };
    raw.parse::<u64>().map_err(|source| BootstrapError::InvalidSeed {
        var: SEED_ENV_VAR,
        value: raw.to_string(),
        source,
    })
}

fn save_path_from(root: &Path, raw: Option<PathBuf>) -> PathBuf {
    raw.filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| root.join(DEFAULT_SAVE_FILE))
}

fn is_flag_set(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), Some(value) if !value.is_empty() && value != "0")
}

/// The saved world when one can be read, otherwise a default world. A save
/// that fails to load is left on disk untouched until the next save.
fn load_world(save_path: &Path, ctx: &LoadContext, fresh: bool) -> World {
    if fresh || !save_path.is_file() {
        info!(path = %save_path.display(), fresh, "world_created");
        return World::new(Arc::clone(ctx.catalog()));
    }
    match World::load_file(save_path, ctx) {
        Ok(world) => world,
        Err(error) => {
            warn!(
                path = %save_path.display(),
                error = %error,
                "save_load_failed_using_default"
            );
            World::new(Arc::clone(ctx.catalog()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use dust_engine::persist::load_node;
    use dust_engine::{Bounded, Bounds, TileType};
    use serde_json::json;

    use super::*;

    fn test_context() -> LoadContext {
        let catalog = TileCatalog::from_types(vec![
            TileType {
                floor_char: 46,
                floor_color: 8,
                name: Some("floor".to_string()),
            },
            TileType {
                floor_char: 35,
                floor_color: 7,
                name: Some("wall".to_string()),
            },
        ]);
        LoadContext::new(Arc::new(catalog), build_registry())
    }

    #[test]
    fn seed_defaults_when_unset_or_blank() {
        assert_eq!(parse_seed(None).expect("seed"), DEFAULT_SEED);
        assert_eq!(parse_seed(Some("  ")).expect("seed"), DEFAULT_SEED);
        assert_eq!(parse_seed(Some("42")).expect("seed"), 42);
    }

    #[test]
    fn malformed_seed_is_rejected() {
        let error = parse_seed(Some("forty-two")).expect_err("invalid seed");
        assert!(error.to_string().contains("DUST_SEED"));
    }

    #[test]
    fn save_path_defaults_under_root() {
        let root = Path::new("/srv/dust");
        assert_eq!(save_path_from(root, None), root.join("saved.json"));
        assert_eq!(
            save_path_from(root, Some(PathBuf::from("other.json"))),
            PathBuf::from("other.json")
        );
    }

    #[test]
    fn fresh_flag_ignores_zero_and_blank() {
        assert!(!is_flag_set(None));
        assert!(!is_flag_set(Some("")));
        assert!(!is_flag_set(Some("0")));
        assert!(is_flag_set(Some("1")));
    }

    #[test]
    fn missing_save_yields_default_world() {
        let dir = tempfile::tempdir().expect("tempdir");
        let world = load_world(&dir.path().join("saved.json"), &test_context(), false);
        assert_eq!(world.boards().len(), 1);
        assert_eq!(world.current_board().layers().len(), 1);
    }

    #[test]
    fn existing_save_is_loaded_unless_fresh() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("saved.json");
        let ctx = test_context();
        let mut world = World::new(Arc::clone(ctx.catalog()));
        world.set_name("Saved");
        world.save_to(&path).expect("save");

        assert_eq!(load_world(&path, &ctx, false).name(), "Saved");
        assert_ne!(load_world(&path, &ctx, true).name(), "Saved");
    }

    #[test]
    fn corrupt_save_falls_back_and_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("saved.json");
        fs::write(&path, "{ not json").expect("write");

        let world = load_world(&path, &test_context(), false);

        assert_eq!(world.boards().len(), 1);
        assert_eq!(fs::read_to_string(&path).expect("read"), "{ not json");
    }

    #[test]
    fn spark_subtype_loads_from_document() {
        let ctx = test_context();
        let doc = json!({
            "subclass": "spark",
            "w": 1, "h": 1, "x": 4, "y": 2,
            "sprite": [{ "w": 1, "h": 1, "x": 0, "y": 0, "tilemap": [[42, 14]], "tilemask": 0 }],
        });

        let actor: Actor = load_node(&doc, &ctx).expect("spark actor");

        assert_eq!(actor.name(), "Spark");
        assert_eq!(actor.position(), (4, 2));
        assert_eq!(actor.bounds(), Bounds::new(4, 2, 1, 1));
    }
}
