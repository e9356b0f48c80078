use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::console::ConsoleBuffer;

use super::input::ActionStates;
use super::rendering::{CellMetrics, FontAtlas};
use super::{InputAction, InputSnapshot, Renderer, Scene, SceneCommand};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    /// 16x16 glyph atlas; blocks are drawn when absent or unreadable.
    pub font_path: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Dust".to_string(),
            columns: 80,
            rows: 25,
            cell_width: 8,
            cell_height: 14,
            target_tps: 50,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            font_path: None,
        }
    }
}

impl LoopConfig {
    fn cell_metrics(&self) -> CellMetrics {
        CellMetrics {
            width: self.cell_width.max(1),
            height: self.cell_height.max(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, mut scene: Box<dyn Scene>) -> Result<(), AppError> {
    let metrics = config.cell_metrics();
    let columns = config.columns.max(1);
    let rows = config.rows.max(1);
    let font = load_font(config.font_path.as_ref());

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(columns * metrics.width),
                f64::from(rows * metrics.height),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), columns, rows, metrics, font)
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta = if config.max_frame_delta.is_zero() {
        Duration::from_millis(250)
    } else {
        config.max_frame_delta
    };
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / f64::from(target_tps));
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let mut input_collector = InputCollector::default();
    let mut console = ConsoleBuffer::new(columns, rows);

    scene.load();
    info!(
        target_tps,
        columns,
        rows,
        cell_width = metrics.width,
        cell_height = metrics.height,
        font = renderer.has_font(),
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    accumulator = accumulator.saturating_add(raw_frame_dt.min(max_frame_delta));

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        if scene.update(fixed_dt_seconds, &input_snapshot) == SceneCommand::Quit {
                            info!(reason = "scene_quit", "shutdown_requested");
                            window_target.exit();
                            break;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    scene.render(&mut console);
                    if let Err(error) = renderer.draw(&console) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }

                    let next_title = scene.debug_title();
                    if next_title != last_applied_title {
                        window.set_title(next_title.as_deref().unwrap_or(&config.window_title));
                        last_applied_title = next_title;
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                scene.unload();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn load_font(path: Option<&PathBuf>) -> Option<FontAtlas> {
    let path = path?;
    match FontAtlas::load(path) {
        Ok(font) => {
            info!(path = %path.display(), "font_loaded");
            Some(font)
        }
        Err(error) => {
            warn!(error = %error, "font_load_failed_using_blocks");
            None
        }
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        if key_event.repeat {
            return;
        }
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let Some(action) = action_for_key(key) else {
            return;
        };
        self.action_states.set(action, is_pressed);
        if action == InputAction::Quit && is_pressed {
            self.mark_quit_requested();
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(self.quit_requested, self.action_states);
        self.action_states.clear_pressed();
        snapshot
    }
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::KeyQ | KeyCode::Escape => Some(InputAction::Quit),
        KeyCode::KeyA => Some(InputAction::SpawnActor),
        KeyCode::KeyL => Some(InputAction::RandomLine),
        KeyCode::KeyD => Some(InputAction::RandomWalk),
        KeyCode::KeyF => Some(InputAction::Fill),
        KeyCode::F5 => Some(InputAction::Save),
        KeyCode::F9 => Some(InputAction::Reload),
        KeyCode::Tab => Some(InputAction::NextBoard),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(20);
        let result = plan_sim_steps(Duration::from_millis(65), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(5));
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(20);
        let result = plan_sim_steps(Duration::from_millis(150), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(90));
    }

    #[test]
    fn command_keys_map_to_actions() {
        let cases = [
            (KeyCode::KeyQ, InputAction::Quit),
            (KeyCode::Escape, InputAction::Quit),
            (KeyCode::KeyA, InputAction::SpawnActor),
            (KeyCode::KeyL, InputAction::RandomLine),
            (KeyCode::KeyD, InputAction::RandomWalk),
            (KeyCode::KeyF, InputAction::Fill),
            (KeyCode::F5, InputAction::Save),
            (KeyCode::F9, InputAction::Reload),
            (KeyCode::Tab, InputAction::NextBoard),
        ];
        for (code, action) in cases {
            assert_eq!(action_for_key(PhysicalKey::Code(code)), Some(action));
        }
        assert_eq!(action_for_key(PhysicalKey::Code(KeyCode::KeyZ)), None);
    }

    #[test]
    fn press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyA), true);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.pressed(InputAction::SpawnActor));
        assert!(!second.pressed(InputAction::SpawnActor));
    }

    #[test]
    fn held_key_does_not_retrigger_until_released() {
        let mut input = InputCollector::default();

        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::F5), true);
        assert!(input.snapshot_for_tick().pressed(InputAction::Save));
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::F5), true);
        assert!(!input.snapshot_for_tick().pressed(InputAction::Save));
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::F5), false);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::F5), true);
        assert!(input.snapshot_for_tick().pressed(InputAction::Save));
    }

    #[test]
    fn quit_key_latches_quit_request() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Escape), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Escape), false);

        assert!(input.snapshot_for_tick().quit_requested());
        assert!(input.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn missing_font_path_yields_block_rendering() {
        assert!(load_font(None).is_none());
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_font(Some(&dir.path().join("font.png"))).is_none());
    }
}
