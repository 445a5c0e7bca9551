use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use flipbook::camera::OrbitCamera;
use flipbook::cli::Cli;
use flipbook::display::Display;
use flipbook::loaders;
use flipbook::picking::PickRouter;
use flipbook::player::{PlaybackConfig, SequencePlayer};
use flipbook::render::Renderer;
use flipbook::scene::{self, find_named, Node, NodeHandle, RedrawFlag};
use flipbook::schedule::Scheduler;
use flipbook::sequence::{DirLocator, SequenceId};
use flipbook::texture::FsLoader;

const INITIAL_WINDOW_WIDTH: u32 = 800;
const INITIAL_WINDOW_HEIGHT: u32 = 600;

// Placement from the shipped diorama: camera across the room, television
// tucked into the aquarium.
const CAMERA_POSITION: Vec3 = Vec3::new(139.0, 11.0, 155.0);
const CAMERA_TARGET: Vec3 = Vec3::new(20.0, 90.0, -16.0);
const MIN_ORBIT_DISTANCE: f32 = 10.0;
const MAX_ORBIT_DISTANCE: f32 = 600_000.0;
const TV_POSITION: Vec3 = Vec3::new(34.0, 8.0, -31.0);
const TV_SCALE: Vec3 = Vec3::new(4.0, 5.0, 1.0);

// A press-to-release cursor travel under this many pixels counts as a
// click rather than the tail end of an orbit drag.
const CLICK_SLOP_PX: f32 = 5.0;

struct Viewer {
    window: Arc<Window>,
    display: Display,
    renderer: Renderer,
    camera: OrbitCamera,
    world: NodeHandle,
    router: PickRouter,
    scheduler: Scheduler,
    redraw: RedrawFlag,
    // Kept alive for the life of the window; dropping it would cancel
    // the playback cadence.
    _player: Option<SequencePlayer>,
    started: Instant,
    render_scale: f32,
    press_cursor: Option<(f32, f32)>,
}

impl Viewer {
    fn new(cli: &Cli, window: Arc<Window>) -> Result<Self> {
        let display = Display::new(window.clone())?;
        let scheduler = Scheduler::new();
        let redraw = RedrawFlag::new();
        let world = Node::new("world");

        let mut camera = OrbitCamera::from_position_target(CAMERA_POSITION, CAMERA_TARGET);
        camera.min_distance = MIN_ORBIT_DISTANCE;
        camera.max_distance = MAX_ORBIT_DISTANCE;

        // Diorama, optionally with its baked texture, recentered on its
        // bounds so the orbit target sits in the middle of the model.
        let aquarium = loaders::load_scene(&cli.scene_model)?;
        if let Some(texture_path) = &cli.scene_texture {
            let locator = texture_path.to_string_lossy();
            let baked = FsLoader::load_sync(&locator)
                .with_context(|| format!("failed to load scene texture {locator}"))?;
            scene::apply_texture(&aquarium, &baked);
        }
        if let Some(bounds) = scene::world_bounds(&aquarium) {
            aquarium.borrow_mut().position = -bounds.center();
            camera.retarget(Vec3::ZERO);
        }
        world.borrow_mut().children.push(aquarium);

        // Television prop with the animated screen.
        let tv = loaders::load_scene(&cli.tv_model)?;
        tv.borrow_mut().position = TV_POSITION;
        tv.borrow_mut().scale = TV_SCALE;
        world.borrow_mut().children.push(tv.clone());

        let mut router = PickRouter::new();
        let player = match find_named(&tv, &cli.screen_mesh) {
            Some(screen) => {
                let config = PlaybackConfig::new(
                    cli.frame_count,
                    cli.frame_rate,
                    DirLocator::new(cli.frames_dir.clone()),
                );
                let player = SequencePlayer::new(
                    config,
                    Rc::downgrade(&screen),
                    scheduler.clone(),
                    Rc::new(FsLoader::new(scheduler.clone())),
                    redraw.clone(),
                );

                let initial = SequenceId::new(cli.initial_sequence.as_str());
                let alternate = SequenceId::new(cli.alternate_sequence.as_str());
                player.start(initial.clone())?;

                let toggle_player = player.clone();
                router.register(Rc::downgrade(&screen), move || {
                    let next = match toggle_player.current_sequence() {
                        Some(current) if current == initial => alternate.clone(),
                        _ => initial.clone(),
                    };
                    log::info!("screen clicked, switching to {next}");
                    toggle_player.switch_to(next);
                });

                Some(player)
            }
            None => {
                log::warn!(
                    "mesh {:?} not found in {}; screen will stay static",
                    cli.screen_mesh,
                    cli.tv_model.display()
                );
                None
            }
        };

        let size = window.inner_size();
        let mut viewer = Self {
            window,
            display,
            renderer: Renderer::new(1, 1),
            camera,
            world,
            router,
            scheduler,
            redraw,
            _player: player,
            started: Instant::now(),
            render_scale: cli.render_scale.clamp(0.05, 1.0),
            press_cursor: None,
        };
        viewer.resize(size.width, size.height);
        viewer.redraw.request();
        Ok(viewer)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.display.resize(width, height);
        let fw = ((width as f32 * self.render_scale) as u32).max(1);
        let fh = ((height as f32 * self.render_scale) as u32).max(1);
        self.display.set_frame_size(fw, fh);
        self.renderer.resize(fw, fh);
        self.redraw.request();
    }

    fn handle_click(&mut self, x: f32, y: f32) {
        let size = self.window.inner_size();
        let toggled = self.router.handle_pointer_event(
            x,
            y,
            size.width as f32,
            size.height as f32,
            &self.camera,
            &self.world,
        );
        if toggled {
            log::debug!("click at ({x:.0}, {y:.0}) toggled a surface");
        }
    }

    /// Pump timers and loads, then redraw if anything asked for it.
    fn frame(&mut self) {
        self.scheduler.advance_to(self.started.elapsed());
        if self.redraw.take() {
            let pixels = self.renderer.render(&self.camera, &self.world);
            if let Err(err) = self.display.present(&pixels) {
                log::error!("present failed: {err:#}");
            }
        }
    }
}

struct App {
    cli: Cli,
    viewer: Option<Viewer>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Aquarium")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    INITIAL_WINDOW_WIDTH,
                    INITIAL_WINDOW_HEIGHT,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(err) => {
                log::error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        match Viewer::new(&self.cli, window) {
            Ok(viewer) => self.viewer = Some(viewer),
            Err(err) => {
                log::error!("failed to initialize viewer: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(size) => {
                viewer.resize(size.width, size.height);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    viewer.press_cursor = viewer.camera.cursor();
                }
                ElementState::Released => {
                    if let (Some((px, py)), Some((cx, cy))) =
                        (viewer.press_cursor.take(), viewer.camera.cursor())
                    {
                        let travel = ((cx - px).powi(2) + (cy - py).powi(2)).sqrt();
                        if travel < CLICK_SLOP_PX {
                            viewer.handle_click(cx, cy);
                        }
                    }
                }
            },
            WindowEvent::RedrawRequested => {
                viewer.frame();
                return;
            }
            _ => {}
        }

        // Orbit and dolly; any camera motion needs a repaint.
        let was = (viewer.camera.yaw, viewer.camera.pitch, viewer.camera.distance);
        viewer.camera.process_event(&event);
        if was != (viewer.camera.yaw, viewer.camera.pitch, viewer.camera.distance) {
            viewer.redraw.request();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Keep pumping so the animation cadence runs between inputs.
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    log::info!("controls: drag to orbit, scroll to dolly, click the screen to switch sequences");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App { cli, viewer: None };
    event_loop.run_app(&mut app)?;
    Ok(())
}
