use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window, WindowId},
};

use escape_room::config::{Args, GameConfig};
use escape_room::controller::{
    FpsCounter, FrameClock, GameSession, InputEvent, InputProcessor, InputState, KeyBindings, SessionCommand,
};
use escape_room::logging;
use escape_room::model::level::{MESH_FILES, REQUIRED_MESHES};
use escape_room::view::{layout_texts, GpuContext, MeshLibrary, Renderer, TextOverlay, TextureSet};

/// Wheel pixels treated as one line on touchpads.
const PIXELS_PER_LINE: f32 = 40.0;

enum Flow {
    Continue,
    Exit(i32),
}

/// Everything that exists once the window is up.
struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    overlay: TextOverlay,
    session: GameSession,
    input: InputState,
    processor: InputProcessor,
    clock: FrameClock,
    fps: FpsCounter,
    cursor_captured: bool,
}

impl Running {
    fn set_cursor_captured(&mut self, captured: bool) {
        self.cursor_captured = captured;
        if captured {
            if let Err(err) = self.window.set_cursor_grab(CursorGrabMode::Locked) {
                tracing::debug!(error = %err, "locked grab unavailable, confining cursor");
                if let Err(err) = self.window.set_cursor_grab(CursorGrabMode::Confined) {
                    tracing::warn!(error = %err, "cursor grab failed");
                }
            }
        } else if let Err(err) = self.window.set_cursor_grab(CursorGrabMode::None) {
            tracing::warn!(error = %err, "cursor release failed");
        }
        self.window.set_cursor_visible(!captured);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.renderer.resize(width, height);
        self.session.resize(width, height);
    }

    fn apply(&mut self, command: SessionCommand) -> Flow {
        match command {
            SessionCommand::Quit => {
                tracing::info!("quit requested");
                return Flow::Exit(0);
            }
            SessionCommand::Exit(code) => {
                tracing::info!(code, "exit with status requested");
                return Flow::Exit(code);
            }
            SessionCommand::ReloadShaders => self.renderer.reload_shaders(),
            SessionCommand::CaptureCursor(captured) => self.set_cursor_captured(captured),
        }
        Flow::Continue
    }

    /// Drains queued input into the session, then advances it by `dt`.
    fn update(&mut self, dt: f32) -> Flow {
        for _ in 0..self.input.consume_left_clicks() {
            self.session.toggle_look();
        }
        let (dx, dy) = self.input.consume_look();
        self.session.look(dx, dy);
        let scroll = self.input.consume_scroll();
        if scroll != 0.0 {
            self.session.scroll(scroll);
        }

        for code in self.input.consume_key_presses() {
            let Some(action) = self.processor.action_for_key(code, self.input.modifiers) else {
                continue;
            };
            tracing::debug!(?code, ?action, "key action");
            if let Some(command) = self.session.handle_action(action) {
                if let Flow::Exit(code) = self.apply(command) {
                    return Flow::Exit(code);
                }
            }
        }

        let held = self.processor.held_directions(&self.input);
        if let Some(command) = self.session.update(dt, held) {
            if let Flow::Exit(code) = self.apply(command) {
                return Flow::Exit(code);
            }
        }

        if let Some(fps) = self.fps.record(dt) {
            tracing::debug!(fps, "frame rate");
        }
        Flow::Continue
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.begin_frame(self.session.view_proj(), self.session.eye());
        for draw in self.session.draw_list() {
            if let Err(err) = self.renderer.draw_object(draw.mesh, draw.model, draw.object) {
                tracing::warn!(error = %err, "draw skipped");
            }
        }

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        self.renderer.encode(&mut encoder, &view);

        let overlay_frame = layout_texts(&self.session, &self.fps.label());
        self.overlay.encode(&self.window, &self.gpu, &mut encoder, &view, &overlay_frame);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn load_meshes(gpu: &GpuContext, args: &Args) -> anyhow::Result<MeshLibrary> {
    let mut meshes = MeshLibrary::new();
    for file in MESH_FILES {
        let path = args.assets.join(file);
        meshes
            .load_file(&gpu.device, &path)
            .with_context(|| format!("loading level mesh {}", path.display()))?;
    }
    if let Some(extra) = &args.extra_model {
        meshes
            .load_file(&gpu.device, extra)
            .with_context(|| format!("loading extra model {}", extra.display()))?;
    }
    meshes.require(&REQUIRED_MESHES).context("level meshes incomplete")?;
    Ok(meshes)
}

struct App {
    args: Args,
    config: GameConfig,
    running: Option<Running>,
    error: Option<anyhow::Error>,
    exit_code: Option<i32>,
}

impl App {
    fn new(args: Args, config: GameConfig) -> Self {
        Self { args, config, running: None, error: None, exit_code: None }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Running> {
        let (width, height) = self.config.window_size;
        let attributes = Window::default_attributes()
            .with_title(self.config.window_title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(attributes).context("creating window")?);

        let gpu = pollster::block_on(GpuContext::new(window.clone())).context("initializing GPU")?;
        let meshes = load_meshes(&gpu, &self.args)?;
        let textures = TextureSet::load(&gpu.device, &gpu.queue, &self.args.assets).context("loading textures")?;
        let renderer =
            Renderer::new(&gpu, meshes, textures, self.args.shader.clone()).context("building scene pipeline")?;
        let overlay = TextOverlay::new(&window, &gpu);

        let size = window.inner_size();
        let session = GameSession::new(self.config.clone(), size.width, size.height);

        let mut running = Running {
            window,
            gpu,
            renderer,
            overlay,
            session,
            input: InputState::new(),
            processor: InputProcessor::new(KeyBindings::default()),
            clock: FrameClock::new(),
            fps: FpsCounter::new(self.config.fps_interval),
            cursor_captured: false,
        };
        running.set_cursor_captured(true);
        tracing::info!(width = size.width, height = size.height, "escape room ready");
        Ok(running)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(err) => {
                tracing::error!(error = ?err, "start-up failed");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        running.overlay.on_window_event(&running.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => running.resize(size.width, size.height),
            WindowEvent::Focused(false) => running.input.process_event(&InputEvent::FocusLost),
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, repeat, .. },
                ..
            } => {
                let event = match state {
                    ElementState::Pressed => InputEvent::KeyDown { code, repeat },
                    ElementState::Released => InputEvent::KeyUp(code),
                };
                running.input.process_event(&event);
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                running.input.process_event(&InputEvent::ModifiersChanged(modifiers.state()));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                running.input.process_event(&InputEvent::MouseClick {
                    button: button.into(),
                    is_down: state == ElementState::Pressed,
                });
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                running.input.process_event(&InputEvent::MouseWheel { delta_y });
            }
            WindowEvent::RedrawRequested => {
                let dt = running.clock.tick();
                if let Flow::Exit(code) = running.update(dt) {
                    self.exit_code = Some(code);
                    event_loop.exit();
                    return;
                }

                match running.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => running.gpu.reconfigure(),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("surface out of memory, exiting");
                        self.exit_code = Some(1);
                        event_loop.exit();
                        return;
                    }
                    Err(err) => tracing::warn!(error = ?err, "frame dropped"),
                }
                running.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta } = event {
            if running.cursor_captured {
                running.input.process_event(&InputEvent::MouseMove { dx: delta.0 as f32, dy: delta.1 as f32 });
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();
    tracing::info!(assets = %args.assets.display(), shader = ?args.shader, "starting");

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(args, GameConfig::default());
    event_loop.run_app(&mut app).context("running event loop")?;

    if let Some(err) = app.error.take() {
        return Err(err);
    }
    match app.exit_code {
        Some(code) if code != 0 => {
            drop(app);
            std::process::exit(code);
        }
        _ => Ok(()),
    }
}
