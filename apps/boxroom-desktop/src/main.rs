use anyhow::{Context, Result};
use boxroom_assets::TextureImage;
use boxroom_camera::{Camera, CameraController, MovementConfig, MovementPolicy};
use boxroom_input::{Action, Bindings, FrameInput};
use boxroom_render::{Projection, RenderView};
use boxroom_render_wgpu::{RoomMaterial, ShaderPolicy, WgpuRenderer};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

/// Exit status for any startup failure; the shell sees -1 as 255.
const INIT_FAILURE: u8 = 255;

/// Longest frame step fed to the camera, in seconds.
const MAX_FRAME_SECONDS: f32 = 0.1;

#[derive(Parser)]
#[command(name = "boxroom-desktop", about = "Walk around a box room")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Movement policy; overrides the config file
    #[arg(long, value_enum)]
    policy: Option<MovementPolicy>,

    /// Room surface
    #[arg(long, value_enum, default_value = "colored")]
    variant: VariantArg,

    /// Directories searched for the room texture (textured variant)
    #[arg(long = "texture-dir", default_values = ["assets", "textures", "."])]
    texture_dirs: Vec<PathBuf>,

    /// Abort at startup if the shader program fails to build
    #[arg(long)]
    strict_shaders: bool,

    /// Window width in pixels
    #[arg(long, default_value = "800")]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value = "600")]
    height: u32,

    /// JSON file with movement settings
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VariantArg {
    Colored,
    Textured,
}

fn load_movement_config(
    path: Option<&Path>,
    policy: Option<MovementPolicy>,
) -> Result<MovementConfig> {
    let mut config = MovementConfig::load_or_default(path)?;
    if let Some(policy) = policy {
        config.policy = policy;
    }
    Ok(config)
}

fn default_bindings() -> Bindings<KeyCode> {
    Bindings::new()
        .with(KeyCode::KeyW, Action::Forward)
        .with(KeyCode::ArrowUp, Action::Forward)
        .with(KeyCode::KeyS, Action::Back)
        .with(KeyCode::ArrowDown, Action::Back)
        .with(KeyCode::KeyA, Action::Left)
        .with(KeyCode::ArrowLeft, Action::Left)
        .with(KeyCode::KeyD, Action::Right)
        .with(KeyCode::ArrowRight, Action::Right)
        .with(KeyCode::Space, Action::JumpOrUp)
        .with(KeyCode::ControlLeft, Action::CrouchOrDown)
        .with(KeyCode::KeyC, Action::CrouchOrDown)
        .with(KeyCode::Escape, Action::Quit)
}

/// Application state.
struct AppState {
    controller: CameraController,
    input: FrameInput,
    bindings: Bindings<KeyCode>,
    projection: Projection,
    last_frame: Instant,
}

impl AppState {
    fn new(config: MovementConfig, width: u32, height: u32) -> Self {
        Self {
            controller: CameraController::new(Camera::default(), config),
            input: FrameInput::new(),
            bindings: default_bindings(),
            projection: Projection::for_viewport(width, height),
            last_frame: Instant::now(),
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if let Some(action) = self.bindings.action_for(&key) {
            self.input.set_action(action, pressed);
        }
    }

    fn quit_requested(&self) -> bool {
        self.input.is_down(Action::Quit)
    }

    /// Snapshot input, advance the camera, and produce this frame's view.
    fn update(&mut self) -> RenderView {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(MAX_FRAME_SECONDS);
        self.last_frame = now;

        let snapshot = self.input.snapshot(dt);
        self.controller.update(&snapshot);
        RenderView::from_camera(&self.controller.camera, self.projection)
    }
}

/// GPU resources. Fields drop top to bottom, the reverse of acquisition.
struct Gpu {
    renderer: WgpuRenderer,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    queue: wgpu::Queue,
    device: wgpu::Device,
}

impl Gpu {
    fn new(
        window: Arc<Window>,
        material: RoomMaterial<'_>,
        shader_policy: ShaderPolicy,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let size = window.inner_size();
        let surface = instance
            .create_surface(window)
            .context("creating rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible graphics adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("boxroom_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating graphics device")?;

        // Runtime validation errors are reported, not fatal.
        device.on_uncaptured_error(Box::new(|err: wgpu::Error| {
            tracing::error!("graphics device error: {err}");
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface supports no formats on this adapter")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            material,
            shader_policy,
        )
        .context("creating room renderer")?;

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            renderer,
            surface,
            config,
            queue,
            device,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn draw(&mut self, view: &RenderView) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.render(&self.device, &self.queue, &target, view);
        output.present();
    }
}

struct GpuApp {
    state: AppState,
    // Dropped before the window it renders into.
    gpu: Option<Gpu>,
    window: Option<Arc<Window>>,
    texture: Option<TextureImage>,
    shader_policy: ShaderPolicy,
    size: PhysicalSize<u32>,
    failure: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(
        config: MovementConfig,
        texture: Option<TextureImage>,
        shader_policy: ShaderPolicy,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            state: AppState::new(config, width, height),
            gpu: None,
            window: None,
            texture,
            shader_policy,
            size: PhysicalSize::new(width, height),
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("boxroom")
            .with_inner_size(self.size);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("creating window")?,
        );

        let material = match &self.texture {
            Some(image) => RoomMaterial::Texture(image),
            None => RoomMaterial::VertexColor,
        };
        let gpu = Gpu::new(window.clone(), material, self.shader_policy)?;

        capture_mouse(&window);
        let size = window.inner_size();
        self.state.projection.set_viewport(size.width, size.height);
        self.state.last_frame = Instant::now();

        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }
}

fn capture_mouse(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        tracing::warn!("could not capture the mouse: {e}");
    }
    window.set_cursor_visible(false);
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.failure.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                    self.state
                        .projection
                        .set_viewport(gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::Focused(false) => {
                self.state.input.release_all();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                let view = self.state.update();
                if self.state.quit_requested() {
                    tracing::info!("quit requested");
                    event_loop.exit();
                    return;
                }

                if let Some(gpu) = &mut self.gpu {
                    gpu.draw(&view);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.input.add_mouse_motion(delta.0, delta.1);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_movement_config(cli.config.as_deref(), cli.policy)?;
    tracing::info!(policy = ?config.policy, "movement configured");

    let texture = match cli.variant {
        VariantArg::Colored => None,
        VariantArg::Textured => {
            let (_, image) = boxroom_assets::find_placeholder(&cli.texture_dirs)
                .context("loading room texture")?;
            Some(image)
        }
    };

    let shader_policy = if cli.strict_shaders {
        ShaderPolicy::Strict
    } else {
        ShaderPolicy::Permissive
    };

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config, texture, shader_policy, cli.width, cli.height);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("boxroom-desktop starting");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("startup failed: {e:#}");
            ExitCode::from(INIT_FAILURE)
        }
    }
}
