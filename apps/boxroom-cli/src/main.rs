use boxroom_camera::{Camera, CameraController, MovementConfig, MovementPolicy};
use boxroom_input::{Action, InputSnapshot};
use boxroom_render::{DebugTextRenderer, Projection, RenderView, Renderer};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boxroom-cli", about = "Headless tools for the boxroom camera model")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and the default movement config
    Info,
    /// Drive the camera through scripted frames and print each rendered view
    Simulate {
        /// Movement policy; overrides the config file
        #[arg(short, long, value_enum)]
        policy: Option<MovementPolicy>,
        /// Number of frames to simulate
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        /// Actions held for every frame
        #[arg(long = "hold", value_enum)]
        hold: Vec<ActionArg>,
        /// Horizontal mouse delta per frame
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        mouse_dx: i32,
        /// Vertical mouse delta per frame
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        mouse_dy: i32,
        /// Print every Nth frame
        #[arg(long, default_value = "10")]
        every: u32,
        /// JSON file with movement settings
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ActionArg {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Crouch,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Forward => Action::Forward,
            ActionArg::Back => Action::Back,
            ActionArg::Left => Action::Left,
            ActionArg::Right => Action::Right,
            ActionArg::Jump => Action::JumpOrUp,
            ActionArg::Crouch => Action::CrouchOrDown,
        }
    }
}

struct Script {
    frames: u32,
    dt: f32,
    hold: Vec<Action>,
    mouse: (i32, i32),
    every: u32,
}

/// Run the script and return the printed frames plus the final camera.
fn simulate(config: MovementConfig, script: &Script) -> (Vec<String>, Camera) {
    let mut controller = CameraController::new(Camera::default(), config);
    let mut renderer = DebugTextRenderer::new();
    let projection = Projection::default();
    let every = script.every.max(1);

    let mut frame_input = InputSnapshot::new(script.dt).with_mouse(script.mouse.0, script.mouse.1);
    for action in &script.hold {
        frame_input = frame_input.with_action(*action);
    }

    let mut printed = Vec::new();
    for frame in 1..=script.frames {
        controller.update(&frame_input);
        let view = RenderView::from_camera(&controller.camera, projection);
        let text = renderer.render(&view);
        if frame % every == 0 || frame == script.frames {
            printed.push(text);
        }
        tracing::debug!(
            frame,
            y = controller.camera.position.y,
            grounded = controller.camera.grounded,
            "stepped"
        );
    }
    (printed, controller.camera)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("boxroom-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", boxroom_input::crate_info());
            println!("camera: {}", boxroom_camera::crate_info());
            println!("render: {}", boxroom_render::crate_info());
            println!("assets: {}", boxroom_assets::crate_info());
            println!(
                "default movement config:\n{}",
                serde_json::to_string_pretty(&MovementConfig::default())?
            );
        }
        Commands::Simulate {
            policy,
            frames,
            dt,
            hold,
            mouse_dx,
            mouse_dy,
            every,
            config,
        } => {
            let mut config = MovementConfig::load_or_default(config.as_deref())?;
            if let Some(policy) = policy {
                config.policy = policy;
            }
            let script = Script {
                frames,
                dt,
                hold: hold.into_iter().map(Action::from).collect(),
                mouse: (mouse_dx, mouse_dy),
                every,
            };
            println!(
                "Simulating {frames} frames at dt={dt} with {:?} movement",
                config.policy
            );

            let (printed, camera) = simulate(config, &script);
            for text in printed {
                print!("{text}");
            }
            println!(
                "Final: pos=({:.3}, {:.3}, {:.3}) yaw={:.2} pitch={:.2} vy={:.3} grounded={}",
                camera.position.x,
                camera.position.y,
                camera.position.z,
                camera.yaw,
                camera.pitch,
                camera.vertical_velocity,
                camera.grounded
            );
        }
    }

    Ok(())
}
