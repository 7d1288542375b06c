//! WayLayout - Visual display layout editor for wlroots compositors
//!
//! Enumerates outputs through wlr-randr, lets the user edit mode, scale,
//! position, rotation and mirroring, snaps outputs against their neighbors,
//! and applies the result back through wlr-randr.

mod backend;
mod config;
mod layout;
mod monitor;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use backend::{BackendError, OutputBackend};
use config::Config;
use layout::{scaling, LayoutController, SnapEngine};
use monitor::{Mode, Monitor, Transform};

/// WayLayout - display layout editor for wlroots compositors
#[derive(Parser)]
#[command(name = "waylayout")]
#[command(author = "WayLayout Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Arrange, rotate and scale compositor outputs", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List outputs and their modes
    List {
        /// Print the monitor list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit one output and apply the new layout
    Set {
        /// Name of the output to edit
        output: String,

        /// New mode as WIDTHxHEIGHT@REFRESH
        #[arg(short, long)]
        mode: Option<String>,

        /// New position as X,Y in real pixels
        #[arg(short, long, allow_hyphen_values = true)]
        pos: Option<String>,

        /// New scale factor
        #[arg(short, long)]
        scale: Option<f64>,

        /// Rotation: normal, 90, 180 or 270 (mirror state is kept)
        #[arg(short, long)]
        transform: Option<String>,

        /// Toggle the mirror state
        #[arg(long)]
        flip: bool,

        /// Enable the output
        #[arg(long, conflicts_with = "off")]
        on: bool,

        /// Disable the output
        #[arg(long)]
        off: bool,

        /// Snap the new position against the other outputs
        #[arg(long, requires = "pos")]
        snap: bool,

        /// Print the resulting layout without applying it
        #[arg(long)]
        dry_run: bool,
    },

    /// Capture a preview screenshot per output
    Preview {
        /// Capture only this output
        output: Option<String>,
    },

    /// Show current configuration
    Config {
        /// Generate sample configuration
        #[arg(long)]
        generate: bool,

        /// Output path for generated config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show external tool availability
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default().unwrap_or_default()
    };

    match cli.command {
        Commands::List { json } => {
            run_list(config, json).await?;
        }
        Commands::Set {
            output,
            mode,
            pos,
            scale,
            transform,
            flip,
            on,
            off,
            snap,
            dry_run,
        } => {
            let edit = Edit {
                output,
                mode,
                pos,
                scale,
                transform,
                flip,
                on,
                off,
                snap,
                dry_run,
            };
            run_set(config, edit).await?;
        }
        Commands::Preview { output } => {
            run_preview(config, output).await?;
        }
        Commands::Config { generate, output } => {
            if generate {
                let sample = config::generate_sample_config();
                if let Some(path) = output {
                    std::fs::write(&path, &sample)?;
                    println!("Configuration written to: {}", path.display());
                } else {
                    println!("{}", sample);
                }
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        Commands::Info => {
            run_info(config).await?;
        }
    }

    Ok(())
}

/// Enumerate outputs and print them
async fn run_list(config: Config, json: bool) -> anyhow::Result<()> {
    let backend = config.randr_backend();
    let monitors = backend
        .enumerate()
        .await
        .context("failed to enumerate outputs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&monitors)?);
        return Ok(());
    }

    for monitor in &monitors {
        print_monitor(monitor);
    }
    Ok(())
}

fn print_monitor(monitor: &Monitor) {
    println!(
        "{} \"{}\" ({})",
        monitor.name,
        monitor.description(),
        if monitor.enabled() { "enabled" } else { "disabled" }
    );
    let position = monitor.position();
    println!(
        "  Position: {},{}  Scale: {}  Transform: {}",
        position.x,
        position.y,
        monitor.scale(),
        monitor.transform()
    );
    println!("  Modes:");
    for mode in monitor.modes() {
        let mut markers = Vec::new();
        if mode.preferred {
            markers.push("preferred");
        }
        if mode.current {
            markers.push("current");
        }
        if markers.is_empty() {
            println!("    {}", mode);
        } else {
            println!("    {} ({})", mode, markers.join(", "));
        }
    }
}

/// One `set` invocation's worth of edits
struct Edit {
    output: String,
    mode: Option<String>,
    pos: Option<String>,
    scale: Option<f64>,
    transform: Option<String>,
    flip: bool,
    on: bool,
    off: bool,
    snap: bool,
    dry_run: bool,
}

/// Route the requested edits through the layout controller, then apply
async fn run_set(config: Config, edit: Edit) -> anyhow::Result<()> {
    let backend = config.randr_backend();
    let monitors = backend
        .enumerate()
        .await
        .context("failed to enumerate outputs")?;

    let mut controller =
        LayoutController::new(monitors, SnapEngine::new(config.layout.snap_distance));
    let mut events = controller.take_event_receiver().expect("fresh controller");
    let name = edit.output.as_str();

    if let Some(spec) = &edit.mode {
        let (width, height, refresh) = parse_mode(spec)?;
        controller.set_resolution(name, &Mode::new(width, height, refresh, false, false))?;
    }

    if let Some(scale) = edit.scale {
        controller.set_scale(name, scale)?;
    }

    if let Some(rotation) = &edit.transform {
        let rotation: Transform = rotation
            .parse()
            .with_context(|| format!("invalid transform: {rotation}"))?;
        // The rotation choice is independent of the mirror state, which is
        // only changed through --flip.
        let mirrored = controller.monitor(name)?.transform().is_mirrored();
        let target = Transform::from_ui_index(rotation.ui_index(), mirrored)
            .expect("ui_index is always 0-3");
        controller.set_transform(name, target)?;
    }

    if edit.flip {
        controller.toggle_mirror(name)?;
    }

    if edit.on != edit.off && controller.monitor(name)?.enabled() == edit.off {
        controller.toggle_enabled(name)?;
    }

    if let Some(pos) = &edit.pos {
        let (x, y) = parse_position(pos)?;
        if edit.snap {
            // Run the position through the drag gesture so it snaps
            // against the other outputs like a canvas drag would.
            let rect = controller.monitor(name)?.canvas_rect();
            controller.begin_drag(name, rect.position())?;
            controller.drag_to((scaling::to_canvas(x, 1.0), scaling::to_canvas(y, 1.0)))?;
            controller.end_drag()?;
        } else {
            controller.set_position(name, x, y)?;
        }
    }

    while let Ok(event) = events.try_recv() {
        tracing::debug!("layout event: {:?}", event);
    }

    if edit.dry_run {
        println!("Resulting layout (not applied):\n");
        for monitor in controller.monitors() {
            print_monitor(monitor);
        }
        return Ok(());
    }

    match controller.save(&backend).await {
        Ok(()) => {
            println!("Configuration applied.");
            Ok(())
        }
        Err(BackendError::ToolUnavailable(tool)) => {
            println!("{} is not installed; the compositor was left unchanged.", tool);
            Err(BackendError::ToolUnavailable(tool)).context("failed to apply configuration")
        }
        Err(e) => Err(e).context("failed to apply configuration"),
    }
}

fn parse_mode(spec: &str) -> anyhow::Result<(i32, i32, i32)> {
    let invalid = || anyhow::anyhow!("invalid mode (expected WIDTHxHEIGHT@REFRESH): {spec}");
    let (resolution, refresh) = spec.split_once('@').ok_or_else(invalid)?;
    let (width, height) = resolution.split_once('x').ok_or_else(invalid)?;
    Ok((
        width.parse().map_err(|_| invalid())?,
        height.parse().map_err(|_| invalid())?,
        refresh.trim_end_matches("Hz").parse().map_err(|_| invalid())?,
    ))
}

fn parse_position(spec: &str) -> anyhow::Result<(i32, i32)> {
    let invalid = || anyhow::anyhow!("invalid position (expected X,Y): {spec}");
    let (x, y) = spec.split_once(',').ok_or_else(invalid)?;
    Ok((
        x.trim().parse().map_err(|_| invalid())?,
        y.trim().parse().map_err(|_| invalid())?,
    ))
}

/// Capture preview screenshots
async fn run_preview(config: Config, output: Option<String>) -> anyhow::Result<()> {
    let backend = config.randr_backend();
    let shooter = config.screenshooter();
    let monitors = backend
        .enumerate()
        .await
        .context("failed to enumerate outputs")?;

    let mut captured = 0;
    for monitor in monitors
        .iter()
        .filter(|m| output.as_deref().map_or(true, |o| m.name == o))
    {
        match shooter.capture(monitor).await {
            Ok(path) => {
                let path = path.keep().context("failed to keep screenshot file")?;
                println!("{}: {}", monitor.name, path.display());
                captured += 1;
            }
            Err(BackendError::ToolUnavailable(tool)) => {
                // Previews are cosmetic; a missing grabber only means no
                // content, not a failed run.
                println!("{} is not installed; previews unavailable.", tool);
                break;
            }
            Err(e) => {
                tracing::warn!("could not capture {}: {}", monitor.name, e);
            }
        }
    }

    if captured == 0 && output.is_some() {
        anyhow::bail!("no preview captured for {}", output.unwrap());
    }
    Ok(())
}

/// Report external tool availability
async fn run_info(config: Config) -> anyhow::Result<()> {
    println!("WayLayout System Information");
    println!("============================\n");

    let backend = config.randr_backend();
    match backend.enumerate().await {
        Ok(monitors) => {
            println!("{}: ok ({} outputs)", config.tools.wlr_randr, monitors.len());
        }
        Err(e) => {
            println!("{}: unavailable ({})", config.tools.wlr_randr, e);
        }
    }

    let shooter = config.screenshooter();
    if shooter.available().await {
        println!("{}: ok", config.tools.grim);
    } else {
        println!("{}: unavailable (previews disabled)", config.tools.grim);
    }

    println!("\nCanvas grid scale: 1:{}", scaling::GRID_SCALE);
    println!("Snap distance: {} canvas px", config.layout.snap_distance);
    Ok(())
}
