// SPDX-License-Identifier: GPL-3.0-only

use camera_panel::config::Config;
use camera_panel::constants::APP_DIR_NAME;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-panel")]
#[command(about = "Control panel for a network camera: live feed, focus, backlight and recording")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Base URL of the camera server (overrides the config file)
    #[arg(long, global = true)]
    camera_url: Option<String>,

    /// Path of the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the terminal panel (default)
    Terminal,

    /// Set the focus level
    Focus {
        /// Focus level, 0-100
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        value: u8,
    },

    /// Switch backlight compensation
    Backlight {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Show the camera's backlight state
    Status,

    /// Record the video feed without the terminal UI
    Record {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Output directory (default: the download directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let terminal_mode = matches!(cli.command, None | Some(Commands::Terminal));

    init_logging(terminal_mode);
    tracing::info!(version = env!("GIT_VERSION"), "Starting camera-panel");

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(url) = cli.camera_url {
        config = config.with_camera_url(url);
    }

    match cli.command {
        None | Some(Commands::Terminal) => camera_panel::terminal::run(config),
        Some(Commands::Focus { value }) => cli::set_focus(&config, value),
        Some(Commands::Backlight { state }) => {
            cli::set_backlight(&config, matches!(state, Switch::On))
        }
        Some(Commands::Status) => cli::show_status(&config),
        Some(Commands::Record { duration, output }) => cli::record(config, duration, output),
    }
}

/// Initialize logging
///
/// Set RUST_LOG environment variable to control log level
/// Examples: RUST_LOG=debug, RUST_LOG=camera_panel=debug, RUST_LOG=info
///
/// The terminal panel owns the screen, so it logs to a file in the cache
/// directory instead of stderr.
fn init_logging(terminal_mode: bool) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    if terminal_mode && let Some(file) = open_log_file() {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join(APP_DIR_NAME);
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(format!("{}.log", APP_DIR_NAME)))
        .ok()
}
