//! Cliplab CLI — Command-line interface for timeline inspection and export.
//!
//! Usage:
//!   cliplab info <TIMELINE>      Show timeline information
//!   cliplab plan <TIMELINE>      Print the compositing plan
//!   cliplab export <TIMELINE>    Render a timeline to video
//!   cliplab check                Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod timeline;

#[derive(Parser)]
#[command(
    name = "cliplab",
    about = "Timeline compositing and video export",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show timeline information
    Info {
        /// Path to the timeline JSON file
        path: PathBuf,
    },

    /// Build and print the compositing plan without rendering
    Plan {
        /// Path to the timeline JSON file
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "mp4")]
        format: String,

        /// Resolution multiplier
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Emit the full plan as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Render a timeline to a video file
    Export {
        /// Path to the timeline JSON file
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: mp4, webm
        #[arg(long, default_value = "mp4")]
        format: String,

        /// Quality preset: draft, standard, high
        #[arg(long, default_value = "standard")]
        quality: String,

        /// Encoder speed: ultrafast, fast, medium, slow
        #[arg(long, default_value = "medium")]
        speed: String,

        /// Resolution multiplier
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Frame rate
        #[arg(long, default_value = "30")]
        fps: u32,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    cliplab_common::logging::init_logging(&cliplab_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Info { path } => commands::info::run(path),
        Commands::Plan {
            path,
            format,
            scale,
            json,
        } => commands::plan::run(path, format, scale, json),
        Commands::Export {
            path,
            output,
            format,
            quality,
            speed,
            scale,
            fps,
        } => commands::export::run(path, output, format, quality, speed, scale, fps).await,
        Commands::Check => commands::check::run(),
    }
}
