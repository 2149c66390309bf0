//! Tonewheel CLI - play and render the tonewheel synth.

mod commands;
mod device;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tonewheel")]
#[command(author, version, about = "Tonewheel polyphonic synth", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a session to a WAV file
    Render(commands::render::RenderArgs),

    /// Play a session on an audio device
    Play(commands::play::PlayArgs),

    /// List factory sessions or show one
    Sessions(commands::sessions::SessionsArgs),

    /// List the built-in patches
    Patches(commands::patches::PatchesArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Sessions(args) => commands::sessions::run(args),
        Commands::Patches(args) => commands::patches::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
