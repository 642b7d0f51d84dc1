//! modsynth - two-operator FM/AM synthesizer for the terminal
//!
//! Run with: cargo run --release -- --preset bell

mod app;
mod audio;
mod controls;
mod keymap;
mod midi_input;
mod ui;

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use modsynth::patch::PresetCatalog;
use tracing_subscriber::EnvFilter;

use app::{App, Options};

#[derive(Debug, Parser)]
#[command(name = "modsynth", version, about = "Two-operator FM/AM synthesizer")]
struct Args {
    /// Preset to load at startup
    #[arg(long)]
    preset: Option<String>,

    /// Print the bundled preset names and exit
    #[arg(long)]
    list_presets: bool,

    /// Maximum simultaneous voices (1-8)
    #[arg(long)]
    max_voices: Option<usize>,

    /// Only open MIDI inputs whose name contains this
    #[arg(long)]
    midi_port: Option<String>,

    /// Keyboard only, no MIDI
    #[arg(long)]
    no_midi: bool,

    /// Log destination; the terminal belongs to the UI
    #[arg(long, default_value = "modsynth.log")]
    log_file: PathBuf,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let catalog = PresetCatalog::bundled()?;
    if args.list_presets {
        for name in catalog.names() {
            println!("{name}");
        }
        return Ok(());
    }

    init_logging(&args.log_file)?;

    let app = App::new(
        Options {
            preset: args.preset,
            max_voices: args.max_voices,
            midi_port: args.midi_port,
            no_midi: args.no_midi,
        },
        catalog,
    )?;

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}

fn init_logging(path: &Path) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
