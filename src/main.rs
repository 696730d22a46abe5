mod app;
mod clock;
mod config;
mod drag;
mod economy;
mod effects;
mod input;
mod model;
mod mood;
mod needs;
mod render;
mod sim;
mod soil;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "blobgotchi")]
#[command(about = "Terminal virtual pet: feed it, play with it, clean up after it", long_about = None)]
struct Args {
    /// Seed for the soiling generator (default: settings, else entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Monochrome output
    #[arg(long, default_value_t = false)]
    no_color: bool,

    /// FPS cap (render rate); the simulation runs on its own timers
    #[arg(long)]
    fps: Option<u32>,

    /// Run without a terminal for this many simulated seconds, printing JSON snapshots
    #[arg(long, value_name = "SECONDS")]
    headless: Option<u64>,
}

fn init_file_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = config::project_paths()?;

    // the interactive UI owns the terminal, so its logs go to a file
    if args.headless.is_some() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    } else {
        init_file_logging(&paths.log_path)?;
    }

    let mut settings = config::load_settings(&paths.settings_path);
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    if args.no_color {
        settings.enable_color = false;
    }
    if let Some(fps) = args.fps {
        settings.fps_cap = fps;
    }

    match args.headless {
        Some(seconds) => app::run_headless(settings, seconds),
        None => app::run(settings, paths),
    }
}
