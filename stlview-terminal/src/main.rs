/// stlview - binary STL viewer for the terminal
///
/// Usage: stlview [--config <PATH>] [--fps <N>] [FILE]
/// Controls:
///   - Drop a file onto the terminal: load it
///   - WASD / Arrow Keys: Rotate the model
///   - Space: Toggle auto-spin, R: Reset rotation
///   - C: Unload, Q/ESC: Quit

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use stlview_terminal::{TerminalApp, ViewerConfig};

mod cli;

fn init_logging(config: &ViewerConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .target(env_logger::Target::Pipe(Box::new(file)))
    .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let mut config = ViewerConfig::discover(args.config.as_deref())?;
    if let Some(fps) = args.fps {
        config = config.with_fps(fps);
    }
    init_logging(&config)?;
    log::info!("starting stlview with {:?}", config);

    let log_file = config.log_file.clone();
    let mut app = TerminalApp::new(config).context("failed to query terminal size")?;
    if let Some(model) = args.file {
        app.open(model).context("failed to start loader thread")?;
    }
    app.run().context("terminal error")?;

    log::info!("graceful shutdown");
    println!("Log written to {}", log_file.display());
    Ok(())
}
