use std::path::PathBuf;

use clap::ValueHint;

#[derive(Debug, clap::Parser)]
#[command(author, version, about = "Binary STL viewer for the terminal")]
pub struct Cli {
    /// Viewer settings file; defaults to stlview.toml in the working directory
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Target frame rate, overriding the config file
    #[arg(long, value_name = "N")]
    pub fps: Option<u32>,
    /// Model to load at startup
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,
}
