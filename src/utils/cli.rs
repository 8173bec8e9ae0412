use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "cold-mail")]
#[command(about = "Draft cold outreach emails from careers pages using an LLM and your portfolio", long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// URL of the careers page or job posting; omit to enter URLs interactively
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,

    /// Sets the logger's verbosity level
    #[arg(short, long, value_name = "VERBOSITY", default_value_t = LevelFilter::Info)]
    pub verbosity: LevelFilter,
}
