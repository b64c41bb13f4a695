//! negtrack: word-by-word sentence verification with mouse tracking.

mod app;
mod cli;
mod config;
mod surface;

use app::App;
use clap::Parser;
use cli::Cli;
use config::AppConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    config.apply_cli(&cli);
    config.validate()?;

    info!(
        variant = ?config.experiment.variant,
        preview = config.experiment.preview,
        seed = ?config.experiment.seed,
        "configuration loaded"
    );

    let font = config.display.load_font()?;
    App::new(config, font)?.run()
}
