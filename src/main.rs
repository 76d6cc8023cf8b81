mod app;
mod cache;
mod config;
mod event;
mod pick;
mod tts;
mod ui;
mod wanikani;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reibun")]
#[command(about = "A terminal study aid for WaniKani context sentences")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/reibun/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Comma-separated WaniKani levels to keep, e.g. "1,2,5" (empty = all)
  #[arg(short, long)]
  levels: Option<String>,
}

/// Log to a rotated file in the data dir; the terminal belongs to the UI.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .map(|d| d.join("reibun").join("logs"))
    .unwrap_or_else(|| PathBuf::from("."));
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::daily(&log_dir, "reibun.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_env("REIBUN_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override the level filter if specified on the command line
  let config = if let Some(levels) = args.levels {
    config::Config {
      levels: Some(levels),
      ..config
    }
  } else {
    config
  };

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
