use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  /// Comma-separated WaniKani levels to keep after a sync (empty = all)
  pub levels: Option<String>,
  /// Custom title for the header
  pub title: Option<String>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./reibun.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/reibun/config.yaml
  ///
  /// Every field is optional, so a missing file simply yields defaults.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("reibun.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("reibun").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the WaniKani API v2 token from environment variables.
  ///
  /// Checks REIBUN_WK_TOKEN first, then WANIKANI_API_TOKEN as fallback.
  pub fn wanikani_token() -> Result<String> {
    std::env::var("REIBUN_WK_TOKEN")
      .or_else(|_| std::env::var("WANIKANI_API_TOKEN"))
      .map_err(|_| {
        eyre!("WaniKani API token not found. Set REIBUN_WK_TOKEN or WANIKANI_API_TOKEN.")
      })
  }

  /// Get the TTS API token from environment variables, if set.
  ///
  /// Checks REIBUN_TTS_TOKEN first, then TTS_API_KEY as fallback.
  pub fn tts_token() -> Option<String> {
    std::env::var("REIBUN_TTS_TOKEN")
      .ok()
      .or_else(|| std::env::var("TTS_API_KEY").ok())
  }
}
