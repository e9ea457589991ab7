use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Volume applied to the volume slider at startup, 0.0..=1.0 linear.
    #[serde(default = "default_volume")]
    pub default_volume: f64,

    /// Fraction of the media duration moved by the seek buttons.
    #[serde(default = "default_seek_step")]
    pub seek_step: f64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {:?}", path);
            let contents = fs::read_to_string(path).context("Failed to read config file")?;
            match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Config loaded successfully");
                    Ok(config)
                }
                Err(e) => {
                    // A hand-edited file must not brick startup
                    warn!("Malformed config file {:?}, using defaults: {}", path, e);
                    Ok(Config::default())
                }
            }
        } else {
            info!("No config file found, creating defaults");
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("matinee").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            seek_step: default_seek_step(),
        }
    }
}

// Default value functions
fn default_volume() -> f64 {
    1.0
}
fn default_seek_step() -> f64 {
    0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.playback.default_volume, 1.0);
        assert_eq!(config.playback.seek_step, 0.1);
    }

    #[test]
    fn test_partial_file_fills_missing_keys() {
        let config: Config = toml::from_str("[playback]\nseek_step = 0.25\n").unwrap();
        assert_eq!(config.playback.seek_step, 0.25);
        assert_eq!(config.playback.default_volume, 1.0);
    }

    #[test]
    fn test_empty_file_parses_to_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.playback.default_volume, 1.0);
        assert_eq!(config.playback.seek_step, 0.1);
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matinee").join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.playback.default_volume, 1.0);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "playback = [this is not toml").unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.playback.seek_step, 0.1);
        // The broken file is left in place for the user to fix
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("playback = ["));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.playback.default_volume = 0.5;
        config.playback.seek_step = 0.2;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.playback.default_volume, 0.5);
        assert_eq!(loaded.playback.seek_step, 0.2);
    }
}
