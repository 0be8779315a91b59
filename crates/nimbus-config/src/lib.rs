//! Configuration for the nimbus animation.
//!
//! Settings live in `config.toml` inside the platform configuration
//! directory. Every field has a default, so a missing file or a partial
//! file is fine; a file that fails to parse is an error.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use nimbus_core::{Preset, Rgb};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform has no home directory to derive a config path from.
    #[error("could not determine a configuration directory")]
    NoConfigDir,

    /// Reading or writing the file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`Config`].
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Serializing the configuration failed.
    #[error("could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is outside its accepted range.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which scene to run.
    pub preset: Preset,
    /// Seed for the random source. A time-based seed is used when absent.
    pub seed: Option<u64>,
    /// Target frame rate of the frame driver.
    pub fps: u32,
    /// Lines of text used by text-mask presets.
    pub text: Vec<String>,
    /// Background colour.
    pub sky: Rgb,
    /// Base colour of every particle.
    pub particle_color: Rgb,
    /// Caption lines shown in the bottom-left corner.
    pub caption: Vec<String>,
    /// Overrides the initial particle count of the preset's first layer;
    /// ambient layers keep their own.
    pub population: Option<usize>,
    /// Overrides the particle count of the first layer after a cycle reset.
    pub post_reset_population: Option<usize>,
    /// Overrides the preset's cycle period in frames.
    pub cycle_period: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preset: Preset::default(),
            seed: None,
            fps: 60,
            text: vec!["OPEN".to_string(), "  CALL".to_string()],
            sky: Rgb::SKY,
            particle_color: Rgb::WHITE,
            caption: vec![
                "HALLWAY MONITOR OPEN CALL".to_string(),
                "for moving image work".to_string(),
            ],
            population: None,
            post_reset_population: None,
            cycle_period: None,
        }
    }
}

impl Config {
    /// Path of the configuration file for this platform.
    pub fn path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "nimbus")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the configuration from the platform path, falling back to
    /// defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load and validate the configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the configuration to the platform path.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        self.save_to(&path)?;
        log::info!("saved config to {}", path.display());
        Ok(())
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values the frame driver or the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 || self.fps > 240 {
            return Err(ConfigError::Invalid {
                field: "fps",
                reason: "must be between 1 and 240",
            });
        }
        if self.cycle_period == Some(0) {
            return Err(ConfigError::Invalid {
                field: "cycle_period",
                reason: "must be at least one frame",
            });
        }
        if self.text.iter().all(|line| line.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "text",
                reason: "needs at least one non-blank line",
            });
        }
        Ok(())
    }
}
