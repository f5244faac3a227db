//! # Trainer Configuration
//!
//! One TOML file, every table optional:
//!
//! ```toml
//! log_filter = "info"
//! demo_script = "demo.toml"     # relative to this file
//!
//! [server]
//! base_url = "ws://127.0.0.1:8000"
//! feed_path = "/ws"
//! action_path = "/action"
//!
//! [session]
//! duration_secs = 60
//! tick_ms = 1000
//! ```

use std::path::{Path, PathBuf};

use guardian_core::{DemoScript, DemoScriptFile, SessionConfig};
use guardian_networking::LinkConfig;
use serde::Deserialize;
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "guardian.toml";

/// Errors loading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// The I/O failure.
        source: std::io::Error,
    },

    /// A file is not valid TOML for its shape.
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// The file.
        path: PathBuf,
        /// The TOML failure.
        source: toml::de::Error,
    },

    /// Values parsed but are unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything the trainer can be told.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    /// Scoring service endpoints.
    pub server: LinkConfig,
    /// Session timing.
    pub session: SessionConfig,
    /// Demo script file. The built-in script when absent.
    pub demo_script: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            server: LinkConfig::default(),
            session: SessionConfig::default(),
            demo_script: None,
            log_filter: "info".to_owned(),
        }
    }
}

impl GuardianConfig {
    /// Loads the configuration.
    ///
    /// With an explicit path the file must exist. Without one,
    /// [`DEFAULT_CONFIG_FILE`] is used if present, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`].
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML text. Relative paths stay as written.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`].
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = read(path)?;
        let mut config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;

        if let (Some(script), Some(dir)) = (&config.demo_script, path.parent()) {
            if script.is_relative() {
                config.demo_script = Some(dir.join(script));
            }
        }
        Ok(config)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`].
    pub fn validate(&self) -> ConfigResult<()> {
        self.session
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.server
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log_filter must not be empty".into()));
        }
        Ok(())
    }

    /// The demo script to play.
    ///
    /// # Errors
    ///
    /// Reading or parsing the script file fails, or its rows are unusable.
    pub fn demo_script(&self) -> ConfigResult<DemoScript> {
        let Some(path) = &self.demo_script else {
            return Ok(DemoScript::builtin());
        };

        let text = read(path)?;
        let file: DemoScriptFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        DemoScript::from_entries(file.items).map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))
    }
}

fn read(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })
}
