//! Application configuration.
//!
//! Loaded from `config.toml` under the platform config directory; every
//! field has a default so a missing file just means defaults.

use crate::session::Coordinates;
use crate::stream::StreamConfig;
use crate::{MurmurError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the chat backend.
    pub base_url: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Per-read timeout in seconds; streams idle longer than this fail.
    pub read_timeout_secs: u64,

    /// Language preference for the voice.
    pub language: String,

    /// Optional fixed coordinates attached to requests.
    pub location: Option<Coordinates>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout_secs: 10,
            read_timeout_secs: 120,
            language: "ko".to_string(),
            location: None,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("murmur").join("config.toml"))
}

impl AppConfig {
    /// Load the config file, falling back to defaults when it is absent.
    pub fn load() -> Result<Self> {
        let Some(path) = config_path() else {
            info!("no config directory available, using defaults");
            return Ok(Self::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => {
                info!("loading config from {path:?}");
                Self::from_toml(&text)
            }
            Err(_) => {
                info!("no config file at {path:?}, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| MurmurError::Config(format!("bad config file: {e}")))
    }

    /// Connection settings for the stream client.
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.base_url).is_err() {
            return Err(MurmurError::Config(format!(
                "base_url is not a valid URL: {}",
                self.base_url
            )));
        }

        if self.connect_timeout_secs == 0 || self.read_timeout_secs == 0 {
            return Err(MurmurError::Config("timeouts must be non-zero".into()));
        }

        Ok(())
    }
}
