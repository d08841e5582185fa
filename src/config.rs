//! Settings loaded from a TOML file.
//!
//! ```toml
//! [compare]
//! slots = 4
//!
//! [preview]
//! title = "Preview"
//! max_document_bytes = 2097152
//! max_live_resources = 64
//!
//! [server]
//! bind = "127.0.0.1"
//! port = 8888
//!
//! [logging]
//! filter = "model_compare=info,warn"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::host::MemoryHost;
use crate::preview::{PreviewOptions, DEFAULT_TITLE};
use crate::slot::MAX_SLOTS;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub compare: CompareSettings,
    #[serde(default)]
    pub preview: PreviewSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareSettings {
    /// Number of comparison slots (1 to 9).
    #[serde(default = "default_slots")]
    pub slots: usize,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            slots: default_slots(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSettings {
    #[serde(default = "default_title")]
    pub title: String,
    /// Documents above this size are refused by the host.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
    /// Live documents (current plus those in their grace period).
    #[serde(default = "default_max_live_resources")]
    pub max_live_resources: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            max_document_bytes: default_max_document_bytes(),
            max_live_resources: default_max_live_resources(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive, overridden by
    /// `MODEL_COMPARE_LOG`.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_slots() -> usize {
    4
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_max_document_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_max_live_resources() -> usize {
    64
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_filter() -> String {
    "model_compare=info,warn".to_string()
}

impl Settings {
    /// Load settings. `None` gives the defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SLOTS).contains(&self.compare.slots) {
            return Err(Error::config(format!(
                "compare.slots must be between 1 and {MAX_SLOTS}, got {}",
                self.compare.slots
            )));
        }
        // A replacement briefly holds the new, current and one retired document.
        if self.preview.max_live_resources < 3 {
            return Err(Error::config("preview.max_live_resources must be at least 3"));
        }
        if self.preview.max_document_bytes == 0 {
            return Err(Error::config("preview.max_document_bytes must be positive"));
        }
        Ok(())
    }

    pub fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            title: self.preview.title.clone(),
        }
    }

    /// A memory host with the configured limits.
    pub fn memory_host(&self) -> MemoryHost {
        MemoryHost::new()
            .with_max_live(self.preview.max_live_resources)
            .with_max_document_bytes(self.preview.max_document_bytes)
    }
}
