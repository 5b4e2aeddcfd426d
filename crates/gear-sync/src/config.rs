//! Coordinator settings parsed from TOML
//!
//! ```toml
//! [coordinator]
//! write_mode = "batched"
//! write_timeout_ms = 5000
//! queue_policy = "wait"
//! event_capacity = 64
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn default_write_timeout_ms() -> u64 {
    10_000
}

fn default_event_capacity() -> usize {
    64
}

/// How planned writes reach the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// One call per changed record, in plan order
    #[default]
    Sequential,
    /// One call per scope when the store supports it
    Batched,
}

/// What happens when an operation needs a scope that is already in use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Queue behind the running operation
    #[default]
    Wait,
    /// Fail fast with [`Error::Busy`]
    Reject,
}

/// `[coordinator]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorSection {
    #[serde(default)]
    pub write_mode: WriteMode,

    /// Upper bound for a single persistence call
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    #[serde(default)]
    pub queue_policy: QueuePolicy,

    /// Buffered events per subscriber before old ones are dropped
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for CoordinatorSection {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::default(),
            write_timeout_ms: default_write_timeout_ms(),
            queue_policy: QueuePolicy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl CoordinatorSection {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

/// Top-level settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub coordinator: CoordinatorSection,
}

impl Settings {
    /// Parse settings from TOML content
    ///
    /// ```
    /// use gear_sync::{Settings, WriteMode};
    ///
    /// let settings = Settings::parse("[coordinator]\nwrite_mode = \"batched\"").unwrap();
    /// assert_eq!(settings.coordinator.write_mode, WriteMode::Batched);
    /// assert_eq!(settings.coordinator.write_timeout_ms, 10_000);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read and parse a settings file
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(?path, "Loading settings");
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Apply a settings layer on top of this one.
    ///
    /// Every field the layer sets wins, even when it names the default.
    pub fn merge(&mut self, layer: &SettingsLayer) {
        let theirs = &layer.coordinator;
        let ours = &mut self.coordinator;

        if let Some(write_mode) = theirs.write_mode {
            ours.write_mode = write_mode;
        }
        if let Some(write_timeout_ms) = theirs.write_timeout_ms {
            ours.write_timeout_ms = write_timeout_ms;
        }
        if let Some(queue_policy) = theirs.queue_policy {
            ours.queue_policy = queue_policy;
        }
        if let Some(event_capacity) = theirs.event_capacity {
            ours.event_capacity = event_capacity;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.coordinator.write_timeout_ms == 0 {
            return Err(Error::Config {
                message: "write_timeout_ms must be greater than zero".into(),
            });
        }
        if self.coordinator.event_capacity == 0 {
            return Err(Error::Config {
                message: "event_capacity must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// `[coordinator]` as written in one file, before defaults are filled in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorLayer {
    pub write_mode: Option<WriteMode>,
    pub write_timeout_ms: Option<u64>,
    pub queue_policy: Option<QueuePolicy>,
    pub event_capacity: Option<usize>,
}

/// One settings file in a layered lookup; only the fields it names are set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsLayer {
    #[serde(default)]
    pub coordinator: CoordinatorLayer,
}

impl SettingsLayer {
    /// Parse a layer from TOML content.
    ///
    /// Values are checked once the layers are merged, see [`Settings::validate`].
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(?path, "Loading settings layer");
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}
