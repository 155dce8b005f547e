use crate::error::StasherError;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StasherConfig {
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Controls the shape of each emitted event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventConfig {
    #[serde(default)]
    pub schema: SchemaVariant,
    #[serde(default)]
    pub timestamp: TimestampSource,
    /// Render `@timestamp` in UTC instead of the host's local offset.
    #[serde(default)]
    pub utc: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// All fields, including the six request headers.
    #[default]
    Extended,
    /// Leaves out the request header fields.
    Minimal,
}

/// Which instant `@timestamp` records.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    /// After the downstream chain has returned. Matches existing consumers.
    #[default]
    Completion,
    /// When the request entered the middleware.
    Arrival,
}

/// Output sink selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub kind: SinkKind,
    /// Append target. Only read when `kind = file`.
    #[serde(default = "default_sink_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Stdout,
    Stderr,
    File,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_sink_path() -> PathBuf { PathBuf::from("stasher.log") }

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::default(),
            path: default_sink_path(),
        }
    }
}

// ── Impls ─────────────────────────────────────────────────────

impl StasherConfig {
    /// Load configuration from a YAML file plus `STASHER_` env overrides
    /// (`STASHER_SINK__KIND=file`).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: StasherConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("STASHER_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a working sink.
    pub fn validate(&self) -> Result<(), StasherError> {
        if self.sink.kind == SinkKind::File && self.sink.path.as_os_str().is_empty() {
            return Err(StasherError::Config(
                "sink.path must be set when sink.kind = file".into(),
            ));
        }
        Ok(())
    }
}
