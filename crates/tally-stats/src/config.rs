//! Output configuration for the statistics aggregator

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output file name that resolves to `<output_dir>/<actor_name>.json`
pub const AUTO_FILENAME: &str = "auto";

/// Extension of automatically named reports
pub const DEFAULT_EXTENSION: &str = "json";

/// Report encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoder {
    /// Structured JSON document of the processed record
    #[default]
    Json,
    /// Fixed-width human-readable text
    Legacy,
}

impl Encoder {
    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Legacy => "legacy",
        }
    }
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "legacy" => Ok(Self::Legacy),
            _ => Err(Error::Configuration(format!(
                "unknown encoder '{s}', expected 'json' or 'legacy'"
            ))),
        }
    }
}

/// Configuration of the statistics output
///
/// Deserializing a document that names an `output_filename` behaves like
/// calling [`StatisticsConfig::set_output_filename`]: the report will be
/// written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigDocument")]
pub struct StatisticsConfig {
    pub encoder: Encoder,
    output_filename: String,
    pub write_to_disk: bool,
    /// Keep the per-particle track breakdown reported by the engine
    pub track_types_flag: bool,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            encoder: Encoder::Json,
            output_filename: AUTO_FILENAME.to_string(),
            write_to_disk: false,
            track_types_flag: false,
        }
    }
}

impl StatisticsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_output_filename(mut self, name: impl Into<String>) -> Self {
        self.set_output_filename(name);
        self
    }

    pub fn with_track_types(mut self, enabled: bool) -> Self {
        self.track_types_flag = enabled;
        self
    }

    pub fn output_filename(&self) -> &str {
        &self.output_filename
    }

    /// Set the report file name; a non-empty name also enables writing
    pub fn set_output_filename(&mut self, name: impl Into<String>) {
        self.output_filename = name.into();
        if !self.output_filename.is_empty() {
            self.write_to_disk = true;
        }
    }

    /// Resolve the report path for an actor.
    ///
    /// `"auto"` becomes `<output_dir>/<actor_name>.json`, relative names are
    /// taken relative to `output_dir`, absolute names are used as given.
    pub fn resolve_output_path(&self, output_dir: &Path, actor_name: &str) -> Result<PathBuf> {
        match self.output_filename.as_str() {
            "" => Err(Error::Configuration(format!(
                "no output filename configured for '{actor_name}'"
            ))),
            AUTO_FILENAME => Ok(output_dir.join(format!("{actor_name}.{DEFAULT_EXTENSION}"))),
            name => Ok(output_dir.join(name)),
        }
    }
}

#[derive(Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    encoder: Encoder,
    #[serde(default)]
    output_filename: Option<String>,
    #[serde(default)]
    write_to_disk: bool,
    #[serde(default)]
    track_types_flag: bool,
}

impl From<ConfigDocument> for StatisticsConfig {
    fn from(doc: ConfigDocument) -> Self {
        let mut config = Self {
            encoder: doc.encoder,
            write_to_disk: doc.write_to_disk,
            track_types_flag: doc.track_types_flag,
            ..Self::default()
        };
        if let Some(name) = doc.output_filename {
            config.set_output_filename(name);
        }
        config
    }
}
