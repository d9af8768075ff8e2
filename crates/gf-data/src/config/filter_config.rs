//! Configuration for clause evaluation

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::null_handling::NullConfig;
use crate::DataError;

/// Date layouts tried after RFC 3339 and RFC 2822
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y",
];

/// Settings used by the clause filter engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Values the `IsNull` operator treats as null
    pub null_config: NullConfig,

    /// chrono layouts accepted when probing text as a date
    pub date_formats: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            null_config: NullConfig::default(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl FilterConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the null handling
    pub fn with_null_config(mut self, null_config: NullConfig) -> Self {
        self.null_config = null_config;
        self
    }

    /// Accept an additional date layout
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        if !self.date_formats.contains(&format) {
            self.date_formats.push(format);
        }
        self
    }

    /// Parse a configuration from JSON; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}
