//! Null value handling for filtering and loading

use serde::{Deserialize, Serialize};

/// Null value configuration
///
/// The default treats only the empty string as null, which is what the
/// `IsNull` operator needs. Loaders that read files with placeholder values
/// add patterns like `"NULL"` or `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NullConfig {
    /// Patterns to treat as null
    pub patterns: Vec<String>,

    /// Whether to trim whitespace before checking
    pub trim_whitespace: bool,

    /// Case sensitive matching
    pub case_sensitive: bool,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            patterns: vec![String::new()],
            trim_whitespace: false,
            case_sensitive: true,
        }
    }
}

impl NullConfig {
    /// Configuration with the placeholder spellings common in exported files
    pub fn with_common_patterns() -> Self {
        let mut config = Self {
            trim_whitespace: true,
            case_sensitive: false,
            ..Self::default()
        };
        for pattern in ["-", "N/A", "null", "None"] {
            config.add_pattern(pattern.to_string());
        }
        config
    }

    /// Check if a value should be treated as null
    pub fn is_null(&self, value: &str) -> bool {
        let test_value = if self.trim_whitespace {
            value.trim()
        } else {
            value
        };

        self.patterns.iter().any(|pattern| {
            if self.case_sensitive {
                test_value == pattern
            } else {
                test_value.eq_ignore_ascii_case(pattern)
            }
        })
    }

    /// Add a null pattern
    pub fn add_pattern(&mut self, pattern: String) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    /// Remove a null pattern
    pub fn remove_pattern(&mut self, pattern: &str) {
        self.patterns.retain(|p| p != pattern);
    }
}
