//! Decoder configuration types
//!
//! This module defines the small amount of configuration the decoder library needs.
//! Nothing here depends on process-wide state such as the locale: number formatting is
//! chosen explicitly by the caller through [`ReportConfig`].

use serde::{Deserialize, Serialize};

/// Configuration for trace detection and parsing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Number of leading lines inspected by the format detector
    #[serde(default = "default_detect_lines")]
    pub detect_lines: usize,

    /// Reference point for wall-clock timestamps (IXXAT traces)
    #[serde(default)]
    pub time_base: TimeBase,

    /// Whether to keep a diagnostic for every skipped record line
    #[serde(default = "default_true")]
    pub record_diagnostics: bool,
}

fn default_detect_lines() -> usize {
    16
}

fn default_true() -> bool {
    true
}

/// How wall-clock timestamps are turned into milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBase {
    /// Milliseconds since midnight
    #[default]
    Midnight,
    /// Milliseconds elapsed since the first record of the trace
    First,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            detect_lines: default_detect_lines(),
            time_base: TimeBase::default(),
            record_diagnostics: true,
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the number of lines used for format detection
    pub fn with_detect_lines(mut self, lines: usize) -> Self {
        self.detect_lines = lines;
        self
    }

    /// Builder method: set the timestamp reference for wall-clock traces
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = time_base;
        self
    }

    /// Builder method: enable or disable per-line diagnostics
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.record_diagnostics = enabled;
        self
    }
}

/// Formatting options for report rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Decimal separator for timestamps
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,

    /// Text written for fields that do not apply (node 0, index 0)
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_decimal_separator() -> char {
    '.'
}

fn default_placeholder() -> String {
    "-".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            decimal_separator: default_decimal_separator(),
            placeholder: default_placeholder(),
        }
    }
}

impl ReportConfig {
    /// Create a report configuration with `.` as decimal separator
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the decimal separator
    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    /// Builder method: set the placeholder for non-applicable fields
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_detect_lines(32)
            .with_time_base(TimeBase::First)
            .with_diagnostics(false);

        assert_eq!(config.detect_lines, 32);
        assert_eq!(config.time_base, TimeBase::First);
        assert!(!config.record_diagnostics);
    }

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::new();
        assert_eq!(config.detect_lines, 16);
        assert_eq!(config.time_base, TimeBase::Midnight);
        assert!(config.record_diagnostics);

        let report = ReportConfig::new();
        assert_eq!(report.decimal_separator, '.');
        assert_eq!(report.placeholder, "-");
    }

    #[test]
    fn test_report_config_builder() {
        let report = ReportConfig::new()
            .with_decimal_separator(',')
            .with_placeholder("n/a");
        assert_eq!(report.decimal_separator, ',');
        assert_eq!(report.placeholder, "n/a");
    }
}
