//! Logging configuration

use serde::Deserialize;

/// The `logging` section of the configuration file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingSpec {
    /// Log level or filter directive (e.g. `info`, `rscheck_core=debug`)
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSpec {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Plain,
    /// Newline-delimited JSON
    Json,
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_plain_info() {
        let spec: LoggingSpec = serde_yaml::from_str("{}").expect("should parse");
        assert_eq!(spec.level, "info");
        assert_eq!(spec.format, LogFormat::Plain);
    }

    #[test]
    fn parses_json_format() {
        let spec: LoggingSpec =
            serde_yaml::from_str("level: debug\nformat: json").expect("should parse");
        assert_eq!(spec.level, "debug");
        assert_eq!(spec.format, LogFormat::Json);
    }
}
