//! Configuration for fanfuzz
//!
//! Settings come from the first TOML file found on the search path, then
//! `FANFUZZ_*` environment variables, then command-line flags. Nothing is
//! ever written back.
//!
//! # Configuration File Locations
//!
//! Searched in order (first found wins):
//! 1. `./fanfuzz.toml` - Project-local configuration
//! 2. `~/.config/fanfuzz/config.toml` - User configuration (XDG)
//! 3. `~/.fanfuzz/config.toml` - User configuration (legacy)
//! 4. `/etc/fanfuzz/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `FANFUZZ_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `FANFUZZ_FORMAT` - Output format (text, json)
//! - `FANFUZZ_PRECISION` - Decimal places shown for the speed
//! - `FANFUZZ_RESOLUTION` - Distance between speed samples used by the centroid
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! log_level = "normal"
//! format = "text"
//! precision = 2
//!
//! [controller]
//! resolution = 1.0
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{DEFAULT_PRECISION, MAX_PRECISION};
use crate::fuzzy::{grid_size, DEFAULT_STEP, SPEED_RANGE};

// ============================================================================
// Configuration Schema
// ============================================================================

/// Effective fanfuzz settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FanConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Inference settings
    pub controller: ControllerConfig,
}

/// `[general]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
    /// Output format
    pub format: OutputFormat,
    /// Decimal places shown for the recommended speed
    pub precision: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            format: OutputFormat::Text,
            precision: DEFAULT_PRECISION,
        }
    }
}

/// Inference configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Distance between speed-domain samples (percentage points)
    pub resolution: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_STEP,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Request-layer JSON body
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// `tracing_subscriber::EnvFilter` directive for this level
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "fanfuzz=info",
            LogLevel::Debug => "fanfuzz=debug",
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl FanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from default locations, then apply environment
    /// variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Read and validate one file, without env overrides
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config: FanConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        let config: FanConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Candidate config files, most specific first
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./fanfuzz.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fanfuzz").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".fanfuzz").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/fanfuzz/config.toml"));

        paths
    }

    /// Apply `FANFUZZ_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    ///
    /// Unrecognised values are errors rather than being silently ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("FANFUZZ_LOG_LEVEL") {
            self.general.log_level = LogLevel::from_str(&val)
                .ok_or_else(|| ConfigError::invalid("FANFUZZ_LOG_LEVEL", &val))?;
        }

        if let Some(val) = lookup("FANFUZZ_FORMAT") {
            self.general.format = OutputFormat::from_str(&val)
                .ok_or_else(|| ConfigError::invalid("FANFUZZ_FORMAT", &val))?;
        }

        if let Some(val) = lookup("FANFUZZ_PRECISION") {
            self.general.precision = val
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::invalid("FANFUZZ_PRECISION", &val))?;
        }

        if let Some(val) = lookup("FANFUZZ_RESOLUTION") {
            self.controller.resolution = val
                .trim()
                .parse::<f64>()
                .map_err(|_| ConfigError::invalid("FANFUZZ_RESOLUTION", &val))?;
        }

        self.validate()
    }

    /// Check value ranges that TOML types cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.precision > MAX_PRECISION {
            return Err(ConfigError::InvalidValue {
                key: "general.precision".to_string(),
                message: format!("must be at most {}", MAX_PRECISION),
            });
        }
        grid_size(SPEED_RANGE, self.controller.resolution).map_err(|e| {
            ConfigError::InvalidValue {
                key: "controller.resolution".to_string(),
                message: e.message,
            }
        })?;
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Commented template matching the defaults
    pub fn default_config_content() -> &'static str {
        r#"# fanfuzz configuration file

[general]
# Logging level: quiet, normal, verbose, debug
log_level = "normal"
# Output format: text, json
format = "text"
# Decimal places shown for the recommended speed
precision = 2

[controller]
# Distance between speed samples used for the centroid (percentage points)
resolution = 1.0
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Failures while reading or checking configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error reading {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
    /// File is not valid TOML for this schema
    #[error("Parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// Value outside its accepted range or vocabulary
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, value: &str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("unrecognised value '{}'", value),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = FanConfig::new();
        assert_eq!(config.general.log_level, LogLevel::Normal);
        assert_eq!(config.general.format, OutputFormat::Text);
        assert_eq!(config.general.precision, 2);
        assert_eq!(config.controller.resolution, 1.0);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            format = "json"
            log_level = "verbose"
            precision = 3

            [controller]
            resolution = 0.5
        "#;

        let config = FanConfig::load_from_str(toml).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert_eq!(config.general.precision, 3);
        assert_eq!(config.controller.resolution, 0.5);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = FanConfig::load_from_str("[general]\nprecision = 1\n").unwrap();
        assert_eq!(config.general.precision, 1);
        assert_eq!(config.general.format, OutputFormat::Text);
        assert_eq!(config.controller.resolution, 1.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = FanConfig::load_from_str("[controller]\nresolution = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "controller.resolution"));

        for resolution in ["1e-20", "1000.0", "-0.5"] {
            let toml = format!("[controller]\nresolution = {}\n", resolution);
            let err = FanConfig::load_from_str(&toml).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "controller.resolution"),
                "resolution {} accepted",
                resolution
            );
        }
        assert!(FanConfig::load_from_str("[controller]\nresolution = 0.01\n").is_ok());
        assert!(FanConfig::load_from_str("[controller]\nresolution = 100.0\n").is_ok());

        let err = FanConfig::load_from_str("[general]\nprecision = 11\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = FanConfig::load_from_str("[general]\nformat = \"xml\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[general]\nlog_level = \"debug\"").unwrap();

        let config = FanConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.general.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FanConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FANFUZZ_LOG_LEVEL", "quiet"),
            ("FANFUZZ_FORMAT", "json"),
            ("FANFUZZ_PRECISION", "4"),
            ("FANFUZZ_RESOLUTION", "0.25"),
        ]
        .into_iter()
        .collect();

        let mut config = FanConfig::new();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.general.log_level, LogLevel::Quiet);
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.general.precision, 4);
        assert_eq!(config.controller.resolution, 0.25);
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut config = FanConfig::new();
        let err = config
            .apply_overrides(|key| (key == "FANFUZZ_RESOLUTION").then(|| "-1".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = config
            .apply_overrides(|key| (key == "FANFUZZ_FORMAT").then(|| "yaml".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("FANFUZZ_FORMAT"));
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("quiet"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::from_str("V"), Some(LogLevel::Verbose));
        assert_eq!(LogLevel::from_str("3"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("loud"), None);
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config = FanConfig::load_from_str(FanConfig::default_config_content()).unwrap();
        assert_eq!(config, FanConfig::default());
    }

    #[test]
    fn test_serialize_config() {
        let toml = FanConfig::new().to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[controller]"));
    }

    #[test]
    fn test_config_paths() {
        let paths = FanConfig::config_paths();
        assert!(paths[0].ends_with("fanfuzz.toml"));
    }
}
