//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON profile files
//! - Validate profile legality
//! - Produce a `LinkProfile`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let profile = ConfigLoader::load_from_path(Path::new("link.toml")).unwrap();
//! println!("Frame timeout: {}s", profile.session.frame_timeout_secs);
//! ```

mod parser;
mod validator;

pub use contracts::LinkProfile;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load a profile from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a profile from a file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<LinkProfile, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a profile from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<LinkProfile, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize a LinkProfile to a TOML string
    pub fn to_toml(profile: &LinkProfile) -> Result<String, ContractError> {
        toml::to_string_pretty(profile)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a LinkProfile to a JSON string
    pub fn to_json(profile: &LinkProfile) -> Result<String, ContractError> {
        serde_json::to_string_pretty(profile)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<LinkProfile, ContractError> {
        let profile = parser::parse(content, format)?;
        validator::validate(&profile)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO_TOML: &str = r#"
[session]
frame_timeout_secs = 10.0
teardown_grace_secs = 5.0
clock_tick_ms = 100

[monitor]
probe_interval_secs = 5.0

[dispatch]
immediate_capacity = 32
channel_capacity = 64

[analysis]
window_capacity = 30
report_interval_frames = 10

[storage]
output_dir = "workouts"

[simulation]
duration_secs = 120.0
tick_hz = 1.0

[[simulation.dropouts]]
start_secs = 30.0
end_secs = 45.0
kind = "weak"

[[simulation.dropouts]]
start_secs = 70.0
end_secs = 80.0
kind = "disconnected"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(DEMO_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let profile = result.unwrap();
        assert_eq!(profile.session.frame_timeout_secs, 10.0);
        assert_eq!(profile.simulation.dropouts.len(), 2);
    }

    #[test]
    fn test_round_trip_toml() {
        let profile = ConfigLoader::load_from_str(DEMO_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&profile).unwrap();
        let profile2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(
            profile.session.frame_timeout_secs,
            profile2.session.frame_timeout_secs
        );
        assert_eq!(
            profile.simulation.dropouts.len(),
            profile2.simulation.dropouts.len()
        );
    }

    #[test]
    fn test_round_trip_json() {
        let profile = ConfigLoader::load_from_str(DEMO_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&profile).unwrap();
        let profile2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(
            profile.analysis.window_capacity,
            profile2.analysis.window_capacity
        );
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // A dropout window that outlives the run should fail validation
        let content = r#"
[simulation]
duration_secs = 30.0

[[simulation.dropouts]]
start_secs = 20.0
end_secs = 60.0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("end_secs"));
    }
}
