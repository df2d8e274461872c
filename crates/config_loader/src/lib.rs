//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `PipelineSettings`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let settings = ConfigLoader::load_from_path(Path::new("babycast.toml")).unwrap();
//! println!("Model: {}", settings.backend.model);
//! ```

mod parser;
mod validator;

pub use contracts::PipelineSettings;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<PipelineSettings, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from file path if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<PipelineSettings, ContractError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(PipelineSettings::default()),
        }
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<PipelineSettings, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate settings built or modified in code (e.g. after CLI overrides)
    pub fn validate(settings: &PipelineSettings) -> Result<(), ContractError> {
        validator::validate(settings)
    }

    /// Serialize PipelineSettings to TOML string
    pub fn to_toml(settings: &PipelineSettings) -> Result<String, ContractError> {
        toml::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize PipelineSettings to JSON string
    pub fn to_json(settings: &PipelineSettings) -> Result<String, ContractError> {
        serde_json::to_string_pretty(settings)
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
    ) -> Result<PipelineSettings, ContractError> {
        let settings = parser::parse(content, format)?;
        validator::validate(&settings)?;
        Ok(settings)
    }
}
