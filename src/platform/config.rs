// TraceLog - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.
//
// Example config.toml:
//
//   [catalog]
//   family_name = "UmbracoTraceLog"
//   alternate_family_name = "CourierTraceLog"
//   log_directory = "/srv/site/App_Data/Logs"
//
//   [logging]
//   level = "debug"

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for TraceLog configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/tracelog/ or %APPDATA%\TraceLog\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[catalog]` section.
    pub catalog: CatalogSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[catalog]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    /// Primary log family name.
    pub family_name: Option<String>,
    /// Alternate (companion subsystem) log family name.
    pub alternate_family_name: Option<String>,
    /// Directory scanned by `tracelog files` when none is given.
    pub log_directory: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub family_name: String,
    pub alternate_family_name: String,
    pub log_directory: PathBuf,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            family_name: constants::DEFAULT_FAMILY_NAME.to_string(),
            alternate_family_name: constants::DEFAULT_ALTERNATE_FAMILY_NAME.to_string(),
            log_directory: PathBuf::from(constants::DEFAULT_LOG_DIRECTORY),
            log_level: None,
        }
    }
}

/// Load and validate config.toml from the platform config directory.
///
/// A missing or broken file never stops the program: defaults are returned
/// together with a warning describing the problem.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match load_config_file(&config_path) {
        Ok(result) => result,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load and validate an explicitly named config file.
///
/// Unlike `load_config`, an unreadable or unparseable file is an error: the
/// user asked for this file by name.
pub fn load_config_file(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = parse_config(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), "Loaded config.toml");
    Ok(config)
}

/// Parse and validate config.toml content.
pub fn parse_config(content: &str) -> Result<(AppConfig, Vec<String>), toml::de::Error> {
    let raw: RawConfig = toml::from_str(content)?;
    Ok(validate(raw))
}

/// Validate each field against named constants, accumulating all warnings.
fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Catalog: family names --
    if let Some(name) = raw.catalog.family_name {
        match check_family_name(&name) {
            Ok(()) => config.family_name = name,
            Err(reason) => warnings.push(format!(
                "[catalog] family_name = \"{name}\" {reason}. Using default ({}).",
                constants::DEFAULT_FAMILY_NAME,
            )),
        }
    }

    if let Some(name) = raw.catalog.alternate_family_name {
        match check_family_name(&name) {
            Ok(()) => config.alternate_family_name = name,
            Err(reason) => warnings.push(format!(
                "[catalog] alternate_family_name = \"{name}\" {reason}. Using default ({}).",
                constants::DEFAULT_ALTERNATE_FAMILY_NAME,
            )),
        }
    }

    if config.family_name.eq_ignore_ascii_case(&config.alternate_family_name) {
        warnings.push(format!(
            "[catalog] alternate_family_name is the same as family_name (\"{}\"); \
             alternate logs will not be flagged.",
            config.family_name,
        ));
    }

    // -- Catalog: log_directory --
    if let Some(dir) = raw.catalog.log_directory {
        if dir.trim().is_empty() {
            warnings.push(format!(
                "[catalog] log_directory is empty. Using default ({}).",
                constants::DEFAULT_LOG_DIRECTORY,
            ));
        } else {
            config.log_directory = PathBuf::from(dir);
        }
    }

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level);
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: {}. Using default ({}).",
                constants::VALID_LOG_LEVELS.join(", "),
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    (config, warnings)
}

/// A family name is a plain file-name prefix.
fn check_family_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("is empty".to_string());
    }
    if name.len() > constants::MAX_FAMILY_NAME_LENGTH {
        return Err(format!(
            "is longer than {} characters",
            constants::MAX_FAMILY_NAME_LENGTH
        ));
    }
    if name.contains(['/', '\\']) {
        return Err("contains a path separator".to_string());
    }
    Ok(())
}
