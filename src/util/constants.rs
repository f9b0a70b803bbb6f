// TraceLog - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "TraceLog";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "TraceLog";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Log families
// =============================================================================

/// Base name of the primary trace log family when none is configured.
pub const DEFAULT_FAMILY_NAME: &str = "UmbracoTraceLog";

/// Base name of the companion-subsystem log family written alongside the
/// primary logs (flagged, not excluded, by the catalog).
pub const DEFAULT_ALTERNATE_FAMILY_NAME: &str = "CourierTraceLog";

/// Literal extension that every cataloged log file carries before any
/// rotation date suffix.
pub const LOG_FILE_EXTENSION: &str = "txt";

/// Directory scanned when neither the CLI nor config.toml names one.
pub const DEFAULT_LOG_DIRECTORY: &str = "App_Data/Logs";

/// Catalog scans never descend into subdirectories.
pub const CATALOG_SCAN_DEPTH: usize = 1;

/// Maximum length accepted for a configured family name.
pub const MAX_FAMILY_NAME_LENGTH: usize = 128;

// =============================================================================
// Parsing
// =============================================================================

/// Width of the `yyyy-MM-dd HH:mm:ss,fff` entry prefix.
pub const TIMESTAMP_PREFIX_LEN: usize = 23;

/// chrono format matching the fixed-width entry prefix exactly.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Date format embedded in rotated log file names.
pub const FILE_DATE_FORMAT: &str = "%Y-%m-%d";

/// UTF-8 byte-order mark some writers put at the start of a fresh log file.
pub const UTF8_BOM: char = '\u{feff}';

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log levels accepted in config.toml.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Maximum length of a log line included in debug output.
/// Prevents accidental exposure of sensitive data in long lines.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
