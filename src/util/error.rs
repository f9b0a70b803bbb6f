// TraceLog - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation. All errors preserve the causal chain
// for diagnostic logging, and every path-bearing variant names the path the
// caller asked for.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all TraceLog operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum TraceLogError {
    /// Log file parsing failed.
    Parse(ParseError),

    /// Log file cataloging failed.
    Catalog(CatalogError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading failed.
    Config(ConfigError),
}

impl fmt::Display for TraceLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Catalog(e) => write!(f, "Catalog error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for TraceLogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Catalog(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Errors related to log file parsing. All of these abort the parse call:
/// continuing past any of them could attribute folded lines to the wrong
/// entry.
#[derive(Debug)]
pub enum ParseError {
    /// The requested log file does not exist.
    NotFound { path: PathBuf },

    /// A line matched the entry grammar but its date/time prefix did not
    /// parse.
    MalformedTimestamp {
        file: PathBuf,
        line_number: u64,
        raw_timestamp: String,
    },

    /// File content is not valid UTF-8.
    InvalidEncoding { file: PathBuf, line_number: u64 },

    /// I/O error while opening or reading a log file.
    Io { file: PathBuf, source: io::Error },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(
                f,
                "The requested trace log file '{}' could not be found",
                path.display()
            ),
            Self::MalformedTimestamp {
                file,
                line_number,
                raw_timestamp,
            } => write!(
                f,
                "'{}' line {line_number}: cannot parse timestamp '{raw_timestamp}'",
                file.display()
            ),
            Self::InvalidEncoding { file, line_number } => write!(
                f,
                "'{}' line {line_number}: invalid UTF-8 encoding",
                file.display()
            ),
            Self::Io { file, source } => {
                write!(f, "'{}': I/O error: {source}", file.display())
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ParseError> for TraceLogError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Catalog errors
// ---------------------------------------------------------------------------

/// Errors related to log file cataloging. An individual file name that is
/// not a recognised log name is NOT an error; it is simply excluded.
#[derive(Debug)]
pub enum CatalogError {
    /// A required input was not supplied (caller programming error).
    InvalidArgument { reason: &'static str },

    /// The directory to scan does not exist.
    DirectoryNotFound { path: PathBuf },

    /// The path to scan exists but is not a directory.
    NotADirectory { path: PathBuf },

    /// Walkdir traversal error on the scan root.
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "Invalid argument: {reason}"),
            Self::DirectoryNotFound { path } => {
                write!(f, "Log directory '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Log path '{}' is not a directory", path.display())
            }
            Self::Traversal { path, source } => {
                write!(f, "Error scanning '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Traversal { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CatalogError> for TraceLogError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export output.
    Io { target: String, source: io::Error },

    /// CSV serialisation error.
    Csv { target: String, source: csv::Error },

    /// JSON serialisation error.
    Json {
        target: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { target, source } => write!(f, "Export I/O error '{target}': {source}"),
            Self::Csv { target, source } => write!(f, "CSV export error '{target}': {source}"),
            Self::Json { target, source } => write!(f, "JSON export error '{target}': {source}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for TraceLogError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for TraceLogError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for TraceLog results.
pub type Result<T> = std::result::Result<T, TraceLogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_not_found_names_the_path() {
        let err = ParseError::NotFound {
            path: PathBuf::from("/logs/UmbracoTraceLog.txt"),
        };
        let text = err.to_string();
        assert!(text.contains("/logs/UmbracoTraceLog.txt"), "got: {text}");
    }

    #[test]
    fn test_top_level_preserves_source_chain() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: TraceLogError = ParseError::Io {
            file: PathBuf::from("a.txt"),
            source: io,
        }
        .into();
        let parse = err.source().expect("parse error source");
        let io_source = parse.source().expect("io error source");
        assert_eq!(io_source.to_string(), "denied");
    }

    #[test]
    fn test_invalid_argument_display() {
        let err: TraceLogError = CatalogError::InvalidArgument {
            reason: "no file list supplied",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Catalog error: Invalid argument: no file list supplied"
        );
    }
}
