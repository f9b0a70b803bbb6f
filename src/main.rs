// TraceLog - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading (config.toml, then CLI overrides)
// 3. Logging initialisation (debug mode support)
// 4. Dispatch to the catalog / parse / modified commands

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracelog::app::service::TraceLogService;
use tracelog::core::export;
use tracelog::core::model::{LogEntry, LogFileItem};
use tracelog::platform;
use tracelog::util;
use tracelog::util::error::{ExportError, TraceLogError};

/// TraceLog - browse and parse rotated application trace logs.
#[derive(Parser, Debug)]
#[command(name = "tracelog", version, about)]
struct Cli {
    /// Read configuration from this file instead of the platform default.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Primary log family name (file-name prefix).
    #[arg(long = "family", global = true)]
    family: Option<String>,

    /// Alternate log family name, flagged in listings.
    #[arg(long = "alternate", global = true)]
    alternate: Option<String>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List trace log files, newest first.
    Files {
        /// Directory to scan (defaults to the configured log directory).
        dir: Option<PathBuf>,

        /// Catalog these paths instead of scanning a directory. The paths
        /// need not exist on this machine.
        #[arg(long = "paths", num_args = 1.., conflicts_with = "dir")]
        paths: Option<Vec<PathBuf>>,

        /// Print the listing as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Parse a trace log file and print its entries.
    Parse {
        file: PathBuf,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Stop after this many entries.
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Print a log file's last-modified time.
    Modified { file: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config is loaded before logging so its level can take part in the
    // filter; warnings are replayed once the subscriber exists.
    let (config, config_warnings) = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "TraceLog starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    let service = TraceLogService::new(&config);

    match run(&cli.command, &service) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Resolve configuration: config file (explicit or platform default), then
/// CLI overrides.
fn load_config(
    cli: &Cli,
) -> Result<(platform::config::AppConfig, Vec<String>), TraceLogError> {
    let (mut config, warnings) = match &cli.config {
        Some(path) => platform::config::load_config_file(path)?,
        None => {
            let paths = platform::config::PlatformPaths::resolve();
            platform::config::load_config(&paths.config_dir)
        }
    };

    if let Some(family) = &cli.family {
        config.family_name = family.clone();
    }
    if let Some(alternate) = &cli.alternate {
        config.alternate_family_name = alternate.clone();
    }

    Ok((config, warnings))
}

fn run(command: &Command, service: &TraceLogService) -> Result<(), TraceLogError> {
    match command {
        Command::Files { dir, paths, json } => {
            let items = match (paths, dir) {
                (Some(paths), _) => service.list_paths(Some(paths.as_slice()))?,
                (None, Some(dir)) => service.list_directory(dir)?,
                (None, None) => service.list_files()?,
            };
            print_files(&items, *json)
        }
        Command::Parse {
            file,
            format,
            limit,
        } => print_entries(service, file, *format, *limit),
        Command::Modified { file } => {
            let modified = service.last_modified(file)?;
            println!(
                "{}",
                modified.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            );
            Ok(())
        }
    }
}

fn print_files(items: &[LogFileItem], json: bool) -> Result<(), TraceLogError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        export::export_catalog_json(items, &mut out, "stdout")?;
        return Ok(());
    }

    let local = platform::fs::local_machine_name();
    for item in items {
        writeln!(
            out,
            "{}\t{}\t{}",
            item.date,
            item.display_title(local.as_deref()),
            item.path.display()
        )
        .map_err(stdout_err)?;
    }
    Ok(())
}

fn print_entries(
    service: &TraceLogService,
    file: &Path,
    format: OutputFormat,
    limit: Option<usize>,
) -> Result<(), TraceLogError> {
    let stream = service.open_entries(file)?;
    let limit = limit.unwrap_or(usize::MAX);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match format {
        // Text output streams: nothing past `limit` is ever read.
        OutputFormat::Text => {
            for entry in stream.take(limit) {
                write_text(&mut out, &entry?).map_err(stdout_err)?;
            }
        }
        OutputFormat::Json | OutputFormat::Csv => {
            let entries = stream
                .take(limit)
                .collect::<Result<Vec<LogEntry>, _>>()?;
            if format == OutputFormat::Json {
                export::export_json(&entries, &mut out, "stdout")?;
            } else {
                export::export_csv(&entries, &mut out, "stdout")?;
            }
        }
    }
    Ok(())
}

fn write_text<W: Write>(out: &mut W, entry: &LogEntry) -> io::Result<()> {
    let ids = [
        entry.process_id.as_deref().map(|p| format!("P{p}")),
        entry.domain_id.as_deref().map(|d| format!("D{d}")),
        entry.thread_id.as_deref().map(|t| format!("T{t}")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join("/");

    let timestamp = entry.timestamp.format(util::constants::TIMESTAMP_FORMAT);
    if ids.is_empty() {
        writeln!(
            out,
            "{} {:<5} {} - {}",
            timestamp, entry.level, entry.logger, entry.message
        )
    } else {
        writeln!(
            out,
            "{} [{}] {:<5} {} - {}",
            timestamp, ids, entry.level, entry.logger, entry.message
        )
    }
}

fn stdout_err(e: io::Error) -> TraceLogError {
    ExportError::Io {
        target: "stdout".to_string(),
        source: e,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(thread_id: Option<&str>, process_id: Option<&str>) -> LogEntry {
        LogEntry {
            sequence: 0,
            line_number: 1,
            timestamp: NaiveDate::from_ymd_opt(2016, 1, 21)
                .unwrap()
                .and_hms_milli_opt(22, 14, 10, 559)
                .unwrap(),
            level: "INFO".to_string(),
            logger: "Umbraco.Core".to_string(),
            message: "Started".to_string(),
            thread_id: thread_id.map(str::to_string),
            process_id: process_id.map(str::to_string),
            domain_id: None,
        }
    }

    fn text_of(entry: &LogEntry) -> String {
        let mut out = Vec::new();
        write_text(&mut out, entry).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_write_text_with_identifiers() {
        assert_eq!(
            text_of(&entry(Some("7"), Some("10176"))),
            "2016-01-21 22:14:10,559 [P10176/T7] INFO  Umbraco.Core - Started\n"
        );
    }

    #[test]
    fn test_write_text_without_identifiers() {
        assert_eq!(
            text_of(&entry(None, None)),
            "2016-01-21 22:14:10,559 INFO  Umbraco.Core - Started\n"
        );
    }
}
