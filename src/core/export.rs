// TraceLog - core/export.rs
//
// CSV and JSON export of parsed trace log entries and catalog listings.
// Core layer: writes to any Write implementation. `target` only labels
// errors ("stdout", an output path, ...).

use crate::core::model::{LogEntry, LogFileItem};
use crate::util::constants;
use crate::util::error::ExportError;
use std::io::Write;

const CSV_HEADER: [&str; 9] = [
    "sequence",
    "line",
    "timestamp",
    "level",
    "logger",
    "thread",
    "process",
    "domain",
    "message",
];

/// Export entries as CSV, one record per entry.
///
/// Multi-line messages are written as a single quoted field.
pub fn export_csv<W: Write>(
    entries: &[LogEntry],
    writer: W,
    target: &str,
) -> Result<usize, ExportError> {
    let csv_err = |e: csv::Error| ExportError::Csv {
        target: target.to_string(),
        source: e,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER).map_err(csv_err)?;

    for entry in entries {
        let ts = entry.timestamp.format(constants::TIMESTAMP_FORMAT).to_string();
        csv_writer
            .write_record([
                entry.sequence.to_string().as_str(),
                entry.line_number.to_string().as_str(),
                ts.as_str(),
                entry.level.as_str(),
                entry.logger.as_str(),
                entry.thread_id.as_deref().unwrap_or(""),
                entry.process_id.as_deref().unwrap_or(""),
                entry.domain_id.as_deref().unwrap_or(""),
                entry.message.as_str(),
            ])
            .map_err(csv_err)?;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        target: target.to_string(),
        source: e,
    })?;

    Ok(entries.len())
}

/// Export entries as a pretty-printed JSON array.
pub fn export_json<W: Write>(
    entries: &[LogEntry],
    writer: W,
    target: &str,
) -> Result<usize, ExportError> {
    write_json(entries, writer, target)?;
    Ok(entries.len())
}

/// Export a catalog listing as a pretty-printed JSON array.
pub fn export_catalog_json<W: Write>(
    items: &[LogFileItem],
    writer: W,
    target: &str,
) -> Result<usize, ExportError> {
    write_json(items, writer, target)?;
    Ok(items.len())
}

fn write_json<T: serde::Serialize + ?Sized, W: Write>(
    value: &T,
    mut writer: W,
    target: &str,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| ExportError::Json {
        target: target.to_string(),
        source: e,
    })?;
    writeln!(writer).map_err(|e| ExportError::Io {
        target: target.to_string(),
        source: e,
    })
}
