// TraceLog - platform/fs.rs
//
// File metadata helpers used by the service layer and the CLI.
// Contents are never read here; `core::parser` owns that.

use crate::util::error::ParseError;
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::io;
use std::path::Path;

/// Last-modification time of `path`, millisecond resolution or better.
///
/// A missing file maps to `ParseError::NotFound` so callers polling for
/// changes get the same error the parser would give them.
pub fn last_modified(path: &Path) -> Result<DateTime<Utc>, ParseError> {
    let map_err = |e: io::Error| match e.kind() {
        io::ErrorKind::NotFound => ParseError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ParseError::Io {
            file: path.to_path_buf(),
            source: e,
        },
    };

    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(map_err)?;

    let ts = DateTime::<Utc>::from(modified);
    tracing::trace!(file = %path.display(), modified = %ts, "Read last-modified time");
    Ok(ts)
}

/// Local calendar date of the last modification, or `None` when the file
/// has no readable metadata.
pub fn modified_date(path: &Path) -> Option<NaiveDate> {
    last_modified(path)
        .ok()
        .map(|ts| ts.with_timezone(&Local).date_naive())
}

/// Best-effort name of this host, used to hide the local machine in
/// catalog titles.
pub fn local_machine_name() -> Option<String> {
    ["COMPUTERNAME", "HOSTNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .filter(|name| !name.is_empty())
}
