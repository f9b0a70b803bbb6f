// TraceLog - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
//
// These types are the shared vocabulary between the parser, the catalog,
// export, and whatever caller consumes them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Log Entry (output of parsing)
// =============================================================================

/// A single parsed trace log event.
///
/// The message is only mutated while the entry is the parser's open entry;
/// once the next entry-start line (or end of input) is seen the entry is
/// handed to the caller and never touched again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Monotonically increasing ID within one parse run, assigned when the
    /// entry-start line is recognised.
    pub sequence: u64,

    /// 1-based physical line number where this entry begins.
    pub line_number: u64,

    /// Entry timestamp, millisecond precision, as written (no timezone).
    pub timestamp: NaiveDateTime,

    /// Severity token exactly as written ("INFO", "WARN", "ERROR", ...).
    pub level: String,

    /// Originating component. Free text; may contain dots and spaces.
    pub logger: String,

    /// First-line message tail followed by every folded continuation line,
    /// each preceded by a newline.
    pub message: String,

    /// Thread identifier, when the line's format carries one.
    pub thread_id: Option<String>,

    /// Process identifier, when the line's format carries one.
    pub process_id: Option<String>,

    /// App-domain identifier, when the line's format carries one.
    pub domain_id: Option<String>,
}

impl LogEntry {
    /// Append a continuation line to the message.
    pub(crate) fn fold_line(&mut self, line: &str) {
        self.message.push('\n');
        self.message.push_str(line);
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Thread/process/domain identifiers pulled out of an identifier block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifiers {
    pub thread_id: Option<String>,
    pub process_id: Option<String>,
    pub domain_id: Option<String>,
}

// =============================================================================
// Log File Item (output of cataloging)
// =============================================================================

/// How a cataloged file's date was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateSource {
    /// A valid `yyyy-MM-dd` date was embedded in the file name.
    FileName,
    /// No date in the name; the file's last-modification time was used.
    Modified,
    /// No date in the name and no readable metadata (e.g. an explicit
    /// listing of paths that do not exist on this machine).
    Today,
}

/// A recognised trace log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFileItem {
    /// The date this log file logically belongs to.
    pub date: NaiveDate,

    /// Path exactly as supplied by the caller or the directory scan.
    pub path: PathBuf,

    /// Host qualifier from the file name; empty when the name has none.
    pub machine_name: String,

    /// Name starts with the alternate (companion subsystem) family prefix.
    pub is_alternate_family: bool,

    /// Where `date` came from.
    pub date_source: DateSource,
}

impl LogFileItem {
    /// Basename of `path`.
    pub fn file_name(&self) -> &str {
        file_name_of(&self.path)
    }

    /// Label used by the log tree: the file date, then the machine name when
    /// it is not the local host, then a `(C)` marker for the alternate family.
    pub fn display_title(&self, local_machine: Option<&str>) -> String {
        let mut title = self.date.format(crate::util::constants::FILE_DATE_FORMAT).to_string();

        let is_local = local_machine
            .is_some_and(|local| local.eq_ignore_ascii_case(&self.machine_name));
        if !self.machine_name.is_empty() && !is_local {
            title.push_str(&format!(" ({})", self.machine_name));
        }

        if self.is_alternate_family {
            title.push_str(" (C)");
        }

        title
    }
}

/// Basename of a path, treating both `/` and `\` as separators so listings
/// gathered from Windows hosts decompose the same way on every platform.
pub fn file_name_of(path: &Path) -> &str {
    let s = path.to_str().unwrap_or("");
    s.rsplit(['/', '\\']).next().unwrap_or(s)
}

// =============================================================================
// Log Data Response
// =============================================================================

/// Parsed entries of one file plus the metadata an external poller needs to
/// decide whether to re-fetch.
#[derive(Debug, Clone, Serialize)]
pub struct LogDataResponse {
    /// Parsed entries in file order.
    pub entries: Vec<LogEntry>,

    /// Last-modified time of the file at the time it was read.
    pub last_modified: DateTime<Utc>,

    /// Catalog date of the file, when its name is a recognised log name.
    pub date: Option<NaiveDate>,
}

impl LogDataResponse {
    /// Last-modified time as Unix epoch milliseconds.
    pub fn last_modified_millis(&self) -> i64 {
        self.last_modified.timestamp_millis()
    }
}
