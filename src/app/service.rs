// TraceLog - app/service.rs
//
// Composition of catalog, parser and file metadata into the operations the
// CLI (or any embedding host) calls.
//
// Every call is independent: nothing is cached between calls, so a host
// polling `read_log_data` always sees the file as it is now.

use crate::core::catalog::{CatalogConfig, FileCatalog};
use crate::core::model::{LogDataResponse, LogEntry, LogFileItem};
use crate::core::parser::{EntryParser, EntryStream};
use crate::platform::config::AppConfig;
use crate::platform::fs;
use crate::util::error::{ParseError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Trace log viewing service.
#[derive(Debug)]
pub struct TraceLogService {
    parser: EntryParser,
    catalog: FileCatalog,
    log_directory: PathBuf,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl TraceLogService {
    pub fn new(config: &AppConfig) -> Self {
        let catalog = FileCatalog::new(CatalogConfig {
            family_name: config.family_name.clone(),
            alternate_family_name: config.alternate_family_name.clone(),
        });

        tracing::debug!(
            family = %config.family_name,
            alternate = %config.alternate_family_name,
            dir = %config.log_directory.display(),
            "Service ready"
        );

        Self {
            parser: EntryParser::new(),
            catalog,
            log_directory: config.log_directory.clone(),
            cancel_flag: None,
        }
    }

    /// Streams opened by this service stop once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    pub fn log_directory(&self) -> &Path {
        &self.log_directory
    }

    pub fn catalog(&self) -> &FileCatalog {
        &self.catalog
    }

    pub fn parser(&self) -> &EntryParser {
        &self.parser
    }

    /// Catalog the configured log directory.
    pub fn list_files(&self) -> Result<Vec<LogFileItem>> {
        self.list_directory(&self.log_directory)
    }

    /// Catalog an arbitrary directory.
    pub fn list_directory(&self, dir: &Path) -> Result<Vec<LogFileItem>> {
        Ok(self.catalog.scan_directory(dir)?)
    }

    /// Catalog a listing supplied by the caller (e.g. gathered remotely).
    pub fn list_paths<P: AsRef<Path>>(&self, paths: Option<&[P]>) -> Result<Vec<LogFileItem>> {
        Ok(self.catalog.catalog_listing(paths)?)
    }

    /// Lazily parse one log file.
    pub fn open_entries(&self, path: &Path) -> Result<EntryStream<'_, BufReader<File>>> {
        let stream = self.parser.open(path)?;
        Ok(match &self.cancel_flag {
            Some(flag) => stream.with_cancel_flag(Arc::clone(flag)),
            None => stream,
        })
    }

    /// Parse one log file completely and bundle it with the metadata a
    /// poller needs to decide when to fetch it again.
    pub fn read_log_data(&self, path: &Path) -> Result<LogDataResponse> {
        // Read the mtime first: if the file changes while it is being parsed,
        // the next poll sees a newer time and re-fetches.
        let last_modified = fs::last_modified(path)?;

        let entries = self
            .open_entries(path)?
            .collect::<std::result::Result<Vec<LogEntry>, ParseError>>()?;

        // Same date the catalog would give the file; none for foreign names.
        let date = self.catalog.classify(path).map(|info| {
            info.date
                .or_else(|| fs::modified_date(path))
                .unwrap_or_else(|| chrono::Local::now().date_naive())
        });

        tracing::debug!(
            file = %path.display(),
            entries = entries.len(),
            "Log data read"
        );

        Ok(LogDataResponse {
            entries,
            last_modified,
            date,
        })
    }

    /// Last-modified time of a log file, for cheap change polling.
    pub fn last_modified(&self, path: &Path) -> Result<chrono::DateTime<chrono::Utc>> {
        Ok(fs::last_modified(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::error::TraceLogError;
    use std::sync::atomic::Ordering;

    const SAMPLE: &str = "2016-01-21 22:14:10,559 [P10176/D2/T1] INFO  Umbraco.Core.CoreBootManager - Umbraco starting\n\
                          2016-01-21 22:16:47,114 [P10176/D4/T7] ERROR Umbraco.Web - Boom\n\
                          \x20  at Frame()\n";

    fn service_for(dir: &Path) -> TraceLogService {
        TraceLogService::new(&AppConfig {
            log_directory: dir.to_path_buf(),
            ..AppConfig::default()
        })
    }

    #[test]
    fn test_read_log_data_with_dated_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("UmbracoTraceLog.txt.2016-01-21");
        std::fs::write(&path, SAMPLE).unwrap();

        let data = service_for(dir.path()).read_log_data(&path).unwrap();
        assert_eq!(data.entries.len(), 2);
        assert_eq!(data.entries[1].message, "Boom\n   at Frame()");
        assert_eq!(
            data.date,
            Some(chrono::NaiveDate::from_ymd_opt(2016, 1, 21).unwrap())
        );
        assert_eq!(
            data.last_modified_millis(),
            fs::last_modified(&path).unwrap().timestamp_millis()
        );
    }

    #[test]
    fn test_read_log_data_undated_and_unrecognised_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let current = dir.path().join("UmbracoTraceLog.txt");
        let other = dir.path().join("copy-of-log.txt");
        std::fs::write(&current, SAMPLE).unwrap();
        std::fs::write(&other, SAMPLE).unwrap();

        let service = service_for(dir.path());
        assert_eq!(
            service.read_log_data(&current).unwrap().date,
            fs::modified_date(&current)
        );
        assert_eq!(service.read_log_data(&other).unwrap().date, None);
    }

    #[test]
    fn test_read_log_data_date_matches_catalog_item() {
        let dir = tempfile::tempdir().expect("tempdir");
        let current = dir.path().join("UmbracoTraceLog.WEB01.txt");
        std::fs::write(&current, SAMPLE).unwrap();

        let service = service_for(dir.path());
        let items = service.list_files().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            service.read_log_data(&current).unwrap().date,
            Some(items[0].date)
        );
    }

    #[test]
    fn test_read_log_data_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = service_for(dir.path()).read_log_data(&dir.path().join("UmbracoTraceLog.txt"));
        assert!(matches!(
            result,
            Err(TraceLogError::Parse(ParseError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_list_files_uses_configured_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("UmbracoTraceLog.txt.2016-01-21"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("CourierTraceLog.txt.2016-01-22"), SAMPLE).unwrap();

        let items = service_for(dir.path()).list_files().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_alternate_family);
    }

    #[test]
    fn test_list_paths_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(service_for(dir.path()).list_paths::<&str>(None).is_err());
    }

    #[test]
    fn test_cancelled_service_yields_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("UmbracoTraceLog.txt");
        std::fs::write(&path, SAMPLE).unwrap();

        let flag = Arc::new(AtomicBool::new(false));
        let service = service_for(dir.path()).with_cancel_flag(Arc::clone(&flag));
        flag.store(true, Ordering::SeqCst);
        assert_eq!(service.open_entries(&path).unwrap().count(), 0);
    }
}
