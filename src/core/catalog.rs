// TraceLog - core/catalog.rs
//
// Rotated trace log file cataloging.
// Core layer: reads file *names* and, when a name carries no date, file
// *metadata* (mtime). Never reads file contents; that is the parser's job.
//
// Recognised names (case-insensitive, basename only):
//
//   <family>.txt
//   <family>.txt.<yyyy-MM-dd>
//   <family>.<machine>.txt
//   <family>.<machine>.txt.<yyyy-MM-dd>
//   <family>.<yyyy-MM-dd>.txt
//
// where <family> is the primary or the alternate family name.

use crate::core::model::{file_name_of, DateSource, LogFileItem};
use crate::util::constants;
use crate::util::error::CatalogError;
use chrono::{DateTime, Local, NaiveDate};
use regex::Regex;
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

/// Family names the catalog recognises.
///
/// Resolved once at startup (config file, then CLI overrides) and passed in
/// as plain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// File-name prefix of the primary log family.
    pub family_name: String,

    /// File-name prefix of the companion subsystem's logs. Matching files are
    /// cataloged with `is_alternate_family` set.
    pub alternate_family_name: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            family_name: constants::DEFAULT_FAMILY_NAME.to_string(),
            alternate_family_name: constants::DEFAULT_ALTERNATE_FAMILY_NAME.to_string(),
        }
    }
}

// =============================================================================
// Name decomposition
// =============================================================================

/// The parts of a recognised log file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameInfo {
    /// Host qualifier; empty when the name has none.
    pub machine_name: String,

    /// Date embedded in the name, if any.
    pub date: Option<NaiveDate>,

    /// Name starts with the alternate family prefix.
    pub is_alternate_family: bool,
}

/// Recognises trace log file names and turns paths into sorted catalog items.
#[derive(Debug)]
pub struct FileCatalog {
    config: CatalogConfig,
    /// Matches what follows the family token.
    suffix: Regex,
}

impl Default for FileCatalog {
    fn default() -> Self {
        Self::new(CatalogConfig::default())
    }
}

impl FileCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        // Greedy machine capture: a machine name may itself contain dots, so
        // the last `.txt` is the extension.
        let pattern = format!(
            r"(?i)^(?:\.(?P<machine>.+))?\.{ext}(?:\.(?P<date>\d{{4}}-\d{{2}}-\d{{2}}))?$",
            ext = constants::LOG_FILE_EXTENSION
        );
        Self {
            config,
            suffix: Regex::new(&pattern).expect("catalog name grammar: invalid regex"),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Decompose a path's basename, or `None` when it is not a trace log name.
    ///
    /// A name with the family prefix but a malformed tail (`.bak`, an
    /// impossible date such as `2015-15-01`) is rejected outright.
    pub fn classify(&self, path: &Path) -> Option<NameInfo> {
        let name = file_name_of(path);

        let families = [
            (self.config.family_name.as_str(), false),
            (self.config.alternate_family_name.as_str(), true),
        ];

        families
            .iter()
            .filter(|(family, _)| !family.is_empty())
            .find_map(|&(family, is_alternate)| {
                let rest = strip_prefix_ignore_case(name, family)?;
                self.decompose(rest, is_alternate)
            })
    }

    fn decompose(&self, rest: &str, is_alternate_family: bool) -> Option<NameInfo> {
        let caps = self.suffix.captures(rest)?;

        let machine = caps.name("machine").map_or("", |m| m.as_str());
        let trailing_date = match caps.name("date") {
            Some(m) => Some(parse_file_date(m.as_str())?),
            None => None,
        };

        // `<family>.<yyyy-MM-dd>.txt`: a date-shaped segment is never a
        // machine name. It must be a real date and the only one in the name.
        if is_date_shaped(machine) {
            if trailing_date.is_some() {
                return None;
            }
            return Some(NameInfo {
                machine_name: String::new(),
                date: Some(parse_file_date(machine)?),
                is_alternate_family,
            });
        }

        Some(NameInfo {
            machine_name: machine.to_string(),
            date: trailing_date,
            is_alternate_family,
        })
    }

    /// Catalog an explicit list of paths, newest first.
    ///
    /// Unrecognised names are dropped. Paths need not exist: a name without
    /// a date falls back to the file's mtime, then to today.
    pub fn catalog_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<LogFileItem> {
        let today = Local::now().date_naive();
        let items = paths
            .iter()
            .filter_map(|p| {
                let path = p.as_ref();
                let modified = || std::fs::metadata(path).ok().as_ref().and_then(local_mtime_date);
                self.item_for(path, modified, today)
            })
            .collect();

        sort_newest_first(items)
    }

    /// Like `catalog_paths`, for boundaries where the list may be absent.
    pub fn catalog_listing<P: AsRef<Path>>(
        &self,
        paths: Option<&[P]>,
    ) -> Result<Vec<LogFileItem>, CatalogError> {
        match paths {
            Some(paths) => Ok(self.catalog_paths(paths)),
            None => Err(CatalogError::InvalidArgument {
                reason: "no file listing supplied",
            }),
        }
    }

    /// Catalog the trace logs directly inside `dir` (no recursion).
    pub fn scan_directory(&self, dir: &Path) -> Result<Vec<LogFileItem>, CatalogError> {
        match std::fs::metadata(dir) {
            Ok(meta) if !meta.is_dir() => {
                return Err(CatalogError::NotADirectory {
                    path: dir.to_path_buf(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::DirectoryNotFound {
                    path: dir.to_path_buf(),
                });
            }
            // Other metadata failures surface through walkdir below.
            _ => {}
        }

        tracing::debug!(dir = %dir.display(), "Catalog scan starting");

        let today = Local::now().date_naive();
        let mut items = Vec::new();
        let mut skipped = 0usize;

        let walker = walkdir::WalkDir::new(dir)
            .max_depth(constants::CATALOG_SCAN_DEPTH)
            .follow_links(false);

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) if e.depth() == 0 => {
                    return Err(CatalogError::Traversal {
                        path: dir.to_path_buf(),
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), error = %e, "Skipping inaccessible entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let modified = || entry.metadata().ok().as_ref().and_then(local_mtime_date);

            match self.item_for(entry.path(), modified, today) {
                Some(item) => items.push(item),
                None => skipped += 1,
            }
        }

        tracing::debug!(
            dir = %dir.display(),
            files = items.len(),
            skipped,
            "Catalog scan complete"
        );

        Ok(sort_newest_first(items))
    }

    fn item_for<F>(&self, path: &Path, modified: F, today: NaiveDate) -> Option<LogFileItem>
    where
        F: FnOnce() -> Option<NaiveDate>,
    {
        let Some(info) = self.classify(path) else {
            tracing::trace!(file = %path.display(), "Not a trace log name");
            return None;
        };

        let (date, date_source) = match info.date {
            Some(d) => (d, DateSource::FileName),
            None => match modified() {
                Some(d) => (d, DateSource::Modified),
                None => (today, DateSource::Today),
            },
        };

        Some(LogFileItem {
            date,
            path: PathBuf::from(path),
            machine_name: info.machine_name,
            is_alternate_family: info.is_alternate_family,
            date_source,
        })
    }
}

/// Date descending. `sort_by` is stable, so equal dates keep input order.
fn sort_newest_first(mut items: Vec<LogFileItem>) -> Vec<LogFileItem> {
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items
}

fn parse_file_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, constants::FILE_DATE_FORMAT).ok()
}

/// `dddd-dd-dd`, whether or not it is a valid calendar date.
fn is_date_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Local calendar date of a file's mtime.
fn local_mtime_date(meta: &std::fs::Metadata) -> Option<NaiveDate> {
    meta.modified()
        .ok()
        .map(|t| DateTime::<Local>::from(t).date_naive())
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn classify(name: &str) -> Option<NameInfo> {
        FileCatalog::default().classify(Path::new(name))
    }

    #[test]
    fn test_classify_plain_name() {
        let info = classify("UmbracoTraceLog.txt").unwrap();
        assert_eq!(info.machine_name, "");
        assert_eq!(info.date, None);
        assert!(!info.is_alternate_family);
    }

    #[test]
    fn test_classify_dated_name() {
        let info = classify("UmbracoTraceLog.txt.2015-09-05").unwrap();
        assert_eq!(info.machine_name, "");
        assert_eq!(info.date, Some(date(2015, 9, 5)));
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(
            classify("umbracotracelog.txt.2016-01-02").unwrap().date,
            Some(date(2016, 1, 2))
        );
        let info = classify("UmbracoTraceLog.MachineName.TXT.2016-01-15").unwrap();
        assert_eq!(info.machine_name, "MachineName");
        assert_eq!(info.date, Some(date(2016, 1, 15)));
    }

    #[test]
    fn test_classify_dotted_machine_name() {
        let info = classify("UmbracoTraceLog.Machine.Name.txt.2016-01-16").unwrap();
        assert_eq!(info.machine_name, "Machine.Name");
        assert_eq!(info.date, Some(date(2016, 1, 16)));
    }

    #[test]
    fn test_classify_date_in_machine_position() {
        let info = classify("UmbracoTraceLog.2016-01-02.txt").unwrap();
        assert_eq!(info.machine_name, "");
        assert_eq!(info.date, Some(date(2016, 1, 2)));
    }

    #[test]
    fn test_invalid_date_in_machine_position_is_never_today() {
        let items = FileCatalog::default().catalog_paths(&[
            "UmbracoTraceLog.2015-15-01.txt",
            "UmbracoTraceLog.2016-02-30.txt",
            "UmbracoTraceLog.2016-01-02.txt",
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].date, date(2016, 1, 2));
        assert_eq!(items[0].date_source, DateSource::FileName);
        assert_eq!(items[0].machine_name, "");
    }

    #[test]
    fn test_date_shape() {
        assert!(is_date_shaped("2015-15-01"));
        assert!(!is_date_shaped("WEB01"));
        assert!(!is_date_shaped("2015-1-011"));
        assert!(!is_date_shaped(""));
    }

    #[test]
    fn test_machine_name_extraction() {
        let cases = [
            ("UmbracoTraceLog.SuperKitten-PC.txt", "SuperKitten-PC"),
            (
                r"C:\Somewhere\Courier\logs\CourierTraceLog.SuperKitten-PC.txt",
                "SuperKitten-PC",
            ),
            (
                r"D:\somepath\logs\UmbracoTraceLog.BananaMan.txt.2017-09-15",
                "BananaMan",
            ),
            ("CourierTraceLog.SpiritMachine.txt", "SpiritMachine"),
            ("UmbracoTraceLog.BeepleBrox.txt.2017-07-25", "BeepleBrox"),
            ("UmbracoTraceLog.RD00155D671B04.txt", "RD00155D671B04"),
            ("/srv/site/App_Data/Logs/UmbracoTraceLog.WEB01.txt", "WEB01"),
        ];
        for (path, expected) in cases {
            let info = classify(path).unwrap_or_else(|| panic!("not recognised: {path}"));
            assert_eq!(info.machine_name, expected, "path: {path}");
        }
    }

    #[test]
    fn test_alternate_family_flag() {
        assert!(classify("CourierTraceLog.txt").unwrap().is_alternate_family);
        assert!(classify("couriertracelog.SpiritMachine.txt").unwrap().is_alternate_family);
        assert!(!classify("UmbracoTraceLog.SpiritMachine.txt").unwrap().is_alternate_family);
    }

    #[test]
    fn test_rejected_names() {
        for name in [
            "SomeOtherFile.txt",
            "UmbracoTraceLog.txt.bak",
            "UmbracoTraceLog.txt.2015-10-01.bak",
            "UmbracoTraceLog.txt.2015-15-01",
            "UmbracoTraceLog.txt.2015-02-30",
            "UmbracoTraceLogs.txt",
            "UmbracoTraceLog.log",
            "UmbracoTraceLog",
            "OtherTraceLog.Machine.txt",
            "UmbracoTraceLog.2015-15-01.txt",
            "UmbracoTraceLog.2016-02-30.txt",
            "UmbracoTraceLog.2016-01-02.txt.2016-01-03",
            "",
        ] {
            assert!(classify(name).is_none(), "should be rejected: {name}");
        }
    }

    #[test]
    fn test_custom_family_names() {
        let catalog = FileCatalog::new(CatalogConfig {
            family_name: "SiteTrace".to_string(),
            alternate_family_name: "DeployTrace".to_string(),
        });
        assert!(catalog.classify(Path::new("SiteTrace.txt")).is_some());
        assert!(catalog
            .classify(Path::new("DeployTrace.BOX.txt"))
            .unwrap()
            .is_alternate_family);
        assert!(catalog.classify(Path::new("UmbracoTraceLog.txt")).is_none());
    }

    #[test]
    fn test_empty_alternate_family_is_ignored() {
        let catalog = FileCatalog::new(CatalogConfig {
            family_name: "UmbracoTraceLog".to_string(),
            alternate_family_name: String::new(),
        });
        assert!(catalog.classify(Path::new(".txt")).is_none());
        assert!(catalog.classify(Path::new("CourierTraceLog.txt")).is_none());
    }

    #[test]
    fn test_catalog_paths_sorted_newest_first() {
        let base = r"E:\Diplo\Some Path\App_Data\Logs\";
        let names = [
            "UmbracoTraceLog.txt",
            "UmbracoTraceLog.txt.2015-09-05",
            "UmbracoTraceLog.txt.2015-10-06",
            "umbracotracelog.txt.2016-01-02",
            "UmbracoTraceLog.MachineName.txt.2016-01-04",
            "UmbracoTraceLog.MachineName.TXT.2016-01-15",
            "UmbracoTraceLog.Machine.Name.txt.2016-01-16",
            "UmbracoTraceLog.MictPHC124-PC.txt.2014-11-19",
            "SomeOtherFile.txt",
            "UmbracoTraceLog.txt.bak",
            "UmbracoTraceLog.txt.2015-10-01.bak",
            "UmbracoTraceLog.txt.2015-15-01",
        ];
        let paths: Vec<String> = names.iter().map(|n| format!("{base}{n}")).collect();

        let items = FileCatalog::default().catalog_paths(&paths);

        assert_eq!(items.len(), 8);
        assert_eq!(items[0].file_name(), "UmbracoTraceLog.txt");
        assert_eq!(items[0].date, Local::now().date_naive());
        assert_eq!(items[0].date_source, DateSource::Today);
        assert_eq!(items[1].date, date(2016, 1, 16));
        assert_eq!(items[1].machine_name, "Machine.Name");
        assert_eq!(items[6].date, date(2015, 9, 5));
        assert_eq!(items[7].date, date(2014, 11, 19));
        assert_eq!(items[7].machine_name, "MictPHC124-PC");
        assert!(items.iter().all(|i| i.path.to_str().unwrap().starts_with(base)));
    }

    #[test]
    fn test_catalog_paths_stable_for_equal_dates() {
        let paths = [
            "UmbracoTraceLog.B.txt.2016-01-02",
            "UmbracoTraceLog.A.txt.2016-01-02",
            "UmbracoTraceLog.C.txt.2016-01-03",
            "CourierTraceLog.D.txt.2016-01-02",
        ];
        let items = FileCatalog::default().catalog_paths(&paths);
        let machines: Vec<&str> = items.iter().map(|i| i.machine_name.as_str()).collect();
        assert_eq!(machines, vec!["C", "B", "A", "D"]);
    }

    #[test]
    fn test_catalog_listing_absent_is_invalid_argument() {
        let result = FileCatalog::default().catalog_listing::<&str>(None);
        assert!(matches!(result, Err(CatalogError::InvalidArgument { .. })));
    }

    #[test]
    fn test_catalog_listing_empty() {
        let empty: [&str; 0] = [];
        let items = FileCatalog::default().catalog_listing(Some(&empty[..])).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_scan_directory_uses_mtime_for_undated_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("UmbracoTraceLog.txt"), "").unwrap();
        fs::write(dir.path().join("UmbracoTraceLog.txt.2015-09-05"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let items = FileCatalog::default().scan_directory(dir.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].file_name(), "UmbracoTraceLog.txt");
        assert_eq!(items[0].date_source, DateSource::Modified);
        assert_eq!(items[1].date_source, DateSource::FileName);
        assert_eq!(items[1].date, date(2015, 9, 5));
    }

    #[test]
    fn test_scan_directory_is_not_recursive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sub = dir.path().join("archive");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("UmbracoTraceLog.txt.2015-09-05"), "").unwrap();

        let items = FileCatalog::default().scan_directory(dir.path()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_scan_directory_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing");
        match FileCatalog::default().scan_directory(&missing) {
            Err(CatalogError::DirectoryNotFound { path }) => assert_eq!(path, missing),
            other => panic!("expected DirectoryNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_directory_not_a_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("UmbracoTraceLog.txt");
        fs::write(&file, "").unwrap();
        assert!(matches!(
            FileCatalog::default().scan_directory(&file),
            Err(CatalogError::NotADirectory { .. })
        ));
    }
}
