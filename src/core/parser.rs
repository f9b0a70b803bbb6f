// TraceLog - core/parser.rs
//
// Stream-oriented trace log parsing.
// Core layer: accepts BufRead implementations; `EntryParser::open` is the
// only place a file is opened, and the handle lives exactly as long as the
// returned stream.
//
// Entry-start lines come in several historical layouts that disagree about
// where the thread/process/domain block sits:
//
//   2014-06-26 20:36:23,372 [10] INFO  Umbraco.Core.PluginManager - [Thread 1] Determining hash
//   2015-08-10 20:10:24,363 [30] WARN  umbraco.content - [P7388/T21/D9] Failed to load Xml
//   2016-01-21 22:14:10,559 [P10176/D2/T1] INFO  Umbraco.Core.CoreBootManager - Umbraco starting
//   2016-01-21 22:14:10,559 8 INFO  Umbraco.Core.CoreBootManager - Umbraco starting
//
// Each head layout is its own `EntryLayout`, tried in priority order. The
// block after the logger dash is recognised separately, on the message tail,
// and wins over the leading block when both are present.

use crate::core::model::{Identifiers, LogEntry};
use crate::util::constants;
use crate::util::error::ParseError;
use chrono::NaiveDateTime;
use regex::Regex;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Source label used for content that did not come from a file.
const IN_MEMORY_SOURCE: &str = "<memory>";

// =============================================================================
// Layouts
// =============================================================================

/// Fields captured from an entry-start line, borrowed from the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch<'l> {
    /// The `yyyy-MM-dd HH:mm:ss,fff` prefix.
    pub timestamp: &'l str,
    /// Identifier block before the level; empty when the layout has none.
    pub block: &'l str,
    pub level: &'l str,
    pub logger: &'l str,
    /// Everything after the logger dash, possibly starting with a second
    /// identifier block.
    pub tail: &'l str,
}

/// One historical entry-start grammar.
pub trait EntryLayout: Send + Sync + fmt::Debug {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Match a left-trimmed line, or `None` if this layout does not apply.
    fn match_line<'l>(&self, line: &'l str) -> Option<LineMatch<'l>>;
}

/// A layout defined by a single anchored regex with `timestamp`, `level`,
/// `logger`, optional `block` and optional `tail` capture groups.
#[derive(Debug)]
pub struct RegexLayout {
    name: &'static str,
    pattern: Regex,
}

impl RegexLayout {
    fn new(name: &'static str, head: &str) -> Self {
        // The head patterns are compile-time constants exercised by the unit
        // tests below, so a mistake shows up as a failing test.
        let full = format!(
            r"^(?P<timestamp>\d{{4}}-\d{{2}}-\d{{2}} \d{{2}}:\d{{2}}:\d{{2}},\d{{3}}){head}\s+(?P<level>\w+)\s+(?P<logger>.+?) -(?:\s(?P<tail>.*))?$"
        );
        Self {
            name,
            pattern: Regex::new(&full).expect("entry layout: invalid regex"),
        }
    }

    /// `[P10176/D2/T1]` (or `[10]`) between the time and the level.
    pub fn bracketed_block() -> Self {
        Self::new("bracketed-block", r" \[(?P<block>[^\]]*)\]")
    }

    /// Bare numeric thread number between the time and the level.
    pub fn bare_numeric_block() -> Self {
        Self::new("bare-numeric-block", r" (?P<block>\d+)")
    }

    /// No identifier before the level at all (earliest layout).
    pub fn no_block() -> Self {
        Self::new("no-block", "")
    }
}

impl EntryLayout for RegexLayout {
    fn name(&self) -> &'static str {
        self.name
    }

    fn match_line<'l>(&self, line: &'l str) -> Option<LineMatch<'l>> {
        let caps = self.pattern.captures(line)?;
        Some(LineMatch {
            timestamp: caps.name("timestamp")?.as_str(),
            block: caps.name("block").map_or("", |m| m.as_str()),
            level: caps.name("level")?.as_str(),
            logger: caps.name("logger")?.as_str(),
            tail: caps.name("tail").map_or("", |m| m.as_str()),
        })
    }
}

// =============================================================================
// Identifier blocks
// =============================================================================

/// Recognises and decodes thread/process/domain identifier blocks.
#[derive(Debug)]
struct IdentifierGrammar {
    /// A tail that opens with a bracketed identifier block.
    tail_block: Regex,
    /// Individual tokens inside a block.
    token: Regex,
}

impl IdentifierGrammar {
    fn new() -> Self {
        Self {
            tail_block: Regex::new(
                r"(?i)^\[(?P<block>thread \d+|[ptd]\d+(?:/[ptd]\d+)*)\] ?(?P<rest>.*)$",
            )
            .expect("identifier grammar: invalid tail regex"),
            token: Regex::new(
                r"(?i)T(?P<thread>\d+)|D(?P<domain>\d+)|P(?P<process>\d+)|Thread (?P<legacy>\d+)",
            )
            .expect("identifier grammar: invalid token regex"),
        }
    }

    /// Split a message tail into (post-logger block, message).
    /// The block is empty when the tail does not open with one.
    fn split_tail<'l>(&self, tail: &'l str) -> (&'l str, &'l str) {
        match self.tail_block.captures(tail) {
            Some(caps) => match (caps.name("block"), caps.name("rest")) {
                (Some(block), Some(rest)) => (block.as_str(), rest.as_str()),
                _ => ("", tail),
            },
            None => ("", tail),
        }
    }

    /// Decode every recognisable token in `block`. A `Thread <n>` token only
    /// counts when no `T<n>` token is present.
    fn decode(&self, block: &str) -> Identifiers {
        let mut ids = Identifiers::default();
        let mut legacy_thread = None;

        for caps in self.token.captures_iter(block) {
            if let Some(m) = caps.name("thread") {
                ids.thread_id = Some(m.as_str().to_string());
            }
            if let Some(m) = caps.name("process") {
                ids.process_id = Some(m.as_str().to_string());
            }
            if let Some(m) = caps.name("domain") {
                ids.domain_id = Some(m.as_str().to_string());
            }
            if let Some(m) = caps.name("legacy") {
                legacy_thread = Some(m.as_str().to_string());
            }
        }

        if ids.thread_id.is_none() {
            ids.thread_id = legacy_thread;
        }
        ids
    }
}

// =============================================================================
// Parser
// =============================================================================

/// Recognises entry-start lines and builds `LogEntry` values from them.
///
/// Holds only compiled, read-only patterns, so one instance can be shared
/// by any number of concurrent streams.
#[derive(Debug)]
pub struct EntryParser {
    layouts: Vec<Box<dyn EntryLayout>>,
    identifiers: IdentifierGrammar,
}

impl Default for EntryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryParser {
    /// Parser with every built-in layout, most specific first.
    pub fn new() -> Self {
        Self::with_layouts(vec![
            Box::new(RegexLayout::bracketed_block()),
            Box::new(RegexLayout::bare_numeric_block()),
            Box::new(RegexLayout::no_block()),
        ])
    }

    /// Parser with a caller-chosen layout chain, tried in order.
    pub fn with_layouts(layouts: Vec<Box<dyn EntryLayout>>) -> Self {
        Self {
            layouts,
            identifiers: IdentifierGrammar::new(),
        }
    }

    /// Names of the layouts in the order they are tried.
    pub fn layout_names(&self) -> Vec<&'static str> {
        self.layouts.iter().map(|l| l.name()).collect()
    }

    /// First layout that accepts `line`.
    fn match_line<'l>(&self, line: &'l str) -> Option<(&'static str, LineMatch<'l>)> {
        self.layouts
            .iter()
            .find_map(|layout| layout.match_line(line).map(|m| (layout.name(), m)))
    }

    /// Build a new entry if `line` is an entry-start line.
    ///
    /// `Ok(None)` means "continuation line". An entry-start line whose
    /// timestamp does not parse is an error, never a continuation.
    fn recognise(
        &self,
        line: &str,
        sequence: u64,
        line_number: u64,
        source: &Path,
    ) -> Result<Option<LogEntry>, ParseError> {
        let trimmed = line.trim_start();
        let Some((layout, m)) = self.match_line(trimmed) else {
            return Ok(None);
        };

        // Fixed-width prefix; every layout anchors the timestamp at column 0.
        let raw_timestamp = trimmed
            .get(..constants::TIMESTAMP_PREFIX_LEN)
            .unwrap_or(m.timestamp);
        let timestamp = NaiveDateTime::parse_from_str(raw_timestamp, constants::TIMESTAMP_FORMAT)
            .map_err(|e| {
                tracing::debug!(
                    file = %source.display(),
                    line_number,
                    layout,
                    error = %e,
                    line = crate::util::logging::preview(trimmed),
                    "Entry-start line has an unparseable timestamp"
                );
                ParseError::MalformedTimestamp {
                    file: source.to_path_buf(),
                    line_number,
                    raw_timestamp: raw_timestamp.to_string(),
                }
            })?;

        let (post_block, message) = self.identifiers.split_tail(m.tail);
        // The block after the logger belongs to the newer, more specific
        // layout; fall back to the leading block only when it is absent.
        let block = if post_block.is_empty() { m.block } else { post_block };
        let ids = self.identifiers.decode(block);

        tracing::trace!(line_number, layout, block, "Entry start");

        Ok(Some(LogEntry {
            sequence,
            line_number,
            timestamp,
            level: m.level.to_string(),
            logger: m.logger.to_string(),
            message: message.to_string(),
            thread_id: ids.thread_id,
            process_id: ids.process_id,
            domain_id: ids.domain_id,
        }))
    }

    /// Parse a single line on its own.
    ///
    /// Returns `Ok(None)` when the line is not an entry-start line.
    pub fn parse_line(&self, line: &str) -> Result<Option<LogEntry>, ParseError> {
        self.recognise(line, 0, 1, Path::new(IN_MEMORY_SOURCE))
    }

    /// Lazily parse entries from any buffered reader.
    ///
    /// `source` is used for error messages and diagnostics only.
    pub fn stream<R: BufRead>(&self, reader: R, source: impl Into<PathBuf>) -> EntryStream<'_, R> {
        EntryStream {
            parser: self,
            lines: reader.lines(),
            source: source.into(),
            open: None,
            next_sequence: 0,
            line_number: 0,
            discarded: 0,
            cancel_flag: None,
            finished: false,
        }
    }

    /// Open a log file and lazily parse it.
    ///
    /// The file is closed when the returned stream is dropped, whether it was
    /// read to the end, abandoned early, or stopped by an error.
    pub fn open(&self, path: &Path) -> Result<EntryStream<'_, BufReader<File>>, ParseError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ParseError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ParseError::Io {
                file: path.to_path_buf(),
                source: e,
            },
        })?;

        tracing::debug!(file = %path.display(), "Parsing started");
        Ok(self.stream(BufReader::new(file), path))
    }

    /// Parse a whole file into memory.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<LogEntry>, ParseError> {
        self.open(path)?.collect()
    }

    /// Parse in-memory content.
    pub fn parse_str(&self, content: &str) -> Result<Vec<LogEntry>, ParseError> {
        self.stream(content.as_bytes(), IN_MEMORY_SOURCE).collect()
    }
}

// =============================================================================
// Streaming
// =============================================================================

/// Lazy, finite, non-restartable sequence of parsed entries.
///
/// Holds the reader, the entry currently being folded, and nothing else.
/// After the first error the stream is fused and yields `None`.
pub struct EntryStream<'p, R> {
    parser: &'p EntryParser,
    lines: io::Lines<R>,
    source: PathBuf,
    open: Option<LogEntry>,
    next_sequence: u64,
    line_number: u64,
    discarded: u64,
    cancel_flag: Option<Arc<AtomicBool>>,
    finished: bool,
}

impl<'p, R: BufRead> EntryStream<'p, R> {
    /// Stop yielding entries once `flag` is set.
    ///
    /// The entry being folded at that moment is dropped, since its message
    /// may be incomplete.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    /// Physical lines consumed so far.
    pub fn lines_read(&self) -> u64 {
        self.line_number
    }

    /// Source path (or `<memory>`) this stream reads from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn fail(&mut self, err: ParseError) -> Option<Result<LogEntry, ParseError>> {
        self.finished = true;
        self.open = None;
        tracing::debug!(file = %self.source.display(), error = %err, "Parsing aborted");
        Some(Err(err))
    }

    fn read_error(&self, e: io::Error) -> ParseError {
        match e.kind() {
            io::ErrorKind::InvalidData => ParseError::InvalidEncoding {
                file: self.source.clone(),
                line_number: self.line_number + 1,
            },
            _ => ParseError::Io {
                file: self.source.clone(),
                source: e,
            },
        }
    }
}

impl<'p, R: BufRead> Iterator for EntryStream<'p, R> {
    type Item = Result<LogEntry, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if self.is_cancelled() {
                tracing::debug!(
                    file = %self.source.display(),
                    lines = self.line_number,
                    "Parsing cancelled by request"
                );
                self.finished = true;
                self.open = None;
                return None;
            }

            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    let err = self.read_error(e);
                    return self.fail(err);
                }
                None => {
                    self.finished = true;
                    tracing::debug!(
                        file = %self.source.display(),
                        entries = self.next_sequence,
                        lines = self.line_number,
                        discarded = self.discarded,
                        "Parsing complete"
                    );
                    return self.open.take().map(Ok);
                }
            };

            self.line_number += 1;
            let text = if self.line_number == 1 {
                line.strip_prefix(constants::UTF8_BOM).unwrap_or(&line)
            } else {
                line.as_str()
            };

            match self
                .parser
                .recognise(text, self.next_sequence, self.line_number, &self.source)
            {
                Ok(Some(entry)) => {
                    self.next_sequence += 1;
                    if let Some(done) = self.open.replace(entry) {
                        return Some(Ok(done));
                    }
                }
                Ok(None) => match self.open.as_mut() {
                    Some(open) => open.fold_line(text),
                    None => self.discarded += 1,
                },
                Err(err) => return self.fail(err),
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
