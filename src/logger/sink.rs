//! `Sink`: the one place the driver writes a structured event. Two
//! implementations ship: `ConsoleSink` (stderr, colorized when the `cli`
//! feature is on) and `JsonlSink` (one JSON object per line, degrading to
//! stderr if the target file can't be opened).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::errors::Result;

/// Severity of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    const fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// One structured log event: a severity, a human message, and optionally
/// the principal it concerns plus free-form structured context (e.g. the
/// matched rule name behind an evaluation-anomaly warning).
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl LogEvent {
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            principal: None,
            context: None,
        }
    }

    #[must_use]
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Something the driver can hand a [`LogEvent`] to. A failing sink must
/// never abort the run: `log` returning `Err` means "this event was lost",
/// not "the assessment failed."
pub trait Sink {
    fn log(&mut self, event: &LogEvent) -> Result<()>;
}

/// Writes events to stderr, one line each, colorized by severity when the
/// `cli` feature is compiled in.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    quiet: bool,
}

impl ConsoleSink {
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Sink for ConsoleSink {
    fn log(&mut self, event: &LogEvent) -> Result<()> {
        if self.quiet && !matches!(event.severity, Severity::Error) {
            return Ok(());
        }
        let label = colorize(event.severity);
        let principal = event
            .principal
            .as_deref()
            .map_or_else(String::new, |p| format!(" [{p}]"));
        eprintln!("{label}{principal} {}", event.message);
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn colorize(severity: Severity) -> colored::ColoredString {
    use colored::Colorize;
    match severity {
        Severity::Debug => severity.label().dimmed(),
        Severity::Info => severity.label().normal(),
        Severity::Warn => severity.label().yellow(),
        Severity::Error => severity.label().red().bold(),
    }
}

#[cfg(not(feature = "cli"))]
fn colorize(severity: Severity) -> &'static str {
    severity.label()
}

/// Writes one JSON object per line to a file. Falls back to stderr (and
/// then to silent discard) if the file can't be opened or written — a
/// broken log target must never be fatal to the assessment it's logging.
pub struct JsonlSink {
    file: Option<File>,
    path: PathBuf,
}

impl JsonlSink {
    /// Open (creating/truncating) the file at `path`. A failure to open is
    /// not itself an error: the sink degrades to stderr on every `log` call
    /// instead, matching the rest of the crate's local-degradation stance
    /// on logging infrastructure.
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok();
        Self { file, path }
    }
}

impl Sink for JsonlSink {
    fn log(&mut self, event: &LogEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        if let Some(file) = self.file.as_mut() {
            if writeln!(file, "{line}").is_ok() {
                return Ok(());
            }
            self.file = None;
        }
        eprintln!("[{}] jsonl sink degraded, event follows: {line}", self.path.display());
        Ok(())
    }
}

/// Collects every logged event instead of writing it anywhere. Used by other
/// modules' tests to assert a warning was actually emitted, not just that
/// the evaluation degraded quietly.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<LogEvent>,
}

#[cfg(test)]
impl Sink for RecordingSink {
    fn log(&mut self, event: &LogEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_sink_writes_one_line_per_event() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("events.jsonl");
        let mut sink = JsonlSink::open(&path);
        sink.log(&LogEvent::new(Severity::Info, "hello")).unwrap();
        sink.log(&LogEvent::new(Severity::Warn, "world").with_principal("alice"))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"principal\":\"alice\""));
    }

    #[test]
    fn jsonl_sink_degrades_gracefully_when_path_is_unwritable() {
        let mut sink = JsonlSink::open("/nonexistent-directory/events.jsonl");
        assert!(sink.log(&LogEvent::new(Severity::Error, "boom")).is_ok());
    }

    #[test]
    fn console_sink_suppresses_non_error_events_when_quiet() {
        let mut sink = ConsoleSink::new(true);
        assert!(sink.log(&LogEvent::new(Severity::Info, "quiet please")).is_ok());
        assert!(sink.log(&LogEvent::new(Severity::Error, "still shown")).is_ok());
    }
}
