//! Clock and log sink seams.
//!
//! The MusicBrainz rate limiter reads time through [`Clock`] so the one
//! second gap between catalog requests can be checked without waiting. The
//! tracing setup in `core-runtime` mirrors events into a [`LoggerSink`] when a
//! host wants them, e.g. a status line during an import.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::Result;

/// Millisecond time source.
pub trait Clock: Send + Sync {
    fn unix_timestamp_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// One tracing event as handed to a [`LoggerSink`].
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Module path of the event, e.g. `core_metadata::providers::musicbrainz`
    pub target: String,
    pub message: String,
    /// Event fields such as `artist` or `offset`, rendered as text
    pub fields: HashMap<String, String>,
    /// Name of the innermost span, e.g. `catalog_import`
    pub span_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
            span_id: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }
}

/// Host side receiver for log events.
///
/// ```ignore
/// struct StatusBar(Sender<String>);
///
/// #[async_trait]
/// impl LoggerSink for StatusBar {
///     async fn log(&self, entry: LogEntry) -> Result<()> {
///         let _ = self.0.send(entry.message);
///         Ok(())
///     }
///
///     fn min_level(&self) -> LogLevel {
///         LogLevel::Warn
///     }
/// }
/// ```
#[async_trait]
pub trait LoggerSink: Send + Sync {
    async fn log(&self, entry: LogEntry) -> Result<()>;

    /// Events below this level are dropped before [`LoggerSink::log`] runs.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl LoggerSink for RecordingSink {
        async fn log(&self, entry: LogEntry) -> Result<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let first = clock.unix_timestamp_millis();
        let second = clock.unix_timestamp_millis();
        assert!(first > 0);
        assert!(second >= first);
    }

    #[test]
    fn test_log_entry_builder() {
        let entry = LogEntry::new(LogLevel::Info, "core_service", "Import started")
            .with_field("artist", "Genesis")
            .with_span_id("catalog_import");

        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.target, "core_service");
        assert_eq!(entry.message, "Import started");
        assert_eq!(entry.fields.get("artist"), Some(&"Genesis".to_string()));
        assert_eq!(entry.span_id.as_deref(), Some("catalog_import"));
    }

    #[test]
    fn test_log_levels_are_ordered() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Debug < LogLevel::Info);
    }

    #[tokio::test]
    async fn test_sink_defaults_to_info() {
        let sink = RecordingSink::default();
        assert_eq!(sink.min_level(), LogLevel::Info);

        sink.log(LogEntry::new(LogLevel::Warn, "core_metadata", "Rate limited").with_field("retry_after", "2"))
            .await
            .unwrap();

        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].fields["retry_after"], "2");
    }
}
