//! # Event Bus System
//!
//! Provides an event-driven notification layer for SongClash using
//! `tokio::sync::broadcast`. Hosts (the CLI, a GUI) subscribe to learn about
//! session changes and background job progress without polling.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for sessions, catalog
//!   imports and preview/video lookups
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering, used by
//!   the CLI to follow catalog imports
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐
//! │ Session ops  ├────────────>│           │
//! └──────────────┘             │ EventBus  │   subscribe   ┌────────────┐
//! ┌──────────────┐    emit     │ (broadcast├──────────────>│ Subscriber │
//! │ Catalog jobs ├────────────>│  channel) │               └────────────┘
//! └──────────────┘             │           │
//! ┌──────────────┐    emit     │           │
//! │ Preview jobs ├────────────>│           │
//! └──────────────┘             └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Catalog(CatalogEvent::FetchStarted {
//!         job_id: "job-1".to_string(),
//!         artist: "Genesis".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Catalog(_)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Emitting with no subscribers returns an error; emitters in the core ignore it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Ranking session changes
    Session(SessionEvent),
    /// Catalog import jobs
    Catalog(CatalogEvent),
    /// Preview lookups
    Preview(PreviewEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Catalog(e) => e.description(),
            CoreEvent::Preview(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Catalog(CatalogEvent::FetchFailed { .. }) => EventSeverity::Error,
            CoreEvent::Catalog(CatalogEvent::FetchCancelled { .. }) => EventSeverity::Warning,
            CoreEvent::Catalog(CatalogEvent::FetchCompleted { .. })
            | CoreEvent::Session(SessionEvent::Loaded { .. })
            | CoreEvent::Session(SessionEvent::Saved { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Session Events
// ============================================================================

/// Events describing changes to the ranking session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A session file replaced the in-memory state.
    Loaded { path: String, songs: usize },
    /// The session was written to disk.
    Saved { path: String, songs: usize },
    /// A vote was applied.
    Rated { winner: String, loser: String },
    /// Songs were deleted (by title or by album).
    SongsRemoved { count: usize },
    /// Several songs were merged into one.
    SongsMerged { into: String, count: usize },
    /// Songs were added by import or manual entry.
    SongsAdded { count: usize },
    /// The album filter changed.
    FilterChanged { label: String },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::Loaded { .. } => "Session loaded",
            SessionEvent::Saved { .. } => "Session saved",
            SessionEvent::Rated { .. } => "Matchup rated",
            SessionEvent::SongsRemoved { .. } => "Songs removed",
            SessionEvent::SongsMerged { .. } => "Songs merged",
            SessionEvent::SongsAdded { .. } => "Songs added",
            SessionEvent::FilterChanged { .. } => "Album filter changed",
        }
    }
}

// ============================================================================
// Catalog Events
// ============================================================================

/// Events emitted by catalog import jobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    FetchStarted {
        job_id: String,
        artist: String,
    },
    /// Incremental progress, e.g. "Processed 30 releases...".
    FetchProgress {
        job_id: String,
        message: String,
        /// Rough completion percentage when the total is known.
        percent: Option<u8>,
    },
    FetchCompleted {
        job_id: String,
        artist: String,
        /// Number of songs that were new to the session.
        added: usize,
    },
    FetchFailed {
        job_id: String,
        artist: String,
        message: String,
    },
    FetchCancelled {
        job_id: String,
        artist: String,
    },
}

impl CatalogEvent {
    fn description(&self) -> &str {
        match self {
            CatalogEvent::FetchStarted { .. } => "Catalog import started",
            CatalogEvent::FetchProgress { .. } => "Catalog import in progress",
            CatalogEvent::FetchCompleted { .. } => "Catalog import completed",
            CatalogEvent::FetchFailed { .. } => "Catalog import failed",
            CatalogEvent::FetchCancelled { .. } => "Catalog import cancelled",
        }
    }
}

// ============================================================================
// Preview Events
// ============================================================================

/// Events emitted by audio preview and video lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PreviewEvent {
    Resolved { title: String, url: String },
    NotFound { title: String },
    /// The lookup finished after its song was deleted or the job was cancelled.
    Discarded { title: String },
    VideoFound { title: String, url: String },
    VideoNotFound { title: String },
}

impl PreviewEvent {
    fn description(&self) -> &str {
        match self {
            PreviewEvent::Resolved { .. } => "Preview resolved",
            PreviewEvent::NotFound { .. } => "Preview not found",
            PreviewEvent::Discarded { .. } => "Preview result discarded",
            PreviewEvent::VideoFound { .. } => "Video found",
            PreviewEvent::VideoNotFound { .. } => "Video not found",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` that skips events rejected by a
/// predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated(winner: &str, loser: &str) -> CoreEvent {
        CoreEvent::Session(SessionEvent::Rated {
            winner: winner.to_string(),
            loser: loser.to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(rated("A", "B")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = CoreEvent::Catalog(CatalogEvent::FetchStarted {
            job_id: "job-1".to_string(),
            artist: "Kate Bush".to_string(),
        });

        assert_eq!(bus.emit(event.clone()).unwrap(), 2);
        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Preview(_)));

        bus.emit(rated("A", "B")).ok();
        let preview = CoreEvent::Preview(PreviewEvent::NotFound {
            title: "Mama".to_string(),
        });
        bus.emit(preview.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), preview);

        drop(bus);
        assert!(matches!(stream.recv().await, Err(RecvError::Closed)));
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(rated(&format!("song-{}", i), "other")).ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity_and_description() {
        let failed = CoreEvent::Catalog(CatalogEvent::FetchFailed {
            job_id: "job-1".to_string(),
            artist: "Genesis".to_string(),
            message: "HTTP 503".to_string(),
        });
        assert_eq!(failed.severity(), EventSeverity::Error);
        assert_eq!(failed.description(), "Catalog import failed");

        let saved = CoreEvent::Session(SessionEvent::Saved {
            path: "rankings.json".to_string(),
            songs: 12,
        });
        assert_eq!(saved.severity(), EventSeverity::Info);

        assert_eq!(rated("A", "B").severity(), EventSeverity::Debug);

        let no_video = CoreEvent::Preview(PreviewEvent::VideoNotFound {
            title: "Mama".to_string(),
        });
        assert_eq!(no_video.description(), "Video not found");
        assert_eq!(no_video.severity(), EventSeverity::Debug);
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let bus1 = bus.clone();
        let bus2 = bus.clone();

        let handle1 = tokio::spawn(async move {
            for i in 0..10 {
                bus1.emit(rated(&format!("a-{}", i), "b")).ok();
            }
        });
        let handle2 = tokio::spawn(async move {
            for i in 0..10 {
                bus2.emit(CoreEvent::Catalog(CatalogEvent::FetchProgress {
                    job_id: "job-1".to_string(),
                    message: format!("Processed {} releases...", i * 30),
                    percent: None,
                }))
                .ok();
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        let mut count = 0;
        while sub.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Preview(PreviewEvent::Resolved {
            title: "Mama".to_string(),
            url: "https://audio.example/mama.m4a".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Preview\""));
        assert!(json.contains("\"event\":\"Resolved\""));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }
}
