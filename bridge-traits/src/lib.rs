//! # Host Bridge Traits
//!
//! Platform abstraction traits that the SongClash core relies on but does not
//! implement itself.
//!
//! ## Overview
//!
//! The ranking core is synchronous and I/O free. Everything that touches the
//! network or the host's logging pipeline goes through one of these traits so
//! that the metadata providers can be exercised against mocks in tests and
//! wired to real adapters (see `bridge-desktop`) in production.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and timeouts
//! - [`Clock`](time::Clock) - Millisecond time source for the MusicBrainz rate limiter
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert their native errors into it and keep the
//! message actionable (URL, status, timeout).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so they can be shared across
//! spawned fetch and preview jobs.

pub mod error;
pub mod http;
pub mod time;

pub use error::{BridgeError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
