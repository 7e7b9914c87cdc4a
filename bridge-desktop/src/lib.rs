//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`, with retry on transport errors, 5xx and
//!   429 responses
//!
//! The clock comes straight from `bridge-traits` (`SystemClock`) and log lines
//! go to stderr through `tracing-subscriber`; only the network needs a desktop
//! adapter.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http_client = Arc::new(ReqwestHttpClient::new()?);
//!     // Hand it to CoreConfigBuilder::http_client(..)
//!     Ok(())
//! }
//! ```

mod http;

pub use http::ReqwestHttpClient;
