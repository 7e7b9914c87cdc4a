//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the SongClash core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the other crates depend on.
//! It establishes the logging conventions, the validated configuration that
//! carries the ranking constants, and the event broadcasting used to report
//! session changes and background job progress.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, MetadataApiConfig, RankingConfig};
pub use error::{Error, Result};
