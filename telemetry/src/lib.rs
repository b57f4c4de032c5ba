//! Telemetry Service Library
//!
//! This crate provides the page-view telemetry service: a per-minute view
//! counter over a pluggable key-value store, and a REST API serving the
//! recorded counters to the dashboard. Writes are best-effort; reads surface
//! store failures to the caller.

pub mod api;
pub mod config;
pub mod store;

// Re-export commonly used types
pub use api::ApiServer;
pub use config::{ApiConfig, Config, StoreConfig, TelemetryConfig};
pub use store::{MemoryViewStore, PageViewRecord, StoreError, ViewStore};
