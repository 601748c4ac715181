//! Scrapelink Common Library
//!
//! This crate provides shared types and utilities for the Scrapelink
//! scrape-target aggregation roles:
//!
//! - [`topology`] - Publisher identity metadata and derived labels
//! - [`job`] - Scrape job wire types and the job sanitizer
//! - [`channel`] - Membership channel records, store and change notification
//! - [`serialization`] - JSON/CBOR encoding and decoding
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`error`] - Error types

pub mod channel;
pub mod config;
pub mod error;
pub mod job;
pub mod serialization;
pub mod topology;

// Re-export commonly used types at the crate root
pub use channel::{
    AppData, Channel, Connection, ConnectionId, DEFAULT_ENDPOINT_NAME, EndpointDecl,
    EndpointError, EndpointRole, INTERFACE_NAME, TargetsChanged, UnitRecord, validate_endpoint,
};
pub use config::{LogFormat, LoggingConfig, load_config, parse_config};
pub use error::{Error, Result};
pub use job::{
    ALLOWED_KEYS, JobTemplate, RelabelConfig, ScrapeJob, StaticConfig, sanitize_scrape_config,
};
pub use serialization::{Format, decode, decode_auto, encode};
pub use topology::{LABEL_APPLICATION, LABEL_MODEL, LABEL_MODEL_UUID, LABEL_UNIT, Topology};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
