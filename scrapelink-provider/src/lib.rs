//! Scrapelink Provider
//!
//! The target publisher role of Scrapelink. A process that exposes scrape
//! endpoints instantiates a [`ScrapeProvider`] with its identity metadata and
//! an optional list of raw job specifications, then forwards
//! membership-affecting events to it:
//!
//! ```ignore
//! use scrapelink_provider::{RefreshTrigger, ScrapeProvider};
//!
//! let provider = ScrapeProvider::new(
//!     &declared_endpoints,
//!     "scrape-endpoint",
//!     topology,
//!     &[serde_json::json!({"static_configs": [{"targets": ["*:8080"]}]})],
//!     vec![RefreshTrigger::ContainerReady],
//! )?;
//!
//! // on join/changed events, leader publishes the job specification
//! provider.publish_job_spec(&mut channel, is_leader)?;
//!
//! // on refresh events, every unit re-publishes its own address
//! provider.publish_unit_address(&mut channel, unit_id);
//! ```
//!
//! Job specifications are sanitized at construction; the wildcard target
//! notation `*:<port>` means "scrape every unit of this application on that
//! port".

mod error;
mod provider;

pub use error::{ProviderError, Result};
pub use provider::{RefreshTrigger, ScrapeProvider};

// Re-export commonly used types from scrapelink-common
pub use scrapelink_common::{
    Channel, EndpointDecl, EndpointRole, INTERFACE_NAME, JobTemplate, Topology,
};
