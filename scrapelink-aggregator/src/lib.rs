//! Scrapelink Aggregator
//!
//! The target aggregation role of Scrapelink. A scraper process instantiates
//! a [`ScrapeAggregator`] against its declared endpoint and re-fetches the
//! merged job list whenever the channel signals a membership change:
//!
//! ```ignore
//! use scrapelink_aggregator::ScrapeAggregator;
//!
//! let aggregator = ScrapeAggregator::new(&declared_endpoints, "scrape-endpoint")?;
//! let mut changes = aggregator.changes(&channel);
//!
//! // ... on each notification:
//! let scrape_configs = aggregator.jobs(&channel);
//! ```
//!
//! Aggregation is a pure pipeline over the channel's current records:
//! sanitize each raw job specification ([`scrapelink_common::job`]), resolve
//! the publisher's membership ([`resolve`]), expand each template into a
//! labeled concrete job ([`expand`]) and concatenate across publishers.

pub mod aggregator;
pub mod config;
pub mod expand;
pub mod resolve;

pub use aggregator::ScrapeAggregator;
pub use config::{ConfigError, PublisherState, RenderConfig, UnitState};
pub use expand::{ExpandError, expand};
pub use resolve::{MembershipSnapshot, resolve_members};

// Re-export commonly used types from scrapelink-common
pub use scrapelink_common::{Channel, ScrapeJob, TargetsChanged, Topology};
