//! Error types for the provider role.

use thiserror::Error;

use scrapelink_common::EndpointError;

/// Result type alias using [`ProviderError`].
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur in a target publisher.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The declared endpoint is missing or incompatible.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// A job specification could not be serialized for publication.
    #[error("Failed to serialize job specification: {0}")]
    Serialization(#[from] serde_json::Error),
}
