//! Configuration for the render CLI: a channel state captured as a file.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use scrapelink_common::channel::{AppData, Channel, ConnectionId, UnitRecord};
use scrapelink_common::{LoggingConfig, Topology};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read state file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse state file: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// A channel state to render: every publisher with its records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Connected publishers.
    #[serde(default)]
    pub publishers: Vec<PublisherState>,
}

/// One publisher's records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublisherState {
    /// Connection id; defaults to the publisher's position in the list.
    #[serde(default)]
    pub connection: Option<ConnectionId>,

    /// Identity metadata, if published.
    #[serde(default)]
    pub metadata: Option<Topology>,

    /// Raw job specifications, if published.
    #[serde(default)]
    pub scrape_jobs: Vec<Value>,

    /// Connected units.
    #[serde(default)]
    pub units: Vec<UnitState>,
}

/// One unit's member-scope record.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitState {
    /// Platform unit id.
    pub id: String,

    /// Declared unit name, when it differs from the id.
    #[serde(default)]
    pub name: Option<String>,

    /// Declared unit address.
    #[serde(default)]
    pub address: Option<String>,
}

impl RenderConfig {
    /// Load a channel state from a JSON5 file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a channel state from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the state.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut ids = std::collections::BTreeSet::new();
        for (index, publisher) in self.publishers.iter().enumerate() {
            let id = publisher.resolved_connection(index);
            if !ids.insert(id) {
                return Err(ConfigError::Validation(format!(
                    "duplicate connection id {id}"
                )));
            }

            let mut unit_ids = std::collections::BTreeSet::new();
            for unit in &publisher.units {
                if unit.id.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "publisher {id} declares a unit with an empty id"
                    )));
                }
                if !unit_ids.insert(unit.id.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "publisher {id} declares unit '{}' twice",
                        unit.id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Build the in-memory channel this state describes.
    pub fn build_channel(&self) -> Channel {
        let mut channel = Channel::new();

        for (index, publisher) in self.publishers.iter().enumerate() {
            let id = publisher.resolved_connection(index);
            channel.connect(id);

            for unit in &publisher.units {
                channel.set_unit_record(
                    id,
                    unit.id.clone(),
                    UnitRecord {
                        unit_name: unit.name.clone(),
                        unit_address: unit.address.clone(),
                    },
                );
            }

            if publisher.metadata.is_some() || !publisher.scrape_jobs.is_empty() {
                channel.set_app_data(
                    id,
                    AppData {
                        scrape_metadata: publisher.metadata.clone(),
                        scrape_jobs: publisher.scrape_jobs.clone(),
                    },
                );
            }
        }

        channel
    }
}

impl PublisherState {
    fn resolved_connection(&self, index: usize) -> ConnectionId {
        self.connection.unwrap_or(index as ConnectionId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_state() {
        let config = RenderConfig::parse("{}").unwrap();

        assert!(config.publishers.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_full_state() {
        let json5 = r#"{
            logging: { level: "debug" },
            publishers: [{
                connection: 7,
                metadata: { model: "lma", model_uuid: "91f6d4e2", application: "loki" },
                scrape_jobs: [{ job_name: "push", static_configs: [{ targets: ["*:3100"] }] }],
                units: [
                    { id: "loki/0", address: "10.42.0.3" },
                    { id: "loki/1", name: "loki-1", address: "10.42.0.4" },
                ],
            }],
        }"#;

        let config = RenderConfig::parse(json5).unwrap();
        let publisher = &config.publishers[0];

        assert_eq!(publisher.connection, Some(7));
        assert_eq!(publisher.metadata.as_ref().unwrap().application, "loki");
        assert_eq!(publisher.scrape_jobs.len(), 1);
        assert_eq!(publisher.units.len(), 2);
        assert_eq!(publisher.units[1].name.as_deref(), Some("loki-1"));
    }

    #[test]
    fn test_duplicate_connection_rejected() {
        let json5 = r#"{
            publishers: [
                { connection: 3 },
                { connection: 3 },
            ],
        }"#;

        let result = RenderConfig::parse(json5);

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_positional_id_colliding_with_explicit_rejected() {
        let json5 = r#"{
            publishers: [
                {},
                { connection: 0 },
            ],
        }"#;

        assert!(RenderConfig::parse(json5).is_err());
    }

    #[test]
    fn test_duplicate_unit_rejected() {
        let json5 = r#"{
            publishers: [{
                units: [
                    { id: "app/0", address: "10.0.0.5" },
                    { id: "app/0", address: "10.0.0.6" },
                ],
            }],
        }"#;

        assert!(RenderConfig::parse(json5).is_err());
    }

    #[test]
    fn test_build_channel_places_records() {
        let json5 = r#"{
            publishers: [{
                metadata: { model: "m", model_uuid: "u", application: "a" },
                scrape_jobs: [{}],
                units: [{ id: "a/0", address: "10.0.0.5" }],
            }],
        }"#;

        let channel = RenderConfig::parse(json5).unwrap().build_channel();
        let connection = channel.connection(0).unwrap();

        assert_eq!(connection.units.len(), 1);
        let app = connection.app.as_ref().unwrap();
        assert_eq!(app.scrape_metadata.as_ref().unwrap().model, "m");
        assert_eq!(app.scrape_jobs.len(), 1);
    }
}
