//! The membership channel: per-publisher records and change notification.
//!
//! The channel is an in-memory stand-in for the platform's relation data
//! store. Each connected publisher owns one [`Connection`] holding an
//! application-scope record (identity metadata plus raw job specifications)
//! and one member-scope record per unit (name plus address). Records are
//! replaced whole, never patched, so a reader always observes a consistent
//! snapshot.
//!
//! Every mutation emits a [`TargetsChanged`] notification through a broadcast
//! channel; the aggregator's owner subscribes and decides whether to re-fetch
//! jobs immediately or batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::topology::Topology;

/// Interface name both roles must declare for their endpoint.
pub const INTERFACE_NAME: &str = "scrape_target";

/// Conventional endpoint name; using it keeps deployments consistent.
pub const DEFAULT_ENDPOINT_NAME: &str = "scrape-endpoint";

/// Direction of a declared endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    /// The endpoint publishes scrape targets.
    Provides,
    /// The endpoint aggregates scrape targets.
    Requires,
}

impl std::fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointRole::Provides => write!(f, "provides"),
            EndpointRole::Requires => write!(f, "requires"),
        }
    }
}

/// One endpoint declaration from the owning process's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDecl {
    pub name: String,
    pub interface: String,
    pub role: EndpointRole,
}

impl EndpointDecl {
    pub fn new(name: impl Into<String>, interface: impl Into<String>, role: EndpointRole) -> Self {
        Self {
            name: name.into(),
            interface: interface.into(),
            role,
        }
    }
}

/// Endpoint declaration mismatches, surfaced at construction of either role.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("no endpoint named '{0}' is declared")]
    NotFound(String),

    #[error("endpoint '{name}' has interface '{actual}' rather than the expected '{expected}'")]
    InterfaceMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("endpoint '{name}' has role '{actual}' rather than the expected '{expected}'")]
    RoleMismatch {
        name: String,
        expected: EndpointRole,
        actual: EndpointRole,
    },
}

/// Verify that a declared endpoint exists with the expected interface and
/// role. Called by both roles before touching any channel state, so an
/// incompatible declaration fails fast with no partial initialization.
pub fn validate_endpoint(
    declared: &[EndpointDecl],
    name: &str,
    interface: &str,
    role: EndpointRole,
) -> Result<(), EndpointError> {
    let decl = declared
        .iter()
        .find(|decl| decl.name == name)
        .ok_or_else(|| EndpointError::NotFound(name.to_string()))?;

    if decl.interface != interface {
        return Err(EndpointError::InterfaceMismatch {
            name: name.to_string(),
            expected: interface.to_string(),
            actual: decl.interface.clone(),
        });
    }

    if decl.role != role {
        return Err(EndpointError::RoleMismatch {
            name: name.to_string(),
            expected: role,
            actual: decl.role,
        });
    }

    Ok(())
}

/// Identifier of one publisher connection on the channel.
pub type ConnectionId = u64;

/// Application-scope record: one per publisher, set atomically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppData {
    /// Identity metadata of the publisher. Absent until the publisher's
    /// leader has published; an aggregator treats absence as "no data yet".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_metadata: Option<Topology>,

    /// Raw job specifications, sanitized by the consumer before expansion.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scrape_jobs: Vec<Value>,
}

/// Member-scope record: one per unit of a publisher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Declared unit name; readers fall back to the platform unit id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,

    /// Declared unit address, resolved by the publisher at publish time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_address: Option<String>,
}

/// All records of one connected publisher.
#[derive(Debug, Clone, Default)]
pub struct Connection {
    /// Application-scope record, if published yet.
    pub app: Option<AppData>,

    /// Member-scope records keyed by platform unit id.
    pub units: BTreeMap<String, UnitRecord>,
}

/// Notification that a publisher's membership or job data changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetsChanged {
    pub connection: ConnectionId,
}

/// In-memory membership channel shared by providers and one aggregator.
#[derive(Debug)]
pub struct Channel {
    connections: BTreeMap<ConnectionId, Connection>,
    changes: broadcast::Sender<TargetsChanged>,
}

impl Channel {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            connections: BTreeMap::new(),
            changes,
        }
    }

    /// Subscribe to change notifications. Missed notifications are harmless:
    /// readers always recompute from current state.
    pub fn subscribe(&self) -> broadcast::Receiver<TargetsChanged> {
        self.changes.subscribe()
    }

    /// Register a publisher connection.
    pub fn connect(&mut self, id: ConnectionId) {
        self.connections.entry(id).or_default();
        self.notify(id);
    }

    /// Drop a publisher connection and all its records.
    pub fn disconnect(&mut self, id: ConnectionId) {
        if self.connections.remove(&id).is_some() {
            tracing::debug!(connection = id, "Publisher departed");
            self.notify(id);
        }
    }

    /// Replace the application-scope record of a connection.
    pub fn set_app_data(&mut self, id: ConnectionId, data: AppData) {
        self.connections.entry(id).or_default().app = Some(data);
        self.notify(id);
    }

    /// Replace the member-scope record of one unit.
    pub fn set_unit_record(&mut self, id: ConnectionId, unit_id: impl Into<String>, record: UnitRecord) {
        self.connections
            .entry(id)
            .or_default()
            .units
            .insert(unit_id.into(), record);
        self.notify(id);
    }

    /// Remove the member-scope record of one unit.
    pub fn remove_unit(&mut self, id: ConnectionId, unit_id: &str) {
        if let Some(connection) = self.connections.get_mut(&id)
            && connection.units.remove(unit_id).is_some()
        {
            self.notify(id);
        }
    }

    /// All connections, in stable id order.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections.iter().map(|(id, connection)| (*id, connection))
    }

    /// Look up one connection.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Ids of all connections, in stable order.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    fn notify(&self, connection: ConnectionId) {
        // send fails only when no receiver is subscribed
        let _ = self.changes.send(TargetsChanged { connection });
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}
