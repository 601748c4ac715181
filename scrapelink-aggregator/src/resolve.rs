//! Member and address resolution.

use std::collections::BTreeMap;

use scrapelink_common::channel::Connection;

/// The current, atomic set of a publisher's members: unit name to address.
pub type MembershipSnapshot = BTreeMap<String, String>;

/// Resolve the member-scope records of one connection into a membership
/// snapshot.
///
/// The declared unit name is used when present, falling back to the platform
/// unit id. Units without an address (or with an empty one) are dropped; a
/// duplicate name is resolved last-write-wins in unit id order. Names are
/// expected unique by construction upstream.
pub fn resolve_members(connection: &Connection) -> MembershipSnapshot {
    let mut members = MembershipSnapshot::new();

    for (unit_id, record) in &connection.units {
        let name = record
            .unit_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(unit_id);
        if name.is_empty() {
            continue;
        }

        let Some(address) = record.unit_address.as_deref().filter(|addr| !addr.is_empty()) else {
            tracing::debug!(unit = %unit_id, "Skipping unit that has not published an address");
            continue;
        };

        members.insert(name.to_string(), address.to_string());
    }

    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrapelink_common::channel::UnitRecord;

    fn record(name: Option<&str>, address: Option<&str>) -> UnitRecord {
        UnitRecord {
            unit_name: name.map(str::to_string),
            unit_address: address.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_declared_names() {
        let mut connection = Connection::default();
        connection
            .units
            .insert("app/0".to_string(), record(Some("app/0"), Some("10.0.0.5")));
        connection
            .units
            .insert("app/1".to_string(), record(Some("app/1"), Some("10.0.0.6")));

        let members = resolve_members(&connection);

        assert_eq!(members.len(), 2);
        assert_eq!(members["app/0"], "10.0.0.5");
        assert_eq!(members["app/1"], "10.0.0.6");
    }

    #[test]
    fn test_name_falls_back_to_unit_id() {
        let mut connection = Connection::default();
        connection
            .units
            .insert("app/2".to_string(), record(None, Some("10.0.0.7")));

        let members = resolve_members(&connection);

        assert_eq!(members["app/2"], "10.0.0.7");
    }

    #[test]
    fn test_units_without_address_are_dropped() {
        let mut connection = Connection::default();
        connection
            .units
            .insert("app/0".to_string(), record(Some("app/0"), None));
        connection
            .units
            .insert("app/1".to_string(), record(Some("app/1"), Some("")));

        assert!(resolve_members(&connection).is_empty());
    }

    #[test]
    fn test_empty_declared_name_falls_back() {
        let mut connection = Connection::default();
        connection
            .units
            .insert("app/0".to_string(), record(Some(""), Some("10.0.0.5")));

        let members = resolve_members(&connection);

        assert_eq!(members["app/0"], "10.0.0.5");
    }

    #[test]
    fn test_duplicate_names_last_write_wins() {
        let mut connection = Connection::default();
        connection
            .units
            .insert("app/0".to_string(), record(Some("shared"), Some("10.0.0.5")));
        connection
            .units
            .insert("app/1".to_string(), record(Some("shared"), Some("10.0.0.6")));

        let members = resolve_members(&connection);

        assert_eq!(members.len(), 1);
        assert_eq!(members["shared"], "10.0.0.6");
    }
}
