use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label carrying the publisher's group (model) name.
pub const LABEL_MODEL: &str = "juju_model";

/// Label carrying the publisher's group instance id (model UUID).
pub const LABEL_MODEL_UUID: &str = "juju_model_uuid";

/// Label carrying the publisher's subgroup (application) name.
pub const LABEL_APPLICATION: &str = "juju_application";

/// Label carrying a single member (unit) name.
///
/// Unlike the three labels above this one is never part of [`Topology::labels`];
/// it is attached per target during job expansion, and only to targets that
/// were derived from a wildcard entry.
pub const LABEL_UNIT: &str = "juju_unit";

/// Identity metadata describing a publisher's logical namespace.
///
/// A `Topology` is published once per membership-affecting event as part of
/// the application-scope channel record. The unit name is optional and is
/// deliberately excluded from both [`identifier`](Topology::identifier) and
/// [`labels`](Topology::labels): the scope identifier must stay stable across
/// member churn such as leader re-election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Group (model) name.
    pub model: String,

    /// Group instance id (model UUID).
    pub model_uuid: String,

    /// Subgroup (application) name.
    pub application: String,

    /// Member (unit) name of the publishing process, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Topology {
    /// Create topology metadata without a unit name.
    pub fn new(
        model: impl Into<String>,
        model_uuid: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            model_uuid: model_uuid.into(),
            application: application.into(),
            unit: None,
        }
    }

    /// Set the unit name of the publishing process.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// The scope identifier for this publisher.
    ///
    /// Combines model, model UUID and application into a stable string that
    /// prefixes every job name derived from this publisher. The unit name is
    /// excluded so the identifier survives unit recreation.
    ///
    /// # Example
    /// ```
    /// use scrapelink_common::Topology;
    ///
    /// let topology = Topology::new("model", "uuid123", "app");
    /// assert_eq!(topology.identifier(), "juju_model_uuid123_app");
    /// ```
    pub fn identifier(&self) -> String {
        format!("juju_{}_{}_{}", self.model, self.model_uuid, self.application)
    }

    /// The label set shared by every target derived from this publisher.
    ///
    /// Contains model, model UUID and application labels. The unit name is
    /// excluded; it is injected per target where a reliable mapping exists.
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (LABEL_MODEL.to_string(), self.model.clone()),
            (LABEL_MODEL_UUID.to_string(), self.model_uuid.clone()),
            (LABEL_APPLICATION.to_string(), self.application.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_format() {
        let topology = Topology::new("lma", "91f6d4e2", "loki");

        assert_eq!(topology.identifier(), "juju_lma_91f6d4e2_loki");
    }

    #[test]
    fn test_identifier_ignores_unit() {
        let bare = Topology::new("lma", "91f6d4e2", "loki");
        let with_unit = bare.clone().with_unit("loki/0");

        assert_eq!(bare.identifier(), with_unit.identifier());
    }

    #[test]
    fn test_labels_exclude_unit() {
        let topology = Topology::new("lma", "91f6d4e2", "loki").with_unit("loki/0");
        let labels = topology.labels();

        assert_eq!(labels.get(LABEL_MODEL), Some(&"lma".to_string()));
        assert_eq!(labels.get(LABEL_MODEL_UUID), Some(&"91f6d4e2".to_string()));
        assert_eq!(labels.get(LABEL_APPLICATION), Some(&"loki".to_string()));
        assert!(!labels.contains_key(LABEL_UNIT));
    }

    #[test]
    fn test_serde_roundtrip() {
        let topology = Topology::new("lma", "91f6d4e2", "loki").with_unit("loki/0");

        let json = serde_json::to_string(&topology).unwrap();
        let decoded: Topology = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, topology);
    }

    #[test]
    fn test_unit_omitted_when_absent() {
        let topology = Topology::new("lma", "91f6d4e2", "loki");
        let json = serde_json::to_string(&topology).unwrap();

        assert!(!json.contains("unit"));
    }
}
