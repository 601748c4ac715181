//! Scrape job wire types and the job sanitizer.
//!
//! The output shape of [`ScrapeJob`] is a compatibility contract with the
//! downstream scrape-config consumer and must serialize exactly as
//! `{job_name, static_configs: [{targets, labels}], relabel_configs: [...]}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys of a raw job specification that survive sanitization.
pub const ALLOWED_KEYS: [&str; 4] = [
    "job_name",
    "static_configs",
    "scrape_interval",
    "scrape_timeout",
];

/// Port assumed when a template declares no target groups at all.
pub const DEFAULT_PORT: u16 = 80;

/// One `static_configs` entry: a target list plus labels attached to every
/// target in the list.
///
/// The same shape is used both for user-declared target groups inside a
/// [`JobTemplate`] and for the concrete entries of a [`ScrapeJob`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfig {
    /// Target strings. In a template each is either `*:<port>` (every member
    /// of the publisher, on that port) or a fully qualified `<host>:<port>`.
    #[serde(default)]
    pub targets: Vec<String>,

    /// Labels attached to all targets of this entry.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl StaticConfig {
    /// Create an entry from a list of target strings, with no labels.
    pub fn from_targets<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            labels: BTreeMap::new(),
        }
    }
}

/// One relabeling rule in the order-sensitive `relabel_configs` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelabelConfig {
    /// Labels whose values are joined (by `separator`) to form the input.
    pub source_labels: Vec<String>,

    /// Separator placed between concatenated source label values.
    pub separator: String,

    /// Label the rule writes its result to.
    pub target_label: String,

    /// Regex applied to the concatenated input.
    pub regex: String,
}

/// A sanitized, user-declared scrape intent before expansion.
///
/// Produced by [`sanitize_scrape_config`]; after sanitization
/// `static_configs` is never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTemplate {
    /// Optional job name; prefixed with the publisher's scope identifier
    /// during expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,

    /// Ordered target groups.
    #[serde(default)]
    pub static_configs: Vec<StaticConfig>,

    /// Extra relabeling rules the expansion appends its uniqueness rule to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relabel_configs: Vec<RelabelConfig>,

    /// Optional scrape interval, passed through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_interval: Option<String>,

    /// Optional scrape timeout, passed through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_timeout: Option<String>,
}

impl JobTemplate {
    /// The template substituted for one that declares no target groups:
    /// every member, port 80, no labels.
    pub fn default_wildcard() -> Self {
        Self {
            static_configs: vec![StaticConfig::from_targets([format!("*:{DEFAULT_PORT}")])],
            ..Self::default()
        }
    }
}

/// A fully expanded, labeled scrape configuration ready for consumption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    /// Resolved job name, unique within one aggregation result.
    pub job_name: String,

    /// Concrete static entries; targets are real `<host>:<port>` addresses.
    pub static_configs: Vec<StaticConfig>,

    /// Relabeling rules; the instance-uniqueness rule is always last.
    pub relabel_configs: Vec<RelabelConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_timeout: Option<String>,
}

/// Restrict a raw job specification to the supported subset of fields.
///
/// Fields outside [`ALLOWED_KEYS`] are dropped, as is any allowed field whose
/// value does not have the expected shape; malformed user input degrades to
/// the defaults instead of failing. A result without target groups is
/// replaced by [`JobTemplate::default_wildcard`], so the returned template
/// always has at least one group.
pub fn sanitize_scrape_config(raw: &Value) -> JobTemplate {
    let mut template = JobTemplate::default();

    if let Some(map) = raw.as_object() {
        template.job_name = map
            .get("job_name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        if let Some(groups) = map.get("static_configs").and_then(Value::as_array) {
            // malformed entries are dropped one by one, not wholesale
            template.static_configs = groups
                .iter()
                .filter_map(|group| serde_json::from_value(group.clone()).ok())
                .collect();
        }

        template.scrape_interval = map
            .get("scrape_interval")
            .and_then(Value::as_str)
            .map(str::to_string);
        template.scrape_timeout = map
            .get("scrape_timeout")
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    if template.static_configs.is_empty() {
        template.static_configs = JobTemplate::default_wildcard().static_configs;
    }

    template
}
