//! Job expansion: from one template plus membership to one concrete job.
//!
//! This is the algorithmic core of the aggregator. Expansion is a pure
//! function over already-resolved snapshots; it performs no I/O and never
//! mutates its inputs, so re-running it with unchanged inputs yields
//! identical output.

use std::collections::BTreeMap;

use thiserror::Error;

use scrapelink_common::job::{JobTemplate, RelabelConfig, ScrapeJob, StaticConfig};
use scrapelink_common::topology::{
    LABEL_APPLICATION, LABEL_MODEL, LABEL_MODEL_UUID, LABEL_UNIT, Topology,
};

use crate::resolve::MembershipSnapshot;

/// Label the instance-uniqueness rule writes to.
const INSTANCE_LABEL: &str = "instance";

/// Errors produced while expanding a single template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// A target string did not have the `<host>:<port>` shape. The whole
    /// template is rejected rather than silently dropping the target.
    #[error("malformed scrape target '{0}', expected '<host>:<port>'")]
    MalformedTarget(String),
}

/// Expand one job template into a concrete scrape job.
///
/// For every target group, targets are partitioned into wildcard entries
/// (`*:<port>`, contributing only the port) and fully qualified entries
/// (emitted unchanged). Each group yields at most one fully qualified static
/// entry, followed by one entry per member of the snapshot built from the
/// group's wildcard ports; a group without wildcard ports falls back to the
/// bare member address. Member-derived entries carry the member name label,
/// fully qualified entries never do.
///
/// The returned job carries the template's relabeling rules with the
/// instance-uniqueness rule appended last; its source labels include the
/// member name label only when at least one member-derived entry exists.
pub fn expand(
    template: &JobTemplate,
    scope: &str,
    members: &MembershipSnapshot,
    topology: &Topology,
) -> Result<ScrapeJob, ExpandError> {
    let job_name = match template.job_name.as_deref() {
        Some(name) => format!("{scope}_{name}"),
        None => scope.to_string(),
    };

    let mut static_configs = Vec::new();
    let mut has_member_entries = false;

    for group in &template.static_configs {
        let mut wildcard_ports = Vec::new();
        let mut qualified_targets = Vec::new();

        for target in &group.targets {
            let (host, port) = split_target(target)?;
            if host == "*" {
                wildcard_ports.push(port.to_string());
            } else {
                qualified_targets.push(target.clone());
            }
        }

        if !qualified_targets.is_empty() {
            static_configs.push(StaticConfig {
                targets: qualified_targets,
                labels: merged_labels(&group.labels, topology, None),
            });
        }

        for (name, address) in members {
            let targets = if wildcard_ports.is_empty() {
                // no explicit port: scrape the member on its bare address
                vec![address.clone()]
            } else {
                wildcard_ports
                    .iter()
                    .map(|port| format!("{address}:{port}"))
                    .collect()
            };

            static_configs.push(StaticConfig {
                targets,
                labels: merged_labels(&group.labels, topology, Some(name.as_str())),
            });
            has_member_entries = true;
        }
    }

    let mut relabel_configs = template.relabel_configs.clone();
    relabel_configs.push(instance_relabel_config(has_member_entries));

    Ok(ScrapeJob {
        job_name,
        static_configs,
        relabel_configs,
        scrape_interval: template.scrape_interval.clone(),
        scrape_timeout: template.scrape_timeout.clone(),
    })
}

/// Split a target into host and port, requiring exactly one separator.
fn split_target(target: &str) -> Result<(&str, &str), ExpandError> {
    let mut parts = target.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(host), Some(port), None) => Ok((host.trim(), port.trim())),
        _ => Err(ExpandError::MalformedTarget(target.to_string())),
    }
}

/// Group labels merged with the publisher's identity labels, and optionally
/// the member name. Builds a fresh map so no expansion shares label state
/// with another.
fn merged_labels(
    group_labels: &BTreeMap<String, String>,
    topology: &Topology,
    member: Option<&str>,
) -> BTreeMap<String, String> {
    let mut labels = group_labels.clone();
    labels.extend(topology.labels());
    if let Some(name) = member {
        labels.insert(LABEL_UNIT.to_string(), name.to_string());
    }
    labels
}

/// The rule making the `instance` label globally unique and stable across
/// member recreation. Always appended after the template's own rules.
fn instance_relabel_config(include_unit: bool) -> RelabelConfig {
    let mut source_labels = vec![
        LABEL_MODEL.to_string(),
        LABEL_MODEL_UUID.to_string(),
        LABEL_APPLICATION.to_string(),
    ];
    if include_unit {
        source_labels.push(LABEL_UNIT.to_string());
    }

    RelabelConfig {
        source_labels,
        separator: "_".to_string(),
        target_label: INSTANCE_LABEL.to_string(),
        regex: "(.*)".to_string(),
    }
}
