//! The merge driver: one job list across all connected publishers.

use std::collections::BTreeSet;

use tokio::sync::broadcast;

use scrapelink_common::channel::{Channel, Connection, ConnectionId, TargetsChanged};
use scrapelink_common::{
    EndpointDecl, EndpointError, EndpointRole, INTERFACE_NAME, ScrapeJob, sanitize_scrape_config,
    validate_endpoint,
};

use crate::expand::expand;
use crate::resolve::resolve_members;

/// Aggregates scrape jobs from every publisher connected on one endpoint.
///
/// The aggregator holds no derived state: [`jobs`](ScrapeAggregator::jobs) is
/// recomputed from the channel's current records on every call, so the result
/// always reflects the latest membership exactly, with no stale cache window.
#[derive(Debug)]
pub struct ScrapeAggregator {
    endpoint: String,
}

impl ScrapeAggregator {
    /// Construct an aggregator for the given endpoint.
    ///
    /// # Errors
    ///
    /// Fails when `endpoint` is not declared, or is declared with a
    /// different interface or role.
    pub fn new(declared: &[EndpointDecl], endpoint: &str) -> Result<Self, EndpointError> {
        validate_endpoint(declared, endpoint, INTERFACE_NAME, EndpointRole::Requires)?;

        Ok(Self {
            endpoint: endpoint.to_string(),
        })
    }

    /// Name of the endpoint this aggregator consumes.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Subscribe to membership-change notifications on the channel.
    ///
    /// The owner decides whether to re-fetch [`jobs`](ScrapeAggregator::jobs)
    /// immediately on each notification or batch them; a missed notification
    /// only delays the refresh, never corrupts it.
    pub fn changes(&self, channel: &Channel) -> broadcast::Receiver<TargetsChanged> {
        channel.subscribe()
    }

    /// The merged list of concrete scrape jobs.
    ///
    /// Connections are visited in stable id order and each contributes its
    /// templates in declaration order. A connection without units, metadata
    /// or templates contributes nothing; a template that fails expansion is
    /// skipped without affecting any other template or publisher.
    pub fn jobs(&self, channel: &Channel) -> Vec<ScrapeJob> {
        let mut jobs = Vec::new();
        let mut seen_names = BTreeSet::new();

        for (id, connection) in channel.connections() {
            self.collect_connection_jobs(id, connection, &mut seen_names, &mut jobs);
        }

        jobs
    }

    fn collect_connection_jobs(
        &self,
        id: ConnectionId,
        connection: &Connection,
        seen_names: &mut BTreeSet<String>,
        jobs: &mut Vec<ScrapeJob>,
    ) {
        if connection.units.is_empty() {
            return;
        }

        let Some(app) = &connection.app else {
            return;
        };
        let Some(topology) = &app.scrape_metadata else {
            tracing::debug!(connection = id, "No scrape metadata published yet");
            return;
        };
        if app.scrape_jobs.is_empty() {
            return;
        }

        let members = resolve_members(connection);
        let scope = topology.identifier();

        for (index, raw) in app.scrape_jobs.iter().enumerate() {
            let template = sanitize_scrape_config(raw);

            match expand(&template, &scope, &members, topology) {
                Ok(mut job) => {
                    if !seen_names.insert(job.job_name.clone()) {
                        job.job_name = disambiguate(seen_names, &job.job_name, index);
                        tracing::warn!(
                            connection = id,
                            job = %job.job_name,
                            "Duplicate job name, disambiguated by template position"
                        );
                    }
                    jobs.push(job);
                }
                Err(e) => {
                    tracing::warn!(
                        connection = id,
                        error = %e,
                        "Skipping scrape job that failed to expand"
                    );
                }
            }
        }
    }
}

/// Deterministically rename a colliding job using its template position.
fn disambiguate(seen_names: &mut BTreeSet<String>, name: &str, index: usize) -> String {
    let mut suffix = index;
    loop {
        let candidate = format!("{name}_{suffix}");
        if seen_names.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}
