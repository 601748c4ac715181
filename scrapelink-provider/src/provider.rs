//! The target publisher role.
//!
//! A [`ScrapeProvider`] owns a set of sanitized job templates and the
//! identity metadata of its process group, and publishes both over the
//! membership channel: the job specification as one application-scope record
//! (leader only), and this unit's name and address as a member-scope record.
//! Records are always written whole, replacing earlier state.

use scrapelink_common::channel::{AppData, Channel, UnitRecord};
use scrapelink_common::{
    EndpointDecl, EndpointRole, INTERFACE_NAME, JobTemplate, Topology, sanitize_scrape_config,
    validate_endpoint,
};
use serde_json::Value;

use crate::error::Result;

/// Events that re-publish this unit's address.
///
/// Address re-publication is needed whenever the process may have moved to a
/// new host, which the owning process signals by forwarding one of these
/// events to [`ScrapeProvider::handles_refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// The workload container came up (possibly on a new address).
    ContainerReady,
    /// Periodic status check.
    UpdateStatus,
    /// This unit was elected leader.
    LeaderElected,
    /// The software was upgraded in place.
    Upgrade,
}

/// Publishes scrape targets for every unit of one application.
#[derive(Debug)]
pub struct ScrapeProvider {
    topology: Topology,
    jobs: Vec<JobTemplate>,
    refresh: Vec<RefreshTrigger>,
    /// Last successfully resolved address; retained when resolution fails.
    address: Option<String>,
}

impl ScrapeProvider {
    /// Construct a provider for the given endpoint.
    ///
    /// Validates the endpoint declaration up front and sanitizes every raw
    /// job specification to the supported subset of fields. When `refresh`
    /// is empty, address re-publication defaults to the periodic status
    /// check.
    ///
    /// # Errors
    ///
    /// Fails when `endpoint` is not declared, or is declared with a
    /// different interface or role.
    pub fn new(
        declared: &[EndpointDecl],
        endpoint: &str,
        topology: Topology,
        jobs: &[Value],
        refresh: Vec<RefreshTrigger>,
    ) -> Result<Self> {
        validate_endpoint(declared, endpoint, INTERFACE_NAME, EndpointRole::Provides)?;

        let jobs = jobs.iter().map(sanitize_scrape_config).collect();
        let refresh = if refresh.is_empty() {
            vec![RefreshTrigger::UpdateStatus]
        } else {
            refresh
        };

        Ok(Self {
            topology,
            jobs,
            refresh,
            address: None,
        })
    }

    /// The sanitized job specification this provider publishes.
    ///
    /// A provider constructed without jobs still advertises one job: the
    /// default wildcard template scraping every unit on port 80.
    pub fn scrape_jobs(&self) -> Vec<JobTemplate> {
        if self.jobs.is_empty() {
            vec![JobTemplate::default_wildcard()]
        } else {
            self.jobs.clone()
        }
    }

    /// Identity metadata this provider publishes.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Whether `trigger` should cause address re-publication.
    pub fn handles_refresh(&self, trigger: RefreshTrigger) -> bool {
        self.refresh.contains(&trigger)
    }

    /// Publish the application-scope record on every connection.
    ///
    /// Only the leader unit may write application-scope data; non-leader
    /// calls are a no-op so the owner can invoke this unconditionally from
    /// its event handlers.
    pub fn publish_job_spec(&self, channel: &mut Channel, is_leader: bool) -> Result<()> {
        if !is_leader {
            return Ok(());
        }

        let scrape_jobs = self
            .scrape_jobs()
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for id in channel.connection_ids() {
            channel.set_app_data(
                id,
                AppData {
                    scrape_metadata: Some(self.topology.clone()),
                    scrape_jobs: scrape_jobs.clone(),
                },
            );
        }

        tracing::debug!(jobs = self.scrape_jobs().len(), "Published scrape job specification");

        Ok(())
    }

    /// Publish this unit's name and address on every connection.
    ///
    /// The address is resolved from the local host name, best effort: when
    /// resolution fails the previously published address is retained and no
    /// retry is attempted until the next triggering event.
    pub fn publish_unit_address(&mut self, channel: &mut Channel, unit_id: &str) {
        self.apply_resolved_address(local_host_name());

        let record = UnitRecord {
            unit_name: self.topology.unit.clone().or_else(|| Some(unit_id.to_string())),
            unit_address: self.address.clone(),
        };

        for id in channel.connection_ids() {
            channel.set_unit_record(id, unit_id, record.clone());
        }
    }

    /// Override the published address, bypassing host name resolution.
    pub fn set_unit_address(&mut self, address: impl Into<String>) {
        self.address = Some(address.into());
    }

    /// The address currently advertised by this unit, if any.
    pub fn unit_address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    fn apply_resolved_address(&mut self, resolved: Option<String>) {
        match resolved {
            Some(address) => self.address = Some(address),
            None => {
                tracing::warn!(
                    retained = self.address.as_deref().unwrap_or(""),
                    "Host name resolution failed, keeping last published address"
                );
            }
        }
    }
}

/// Resolve the local host name, best effort.
fn local_host_name() -> Option<String> {
    match hostname::get() {
        Ok(name) => name.into_string().ok().filter(|name| !name.is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read local host name");
            None
        }
    }
}
