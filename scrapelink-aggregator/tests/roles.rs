//! Both roles exercised together over one channel.

use serde_json::json;

use scrapelink_aggregator::ScrapeAggregator;
use scrapelink_common::channel::Channel;
use scrapelink_common::{DEFAULT_ENDPOINT_NAME, EndpointDecl, EndpointRole, INTERFACE_NAME, Topology};
use scrapelink_provider::{RefreshTrigger, ScrapeProvider};

#[test]
fn provider_publishes_and_aggregator_expands() {
    let provider_decls = [EndpointDecl::new(
        DEFAULT_ENDPOINT_NAME,
        INTERFACE_NAME,
        EndpointRole::Provides,
    )];
    let aggregator_decls = [EndpointDecl::new(
        DEFAULT_ENDPOINT_NAME,
        INTERFACE_NAME,
        EndpointRole::Requires,
    )];

    let mut provider = ScrapeProvider::new(
        &provider_decls,
        DEFAULT_ENDPOINT_NAME,
        Topology::new("lma", "91f6d4e2", "app").with_unit("app/0"),
        &[json!({"static_configs": [{"targets": ["*:8080"]}]})],
        vec![RefreshTrigger::ContainerReady],
    )
    .unwrap();
    let aggregator = ScrapeAggregator::new(&aggregator_decls, DEFAULT_ENDPOINT_NAME).unwrap();

    let mut channel = Channel::new();
    let mut changes = aggregator.changes(&channel);
    channel.connect(1);

    // nothing published yet: the aggregator contributes nothing, not an error
    assert!(aggregator.jobs(&channel).is_empty());

    provider.publish_job_spec(&mut channel, true).unwrap();
    provider.publish_unit_address(&mut channel, "app/0");

    assert!(changes.try_recv().is_ok());

    let jobs = aggregator.jobs(&channel);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job_name, "juju_lma_91f6d4e2_app");

    let address = provider.unit_address().unwrap().to_string();
    let entry = &jobs[0].static_configs[0];
    assert_eq!(entry.targets, vec![format!("{address}:8080")]);
    assert_eq!(entry.labels.get("juju_unit"), Some(&"app/0".to_string()));

    // a departing publisher disappears from the next fetch
    channel.disconnect(1);
    assert!(aggregator.jobs(&channel).is_empty());
}

#[test]
fn provider_without_jobs_advertises_default_job() {
    let decls = [EndpointDecl::new(
        DEFAULT_ENDPOINT_NAME,
        INTERFACE_NAME,
        EndpointRole::Provides,
    )];
    let aggregator_decls = [EndpointDecl::new(
        DEFAULT_ENDPOINT_NAME,
        INTERFACE_NAME,
        EndpointRole::Requires,
    )];

    let mut provider = ScrapeProvider::new(
        &decls,
        DEFAULT_ENDPOINT_NAME,
        Topology::new("lma", "91f6d4e2", "app").with_unit("app/0"),
        &[],
        vec![],
    )
    .unwrap();
    let aggregator = ScrapeAggregator::new(&aggregator_decls, DEFAULT_ENDPOINT_NAME).unwrap();

    let mut channel = Channel::new();
    channel.connect(1);
    provider.publish_job_spec(&mut channel, true).unwrap();
    provider.publish_unit_address(&mut channel, "app/0");

    let jobs = aggregator.jobs(&channel);
    let address = provider.unit_address().unwrap().to_string();

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].static_configs[0].targets, vec![format!("{address}:80")]);
}
