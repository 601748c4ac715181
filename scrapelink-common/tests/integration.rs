//! Integration tests for the scrapelink-common library.

use serde_json::json;

use scrapelink_common::{
    AppData, Channel, Format, Topology, UnitRecord, decode, decode_auto, encode,
    sanitize_scrape_config,
};

#[test]
fn test_full_record_workflow() {
    // A publisher assembles its application-scope record
    let raw_job = json!({
        "job_name": "my-job",
        "static_configs": [{"targets": ["*:8080"], "labels": {"env": "prod"}}],
        "metrics_path": "/federate",
    });
    let template = sanitize_scrape_config(&raw_job);

    let data = AppData {
        scrape_metadata: Some(Topology::new("lma", "91f6d4e2", "loki").with_unit("loki/0")),
        scrape_jobs: vec![serde_json::to_value(&template).unwrap()],
    };

    // The record survives both wire encodings
    let json_bytes = encode(&data, Format::Json).expect("JSON encode failed");
    let decoded: AppData = decode(&json_bytes, Format::Json).expect("JSON decode failed");
    assert_eq!(decoded, data);

    let cbor_bytes = encode(&data, Format::Cbor).expect("CBOR encode failed");
    let decoded: AppData = decode_auto(&cbor_bytes).expect("Auto decode failed");
    assert_eq!(decoded, data);

    // The disallowed field never reaches the wire
    let wire = serde_json::to_value(&decoded.scrape_jobs[0]).unwrap();
    assert!(wire.get("metrics_path").is_none());
    assert_eq!(wire["static_configs"][0]["labels"]["env"], "prod");

    // Receiver-side sanitization of an already sanitized job is a no-op
    assert_eq!(sanitize_scrape_config(&decoded.scrape_jobs[0]), template);
}

#[test]
fn test_channel_replaces_whole_records() {
    let mut channel = Channel::new();
    channel.connect(1);

    channel.set_unit_record(
        1,
        "loki/0",
        UnitRecord {
            unit_name: Some("loki/0".to_string()),
            unit_address: Some("10.42.0.3".to_string()),
        },
    );
    channel.set_unit_record(
        1,
        "loki/0",
        UnitRecord {
            unit_name: Some("loki/0".to_string()),
            unit_address: Some("10.42.0.9".to_string()),
        },
    );

    let connection = channel.connection(1).unwrap();
    assert_eq!(connection.units.len(), 1);
    assert_eq!(
        connection.units["loki/0"].unit_address.as_deref(),
        Some("10.42.0.9")
    );
}

#[test]
fn test_scope_identifier_stable_across_member_churn() {
    let before = Topology::new("lma", "91f6d4e2", "loki").with_unit("loki/0");
    let after = Topology::new("lma", "91f6d4e2", "loki").with_unit("loki/2");

    assert_eq!(before.identifier(), after.identifier());
    assert_eq!(before.labels(), after.labels());
}
