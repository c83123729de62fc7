use blocktail_connector::config::{SlotErrorPolicy, DEFAULT_RPC_URL};
use blocktail_listener::config::load_config;
use blocktail_logger::LogFormat;
use solana_sdk::commitment_config::CommitmentLevel;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn empty_file_yields_defaults() {
    let file = write_config("");
    let config = load_config(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.connector.solana.rpc_url, DEFAULT_RPC_URL);
    assert_eq!(config.connector.solana.commitment, CommitmentLevel::Finalized);
    assert_eq!(config.connector.tracker.idle_pause_ms, 500);
    assert_eq!(config.connector.tracker.fetch_concurrency, 1);
    assert_eq!(config.connector.tracker.max_range_slots, 1_000);
    assert_eq!(config.connector.tracker.on_slot_error, SlotErrorPolicy::Abort);
    assert_eq!(config.connector.retry.max_retries, 5);
    assert_eq!(config.listener.log.level, "info");
}

#[test]
fn file_values_are_applied() {
    let file = write_config(
        r#"
[connector.solana]
rpc-url = "http://127.0.0.1:8899"
commitment = "Confirmed"

[connector.tracker]
idle-pause-ms = 250
start-slot = 1000
end-slot = 2000
fetch-concurrency = 8
max-range-slots = 5000
on-slot-error = "skip"

[connector.retry]
max-retries = 2

[listener.log]
level = "debug"
format = "json"
"#,
    );
    let config = load_config(file.path().to_str().unwrap()).unwrap();

    let solana = &config.connector.solana;
    assert_eq!(solana.rpc_url, "http://127.0.0.1:8899");
    assert_eq!(solana.commitment, CommitmentLevel::Confirmed);

    let tracker = &config.connector.tracker;
    assert_eq!(tracker.idle_pause_ms, 250);
    assert_eq!(tracker.start_slot, Some(1000));
    assert_eq!(tracker.end_slot, Some(2000));
    assert_eq!(tracker.fetch_concurrency, 8);
    assert_eq!(tracker.max_range_slots, 5000);
    assert_eq!(tracker.on_slot_error, SlotErrorPolicy::Skip);

    assert_eq!(config.connector.retry.max_retries, 2);
    assert_eq!(config.connector.retry.initial_backoff_ms, 250);
    assert_eq!(config.listener.log.level, "debug");
    assert_eq!(config.listener.log.format, LogFormat::Json);
}

#[test]
fn processed_commitment_fails_to_load() {
    let file = write_config(
        r#"
[connector.solana]
commitment = "processed"
"#,
    );
    let err = load_config(file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{err:#}").contains("Invalid connector configuration"));
}

#[test]
fn unknown_commitment_fails_to_parse() {
    let file = write_config(
        r#"
[connector.solana]
commitment = "eventually"
"#,
    );
    assert!(load_config(file.path().to_str().unwrap()).is_err());
}

#[test]
fn missing_file_is_an_error() {
    assert!(load_config("/definitely/not/here/listener.toml").is_err());
}
