use std::io::Write;
use std::time::Duration;

use eth_rpc::{ProbeConfig, RetryPolicy, RpcError};

const PROBE_TOML: &str = r#"
http_url = "http://127.0.0.1:8545"
ws_url = "ws://127.0.0.1:8545"
request_timeout_secs = 5
chain_id = 31337
private_key_env = "ETH_PROBE_CONFIG_TEST_KEY"
watch_addresses = ["0xE5aFC41736bBE96cCB912Cb2d2e6BB503979b657"]

[receipt]
max_attempts = 30
interval_ms = 500
backoff_multiplier = 1.5
max_interval_ms = 4000
"#;

#[test]
fn loads_file_and_builds_policy() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PROBE_TOML.as_bytes()).unwrap();

    let config = ProbeConfig::load(file.path()).unwrap();
    assert_eq!(config.ws_url.as_deref(), Some("ws://127.0.0.1:8545"));
    assert_eq!(config.request_timeout(), Duration::from_secs(5));
    assert_eq!(config.chain_id, Some(31_337));
    assert_eq!(
        config.retry_policy(),
        RetryPolicy {
            max_attempts: 30,
            interval: Duration::from_millis(500),
            backoff_multiplier: 1.5,
            max_interval: Duration::from_secs(4),
        }
    );
}

#[test]
fn missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProbeConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, RpcError::Config(_)));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn store_bytecode_is_read_as_hex() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Store.bin");
    std::fs::write(&path, "0x6080604052\n").unwrap();

    let config = ProbeConfig {
        store_bytecode_path: Some(path),
        ..ProbeConfig::default()
    };
    assert_eq!(config.store_bytecode().unwrap(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
}

#[test]
fn bad_bytecode_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Store.bin");
    std::fs::write(&path, "not hex").unwrap();

    let config = ProbeConfig {
        store_bytecode_path: Some(path),
        ..ProbeConfig::default()
    };
    assert!(matches!(config.store_bytecode(), Err(RpcError::Eth(_))));
}
