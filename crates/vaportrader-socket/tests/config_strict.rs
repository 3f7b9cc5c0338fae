#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use vaportrader_socket::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
socket:
  endpoint: "wss://warframe.market/socket?platform=pc"
  feedz: ["MOST_RECENT"] # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.socket.endpoint, "wss://warframe.market/socket?platform=pc");
    assert_eq!(cfg.socket.feeds, vec!["MOST_RECENT".to_string()]);
    assert_eq!(cfg.pending.ack_timeout_ms, 5000);
    assert_eq!(cfg.pending.sweep_interval_ms, 1000);
    assert_eq!(cfg.reconnect.max_attempts, 0);
    assert!(cfg.socket.reply_footer.is_none());
}

#[test]
fn wrong_version_is_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn range_checks() {
    let cases = [
        "version: 1\nsocket:\n  endpoint: \"https://warframe.market\"\n",
        "version: 1\nsocket:\n  feeds: [\"A/B\"]\n",
        "version: 1\nsocket:\n  connect_timeout_ms: 10\n",
        "version: 1\nsocket:\n  outbound_capacity: 0\n",
        "version: 1\npending:\n  ack_timeout_ms: 1000\n  sweep_interval_ms: 1000\n",
        "version: 1\nreconnect:\n  initial_backoff_ms: 5000\n  max_backoff_ms: 1000\n",
        "version: 1\nreconnect:\n  multiplier: 0.5\n",
    ];
    for yaml in cases {
        let err = config::load_from_str(yaml).expect_err(yaml);
        assert_eq!(err.code().as_str(), "BAD_REQUEST", "{yaml}");
    }
}

#[test]
fn repo_sample_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../vaportrader.yaml");
    let cfg = config::load_from_file(path).expect("sample config must load");
    assert_eq!(cfg.socket.outbound_capacity, 256);
}
