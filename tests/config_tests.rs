//! Configuration file loading.

use std::io::Write;
use std::time::Duration;

use proctor::application::PollPolicy;
use proctor::infrastructure::config::cluster::RunMode;
use proctor::infrastructure::config::settings::Config;

const FULL_TOML: &str = r#"
[logging]
level = "debug"
format = "json"

[broker]
url = "amqp://broker.internal:5672/%2f"
queues = ["challenge", "challenge.priority"]
exchange = "topic.challenge"
event_namespace = "challenge.fromService"
reconnect_delay_ms = 1000

[store]
path = "/var/lib/proctor/records.db"

[cluster]
mode = "out-of-cluster"
kubeconfig = "/etc/proctor/kubeconfig"
namespace = "ctf"

[deployer]
repo_name = "ctf"
repo_url = "https://charts.example.com"
chart_name = "challenge"
pull_secret = "registry-creds"

[polling]
initial_delay_ms = 500
interval_ms = 1500
max_attempts = 40

[events]
echo_endpoint = false
"#;

#[test]
fn loads_every_section_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FULL_TOML.as_bytes()).unwrap();

    let config = Config::parse_toml_with_env(
        &std::fs::read_to_string(file.path()).unwrap(),
        |_| None,
    )
    .unwrap();

    assert_eq!(config.logging.format, "json");
    assert_eq!(config.broker.queues.len(), 2);
    assert_eq!(config.broker.reconnect_delay_ms, 1000);
    assert_eq!(config.store.path, "/var/lib/proctor/records.db");
    assert_eq!(config.cluster.mode, RunMode::OutOfCluster);
    assert_eq!(config.cluster.namespace, "ctf");
    assert_eq!(config.deployer.chart_reference(), "ctf/challenge");
    assert_eq!(config.deployer.pull_secret.as_deref(), Some("registry-creds"));
    assert!(!config.events.echo_endpoint);

    let policy = PollPolicy::from(&config.polling);
    assert_eq!(policy.initial_delay, Duration::from_millis(500));
    assert_eq!(policy.interval, Duration::from_millis(1500));
    assert_eq!(policy.max_attempts, Some(40));
}

#[test]
fn environment_overrides_file_values() {
    let config = Config::parse_toml_with_env(FULL_TOML, |key| match key {
        "AMQP_URL" => Some("amqp://other:5672/%2f".into()),
        "DATABASE_URL" => Some("/tmp/override.db".into()),
        "HELM_CHART_NAME" => Some("pwn-box".into()),
        "RABBITMQ_PASSWORD" => Some("hunter2".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.broker.url, "amqp://other:5672/%2f");
    assert_eq!(config.store.path, "/tmp/override.db");
    assert_eq!(config.deployer.chart_reference(), "ctf/pwn-box");
    assert_eq!(config.broker.password.as_deref(), Some("hunter2"));
    assert!(!config.broker.display_url().contains("hunter2"));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn chart_coordinates_are_required() {
    let err = Config::parse_toml_with_env("[broker]\nqueues = [\"challenge\"]\n", |_| None)
        .unwrap_err();
    assert!(err.to_string().contains("deployer"));
}
