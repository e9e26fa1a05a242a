//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::infrastructure::config::settings::Config;

/// Smallest TOML document that passes validation.
pub const MINIMAL_TOML: &str = r#"
[deployer]
repo_name = "challenges"
repo_url = "https://charts.example.com"
chart_name = "challenge"
"#;

/// Validated config built from [`MINIMAL_TOML`] with no environment.
pub fn minimal() -> Config {
    Config::parse_toml_with_env(MINIMAL_TOML, |_| None).expect("minimal config is valid")
}

/// Minimal config pointing the record store at `path`.
pub fn with_store_path(path: &str) -> Config {
    let mut config = minimal();
    config.store.path = path.to_string();
    config
}
