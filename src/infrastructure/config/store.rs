//! Record store settings.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. Overridden by `DATABASE_URL`.
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_path() -> String {
    "proctor.db".into()
}

const fn default_pool_size() -> u32 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            pool_size: default_pool_size(),
        }
    }
}
