//! Configuration types.

use std::path::PathBuf;

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the on-disk database file.
    pub db_path: PathBuf,
}

impl StoreConfig {
    /// Build a config from the environment, falling back to defaults.
    ///
    /// `ROOMDESK_DB_PATH` overrides the database location.
    pub fn from_env() -> Self {
        let db_path = std::env::var("ROOMDESK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default().db_path);
        Self { db_path }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/roomdesk.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_db_path() {
        let config = StoreConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./data/roomdesk.db"));
    }
}
