// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Planner configuration and its storage port.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Search and execution knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Highest iterative-deepening level a search node may carry.
    pub deepening_limit: u32,
    /// Optional cap on decomposition depth; deeper branches fail.
    pub max_depth: Option<usize>,
    /// Default cost bound for branch-and-bound when the caller gives none.
    pub cost_limit: Option<u64>,
    /// Default replan budget for the lazy-lookahead executor.
    pub max_replans: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            deepening_limit: 0,
            max_depth: None,
            cost_limit: None,
            max_replans: 10,
        }
    }
}

impl PlannerConfig {
    /// Key under which the config is stored by [`ConfigService`].
    pub const KEY: &'static str = "planner";

    /// Sets [`PlannerConfig::deepening_limit`].
    pub fn with_deepening_limit(mut self, limit: u32) -> Self {
        self.deepening_limit = limit;
        self
    }

    /// Sets [`PlannerConfig::max_depth`].
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets [`PlannerConfig::cost_limit`].
    pub fn with_cost_limit(mut self, limit: u64) -> Self {
        self.cost_limit = Some(limit);
        self
    }

    /// Sets [`PlannerConfig::max_replans`].
    pub fn with_max_replans(mut self, replans: usize) -> Self {
        self.max_replans = replans;
        self
    }
}

/// Where planner settings live between runs.
///
/// Blobs are opaque bytes keyed by a logical name such as
/// [`PlannerConfig::KEY`].
pub trait ConfigStore {
    /// Bytes stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces whatever is stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Loading or saving settings failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("config not found")]
    NotFound,
    /// The backing store failed.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    /// Stored bytes are not valid JSON for the requested type.
    #[error("config json: {0}")]
    Serde(#[from] serde_json::Error),
}

/// JSON codec in front of a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Unwraps the store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Decodes the value under `key`; `Ok(None)` when absent or empty.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Encodes `value` as pretty JSON under `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Planner config stored under [`PlannerConfig::KEY`], or the default.
    pub fn planner_config(&self) -> Result<PlannerConfig, ConfigError> {
        Ok(self.load(PlannerConfig::KEY)?.unwrap_or_default())
    }
}

/// One `<key>.json` file per key under a caller-chosen directory.
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store rooted at `base`; the directory is created if missing.
    pub fn new(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        fs::write(self.path_for(key), data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        data: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl ConfigStore for MemoryStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.data
                .borrow()
                .get(key)
                .cloned()
                .ok_or(ConfigError::NotFound)
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.data.borrow_mut().insert(key.to_owned(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn missing_config_falls_back_to_default() {
        let service = ConfigService::new(MemoryStore::default());
        assert_eq!(service.planner_config().unwrap(), PlannerConfig::default());
    }

    #[test]
    fn saved_config_round_trips_through_the_store() {
        let service = ConfigService::new(MemoryStore::default());
        let config = PlannerConfig::default()
            .with_deepening_limit(3)
            .with_cost_limit(40)
            .with_max_replans(2);
        service.save(PlannerConfig::KEY, &config).unwrap();
        assert_eq!(service.planner_config().unwrap(), config);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: PlannerConfig = serde_json::from_str(r#"{"deepening_limit": 2}"#).unwrap();
        assert_eq!(config.deepening_limit, 2);
        assert_eq!(config.max_replans, 10);
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn fs_store_writes_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::new(dir.path().join("nested")).unwrap();
        assert!(matches!(store.load_raw("planner"), Err(ConfigError::NotFound)));

        let service = ConfigService::new(store);
        service
            .save(PlannerConfig::KEY, &PlannerConfig::default().with_max_depth(64))
            .unwrap();
        assert!(dir.path().join("nested/planner.json").exists());
        assert_eq!(service.planner_config().unwrap().max_depth, Some(64));
    }
}
