use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info, warn};

use super::models::ConfigValue;
use crate::error::RelayError;

pub const CONFIG_CAPACITY: usize = 512;
pub const DELAY_KEY: &str = "DELAY";

#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    entries: BTreeMap<String, ConfigValue>,
}

impl ConfigStore {
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::empty(path);
        match fs::read(&store.path).await {
            Ok(raw) => match serde_json::from_slice::<Map<String, Value>>(&raw) {
                Ok(map) => {
                    store.entries = map
                        .into_iter()
                        .filter_map(|(key, value)| {
                            ConfigValue::from_stored(value).map(|value| (key, value))
                        })
                        .collect();
                    info!(
                        "Loaded {} config entries from {}",
                        store.entries.len(),
                        store.path.display()
                    );
                }
                Err(e) => warn!("Ignoring unreadable config {}: {e}", store.path.display()),
            },
            Err(e) => debug!("No config loaded from {}: {e}", store.path.display()),
        }
        store
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).map(ToString::to_string)
    }

    pub fn enumerate(&self) -> impl Iterator<Item = (&str, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn delay(&self) -> Option<Duration> {
        self.get(DELAY_KEY)
            .and_then(ConfigValue::as_u64)
            .map(Duration::from_millis)
    }

    /// Stores `raw` under `key`, or deletes the key when `raw` is empty.
    ///
    /// # Errors
    /// `ConfigFull` leaves the store untouched. `ConfigSave` is returned after
    /// the in-memory change has already been applied.
    pub async fn set(&mut self, key: &str, raw: &str) -> Result<(), RelayError> {
        if raw.is_empty() {
            if self.entries.remove(key).is_none() {
                return Ok(());
            }
            debug!("Deleted config key {key}");
            return self.persist().await;
        }

        let value = ConfigValue::parse(raw);
        let previous = self.entries.insert(key.to_string(), value);
        if self.serialized()?.len() > CONFIG_CAPACITY {
            match previous {
                Some(previous) => self.entries.insert(key.to_string(), previous),
                None => self.entries.remove(key),
            };
            return Err(RelayError::ConfigFull);
        }
        debug!("Stored config key {key}");
        self.persist().await
    }

    fn serialized(&self) -> Result<Vec<u8>, RelayError> {
        Ok(serde_json::to_vec(&self.entries)?)
    }

    async fn persist(&self) -> Result<(), RelayError> {
        let raw = self.serialized()?;
        fs::write(&self.path, raw)
            .await
            .map_err(RelayError::ConfigSave)
    }
}
