use chrono::Utc;
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// One persisted value: acquisition time plus the raw JSON payload. An
/// expired or unreadable envelope is a cache miss, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    timestamp: i64,
    data: Value,
}

/// Persistent cache tier: a single JSON file of timestamped envelopes,
/// surviving process restarts. Freshness is decided per read, against the
/// caller's TTL class.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Envelope>>,
}

impl LocalStore {
    /// Open the store file, starting empty if it is missing or unreadable.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Discarding unreadable store file {:?}: {}", path, e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Read a value no older than `ttl`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let entries = self.entries.lock().unwrap();
        let envelope = entries.get(key)?;
        let age_ms = Utc::now().timestamp_millis() - envelope.timestamp;
        if age_ms < 0 || age_ms as u128 >= ttl.as_millis() {
            return None;
        }
        decode(key, &envelope.data)
    }

    /// Read a value regardless of age. Outage fallback: a stale price beats
    /// an empty screen.
    pub fn get_stale<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.lock().unwrap();
        let envelope = entries.get(key)?;
        decode(key, &envelope.data)
    }

    /// Store a value stamped with the current time and write through to disk.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to serialize {} for the store: {}", key, e);
                return;
            }
        };
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Envelope {
                timestamp: Utc::now().timestamp_millis(),
                data,
            },
        );
        self.flush(&entries);
    }

    pub fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap();
        if entries.remove(key).is_some() {
            self.flush(&entries);
        }
    }

    fn flush(&self, entries: &HashMap<String, Envelope>) {
        match serde_json::to_string(entries) {
            Ok(raw) => {
                if let Err(e) = fs::write(&self.path, raw) {
                    error!("Failed to write store file {:?}: {}", self.path, e);
                }
            }
            Err(e) => error!("Failed to serialize store file: {}", e),
        }
    }

    /// Backdate an envelope; TTL expiry tests use this to advance time.
    #[cfg(test)]
    pub fn set_with_timestamp<T: Serialize>(&self, key: &str, value: &T, timestamp_ms: i64) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Envelope {
                timestamp: timestamp_ms,
                data: serde_json::to_value(value).unwrap(),
            },
        );
        self.flush(&entries);
    }
}

fn decode<T: DeserializeOwned>(key: &str, data: &Value) -> Option<T> {
    match serde_json::from_value(data.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring undecodable store entry {}: {}", key, e);
            None
        }
    }
}
