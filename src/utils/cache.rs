use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use std::sync::Arc;

/// In-memory cache tier keyed by entity id. An entry older than the TTL is
/// a miss; writes always restamp. Last writer wins.
#[derive(Debug, Clone)]
pub struct Cache<T> {
    data: Arc<Mutex<HashMap<String, (T, Instant)>>>,
    ttl: Duration,
}

impl<T: Clone> Cache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let data = self.data.lock().await;
        if let Some((value, timestamp)) = data.get(key) {
            if timestamp.elapsed() < self.ttl {
                return Some(value.clone());
            }
        }
        None
    }

    pub async fn set(&self, key: String, value: T) {
        let mut data = self.data.lock().await;
        data.insert(key, (value, Instant::now()));
    }

    /// Snapshot of all still-fresh entries.
    pub async fn entries(&self) -> Vec<(String, T)> {
        let data = self.data.lock().await;
        data.iter()
            .filter(|(_, (_, timestamp))| timestamp.elapsed() < self.ttl)
            .map(|(key, (value, _))| (key.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_fresh_value() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.set("bitcoin".to_string(), 42_000.0).await;
        assert_eq!(cache.get("bitcoin").await, Some(42_000.0));
        assert_eq!(cache.get("ethereum").await, None);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = Cache::new(Duration::from_millis(10));
        cache.set("bitcoin".to_string(), 1.0).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(cache.get("bitcoin").await, None);
    }

    #[tokio::test]
    async fn entries_skips_expired() {
        let cache = Cache::new(Duration::from_millis(50));
        cache.set("old".to_string(), 1.0).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.set("new".to_string(), 2.0).await;
        let entries = cache.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "new");
    }
}
