use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CacheError, Response};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Named cache generations of responses keyed by request URL.
///
/// Implementations must be safe to share between the request path and
/// background revalidation tasks. `put` replaces any existing entry for the
/// same URL, so racing writers simply leave the last write.
pub trait CacheStorage: Send + Sync + 'static {
    /// Names of every generation currently stored
    fn generations(&self) -> Result<Vec<String>, CacheError>;

    fn lookup(&self, generation: &str, url: &str) -> Result<Option<CachedData<Response>>, CacheError>;

    fn put(&self, generation: &str, response: Response) -> Result<(), CacheError>;

    /// Store several responses in one go
    fn put_all(&self, generation: &str, responses: Vec<Response>) -> Result<(), CacheError> {
        for response in responses {
            self.put(generation, response)?;
        }
        Ok(())
    }

    /// URLs stored in a generation
    fn keys(&self, generation: &str) -> Result<Vec<String>, CacheError>;

    /// Remove a whole generation. Returns whether it existed.
    fn delete_generation(&self, generation: &str) -> Result<bool, CacheError>;
}

type Generations = BTreeMap<String, BTreeMap<String, CachedData<Response>>>;

/// Process-local storage, mostly for tests and one-shot tools.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    generations: Mutex<Generations>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Generations> {
        // A panic mid-insert leaves the map itself intact
        self.generations.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStorage for MemoryStorage {
    fn generations(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.lock().keys().cloned().collect())
    }

    fn lookup(&self, generation: &str, url: &str) -> Result<Option<CachedData<Response>>, CacheError> {
        Ok(self.lock().get(generation).and_then(|g| g.get(url)).cloned())
    }

    fn put(&self, generation: &str, response: Response) -> Result<(), CacheError> {
        self.lock()
            .entry(generation.to_string())
            .or_default()
            .insert(response.url.clone(), CachedData::new(response));
        Ok(())
    }

    fn keys(&self, generation: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .lock()
            .get(generation)
            .map(|g| g.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn delete_generation(&self, generation: &str) -> Result<bool, CacheError> {
        Ok(self.lock().remove(generation).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_cached_data_age_display() {
        let mut cached = CachedData::new(());
        assert_eq!(cached.age_display(), "just now");

        cached.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");

        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");

        cached.cached_at = Utc::now() - Duration::hours(30);
        assert_eq!(cached.age_display(), "1d ago");

        // Clock skew
        cached.cached_at = Utc::now() + Duration::minutes(10);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_memory_storage_put_replaces_by_url() {
        let storage = MemoryStorage::new();
        storage.put("v1", Response::new("https://x/a", 200, "old")).unwrap();
        storage.put("v1", Response::new("https://x/a", 200, "new")).unwrap();
        storage.put("v2", Response::new("https://x/b", 200, "b")).unwrap();

        let hit = storage.lookup("v1", "https://x/a").unwrap().unwrap();
        assert_eq!(hit.data.text(), "new");
        assert_eq!(storage.keys("v1").unwrap(), vec!["https://x/a".to_string()]);
        assert!(storage.lookup("v2", "https://x/a").unwrap().is_none());

        assert_eq!(storage.generations().unwrap(), vec!["v1".to_string(), "v2".to_string()]);
        assert!(storage.delete_generation("v1").unwrap());
        assert!(!storage.delete_generation("v1").unwrap());
        assert_eq!(storage.generations().unwrap(), vec!["v2".to_string()]);
    }
}
