//! # Timed Cache Module
//!
//! A single-value cache that is refreshed once its time-to-live has passed.
//! Used for the home view's random recipes so repeated visits do not hit
//! the recipe sources. A persisted cache also keeps the value in a JSON file
//! with its fetch time, so the lifetime holds across separate runs.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::storage::{load_json, save_json};

#[derive(Clone, Serialize, Deserialize)]
struct Slot<T> {
    fetched_at: DateTime<Utc>,
    value: T,
}

/// Cached value with an expiry
///
/// # Examples
///
/// ```rust
/// use recipe_finder::cache::TimedCache;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache = TimedCache::new(Duration::from_secs(60));
/// let first = cache.get_or_refresh(|| async { vec!["Pancakes".to_string()] }).await;
/// let second = cache.get_or_refresh(|| async { vec!["Waffles".to_string()] }).await;
/// assert_eq!(first, second);
/// # }
/// ```
pub struct TimedCache<T> {
    ttl: Duration,
    file: Option<PathBuf>,
    slot: Mutex<Option<Slot<T>>>,
}

impl<T> TimedCache<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// In-memory cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            file: None,
            slot: Mutex::new(None),
        }
    }

    /// Cache backed by a JSON file holding the value and its fetch time
    pub fn persisted(ttl: Duration, file: impl Into<PathBuf>) -> Self {
        Self {
            ttl,
            file: Some(file.into()),
            slot: Mutex::new(None),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    fn is_live(&self, slot: &Slot<T>) -> bool {
        let age = Utc::now().signed_duration_since(slot.fetched_at);
        match age.to_std() {
            Ok(age) => age < self.ttl,
            // Fetched "in the future": the clock moved, treat as stale
            Err(_) => false,
        }
    }

    fn load_file(&self) -> Option<Slot<T>> {
        let path = self.file.as_deref()?;
        load_json::<Option<Slot<T>>>(path)
    }

    /// The cached value, or a fresh one from `refresh` when missing or expired
    ///
    /// Concurrent callers wait for a single refresh.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.get_or_refresh_if(refresh, |_| true).await
    }

    /// Like [`get_or_refresh`](Self::get_or_refresh), but a refreshed value
    /// is only stored when `keep` accepts it
    pub async fn get_or_refresh_if<F, Fut, K>(&self, refresh: F, keep: K) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
        K: FnOnce(&T) -> bool,
    {
        let mut slot = self.slot.lock().await;
        if slot.is_none() {
            *slot = self.load_file();
        }
        if let Some(cached) = slot.as_ref() {
            if self.is_live(cached) {
                debug!("Serving cached value");
                return cached.value.clone();
            }
        }

        debug!("Cache empty or expired, refreshing");
        let value = refresh().await;
        if !keep(&value) {
            debug!("Refreshed value not cached");
            return value;
        }

        let fresh = Slot {
            fetched_at: Utc::now(),
            value: value.clone(),
        };
        if let Some(path) = &self.file {
            if let Err(e) = save_json(path, &fresh) {
                warn!("Could not persist cache to {}: {e:#}", path.display());
            }
        }
        *slot = Some(fresh);
        value
    }

    /// Drop the cached value so the next read refreshes
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
        if let Some(path) = &self.file {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Could not remove cache file {}: {e}", path.display());
                }
            }
        }
    }

    /// True when a value is cached and not yet expired
    pub async fn is_fresh(&self) -> bool {
        let mut slot = self.slot.lock().await;
        if slot.is_none() {
            *slot = self.load_file();
        }
        slot.as_ref().is_some_and(|cached| self.is_live(cached))
    }
}
