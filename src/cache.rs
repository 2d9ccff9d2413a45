use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::error::Error;

/// Wall clock in milliseconds, injectable so staleness can be tested.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A cached value together with the moment it was computed
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub computed_at: i64,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: i64, ttl: Duration) -> bool {
        now - self.computed_at < ttl_ms(ttl)
    }
}

fn ttl_ms(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// Keyed get-or-refresh cache.
///
/// Entries live for the whole process; a read either returns a value younger
/// than its TTL or recomputes it first. Failed recomputations are never
/// stored, so a stale entry stays stale until a refresh succeeds.
pub struct TtlCache<K, T> {
    entries: RwLock<HashMap<K, CacheEntry<T>>>,
    in_flight: StdMutex<HashMap<K, Arc<Mutex<()>>>>,
    clock: Arc<dyn Clock>,
}

impl<K, T> TtlCache<K, T>
where
    K: Eq + Hash + Clone + Send + Sync,
    T: Clone + Send + Sync,
{
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            in_flight: StdMutex::new(HashMap::new()),
            clock,
        }
    }

    /// Returns the cached value when it is younger than `ttl`.
    pub async fn get(&self, key: &K, ttl: Duration) -> Option<T> {
        let now = self.clock.now_ms();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(now, ttl))
            .map(|entry| entry.data.clone())
    }

    /// Returns the stored entry regardless of its age
    pub async fn entry(&self, key: &K) -> Option<CacheEntry<T>> {
        let entries = self.entries.read().await;
        entries.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns the fresh cached value, or runs `compute` and stores its result.
    ///
    /// Callers racing on the same key wait for the in-flight computation
    /// instead of issuing their own.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        key: &K,
        ttl: Duration,
        compute: F,
    ) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        if let Some(data) = self.get(key, ttl).await {
            return Ok(data);
        }

        let lock = self.key_lock(key);
        let _guard = lock.lock().await;

        if let Some(data) = self.get(key, ttl).await {
            return Ok(data);
        }

        let data = compute().await?;
        let computed_at = self.clock.now_ms();

        let mut entries = self.entries.write().await;
        entries.insert(
            key.clone(),
            CacheEntry {
                data: data.clone(),
                computed_at,
            },
        );

        Ok(data)
    }

    fn key_lock(&self, key: &K) -> Arc<Mutex<()>> {
        let mut locks = match self.in_flight.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl<K, T> std::fmt::Debug for TtlCache<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache").finish_non_exhaustive()
    }
}
