// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! TTL response cache with in-flight request deduplication
//!
//! Concurrent fetches for one key share a single [`Shared`] future. A
//! pending entry removes itself when its future settles; a successful
//! result from [`RequestCache::get_or_fetch`] is cached before that
//! happens, so a concurrent caller always finds one or the other.
//!
//! Lock order is `pending` then `entries`. No method holds `entries` while
//! taking `pending`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::trace;

use crate::error::Result;
use crate::http::Params;

/// Future handed to every caller waiting on the same key
pub type SharedFetch<T> = Shared<BoxFuture<'static, Result<T>>>;

struct CachedResponse<T> {
    data: T,
    timestamp: Instant,
    ttl: Duration,
}

impl<T> CachedResponse<T> {
    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.timestamp) > self.ttl
    }
}

struct Inner<T: Clone> {
    entries: Mutex<HashMap<String, CachedResponse<T>>>,
    pending: Mutex<HashMap<String, (u64, SharedFetch<T>)>>,
}

/// Entry and in-flight counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub pending: usize,
}

/// Response cache keyed by URL and params
pub struct RequestCache<T: Clone> {
    inner: Arc<Inner<T>>,
    next_id: AtomicU64,
}

impl<T> RequestCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
            }),
            next_id: AtomicU64::new(0),
        }
    }

    /// `"{url}:{params as JSON}"`, with `""` standing in for absent params
    ///
    /// Object keys serialize sorted, so param order does not matter.
    pub fn generate_key(url: &str, params: Option<&Params>) -> String {
        let params = match params {
            Some(params) => Value::Object(params.clone()),
            None => Value::String(String::new()),
        };
        format!("{}:{}", url, params)
    }

    /// Cached value, evicting it if expired
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.inner.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expired(Instant::now()) => {
                trace!(key, "Cache entry expired");
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, data: T, ttl: Duration) {
        self.inner.entries.lock().insert(
            key.into(),
            CachedResponse {
                data,
                timestamp: Instant::now(),
                ttl,
            },
        );
    }

    pub fn has_pending_request(&self, key: &str) -> bool {
        self.inner.pending.lock().contains_key(key)
    }

    pub fn get_pending_request(&self, key: &str) -> Option<SharedFetch<T>> {
        self.inner.pending.lock().get(key).map(|(_, fut)| fut.clone())
    }

    /// Register `fut` as the in-flight request for `key`
    ///
    /// The entry is removed once the returned future settles, unless it has
    /// been replaced by a newer one.
    pub fn set_pending_request<F>(&self, key: impl Into<String>, fut: F) -> SharedFetch<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let key = key.into();
        let mut pending = self.inner.pending.lock();
        self.insert_pending(&mut pending, key, None, fut)
    }

    /// Cached value, else join the in-flight request, else start `fetch`
    ///
    /// The three lookups happen under one lock. A successful result is
    /// cached for `ttl`.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let shared = {
            let mut pending = self.inner.pending.lock();
            if let Some(data) = self.get(key) {
                trace!(key, "Cache hit");
                return Ok(data);
            }
            match pending.get(key) {
                Some((_, fut)) => {
                    trace!(key, "Joining in-flight request");
                    fut.clone()
                }
                None => self.insert_pending(&mut pending, key.to_string(), Some(ttl), fetch()),
            }
        };
        shared.await
    }

    fn insert_pending<F>(
        &self,
        pending: &mut HashMap<String, (u64, SharedFetch<T>)>,
        key: String,
        cache_ttl: Option<Duration>,
        fut: F,
    ) -> SharedFetch<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let inner: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        let settle_key = key.clone();

        let shared = async move {
            let result = fut.await;
            if let Some(inner) = inner.upgrade() {
                if let (Ok(data), Some(ttl)) = (&result, cache_ttl) {
                    inner.entries.lock().insert(
                        settle_key.clone(),
                        CachedResponse {
                            data: data.clone(),
                            timestamp: Instant::now(),
                            ttl,
                        },
                    );
                }
                let mut pending = inner.pending.lock();
                if pending.get(&settle_key).map_or(false, |(owner, _)| *owner == id) {
                    pending.remove(&settle_key);
                }
            }
            result
        }
        .boxed()
        .shared();

        pending.insert(key, (id, shared.clone()));
        shared
    }

    /// Drop one cached entry
    pub fn clear(&self, key: &str) {
        self.inner.entries.lock().remove(key);
    }

    /// Drop every cached entry and forget in-flight requests
    pub fn clear_all(&self) {
        self.inner.pending.lock().clear();
        self.inner.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let pending = self.inner.pending.lock().len();
        let entries = self.inner.entries.lock().len();
        CacheStats { entries, pending }
    }
}

impl<T> Default for RequestCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
