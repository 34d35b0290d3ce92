//! Request coalescing for cache misses
//!
//! When several tasks miss the same key at once, only the first one starts
//! the load; the others await the same shared result, success or failure.
//!
//! The load runs on its own tokio task, so it finishes even if every caller
//! waiting on it is dropped. The task removes its registry entry when it ends
//! (including by panic), so a later miss always starts a fresh load.

use crate::CacheError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type SharedLoad<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;
type Registry<T, E> = Arc<Mutex<HashMap<String, InFlight<T, E>>>>;

struct InFlight<T, E>
where
    T: Clone,
    E: Clone,
{
    generation: u64,
    load: SharedLoad<T, E>,
}

/// In-flight load registry keyed by cache key.
pub struct SingleFlight<T, E>
where
    T: Clone,
    E: Clone,
{
    calls: Registry<T, E>,
    generation: AtomicU64,
}

/// Result of a coalesced call.
#[derive(Debug)]
pub struct Flight<T, E> {
    pub result: Result<T, E>,
    /// `true` when this caller joined a load started by another caller.
    pub shared: bool,
}

/// Drops the registry entry of one load, unless a newer load owns the key.
struct Release<T, E>
where
    T: Clone,
    E: Clone,
{
    calls: Registry<T, E>,
    key: String,
    generation: u64,
}

impl<T, E> Drop for Release<T, E>
where
    T: Clone,
    E: Clone,
{
    fn drop(&mut self) {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        if calls.get(&self.key).map(|call| call.generation) == Some(self.generation) {
            calls.remove(&self.key);
        }
    }
}

impl<T, E> Default for SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<CacheError> + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<CacheError> + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Run `load` for `key` unless a load for the same key is already running,
    /// in which case wait for that one instead.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn run<F, Fut>(&self, key: &str, load: F) -> Flight<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (shared_load, shared) = {
            let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
            match calls.get(key) {
                Some(call) => (call.load.clone(), true),
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let release = Release {
                        calls: self.calls.clone(),
                        key: key.to_string(),
                        generation,
                    };
                    let pending = load();
                    // The registry lock is held until the entry is inserted,
                    // so the release cannot run first.
                    let task = tokio::spawn(async move {
                        let _release = release;
                        pending.await
                    });
                    let shared_load = async move {
                        task.await
                            .unwrap_or_else(|e| Err(E::from(CacheError::LoadAborted(e.to_string()))))
                    }
                    .boxed()
                    .shared();
                    calls.insert(
                        key.to_string(),
                        InFlight {
                            generation,
                            load: shared_load.clone(),
                        },
                    );
                    (shared_load, false)
                }
            }
        };

        Flight {
            result: shared_load.await,
            shared,
        }
    }

    /// Number of keys with a load in progress.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
