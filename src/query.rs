//! Keyed fetch cache used for every asynchronous read in the shell:
//! profile, navigation config, page configs and dashboard tab data.
//!
//! Fetches run on short-lived worker threads and post their result back
//! over a channel that the UI thread drains once per frame. Entries carry
//! a generation counter so a response that arrives after its key was
//! invalidated or re-fetched is discarded on arrival (last-key-wins,
//! never last-response-wins). Failed fetches keep the last good value so
//! callers can degrade gracefully.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

/// Point-in-time view of one cache entry.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    /// Last successfully fetched value, kept across later failures.
    pub data: Option<Arc<T>>,
    /// Error of the most recent failed fetch, cleared by a success.
    pub error: Option<String>,
    /// A fetch for this key is currently in flight.
    pub loading: bool,
    /// Wall-clock time of the last successful fetch.
    pub refreshed_at: Option<SystemTime>,
}

impl<T> Default for QuerySnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
            refreshed_at: None,
        }
    }
}

struct Entry<T> {
    data: Option<Arc<T>>,
    error: Option<String>,
    fetched_at: Option<Instant>,
    refreshed_at: Option<SystemTime>,
    in_flight: bool,
    generation: u64,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            fetched_at: None,
            refreshed_at: None,
            in_flight: false,
            generation: 0,
        }
    }
}

impl<T> Entry<T> {
    fn snapshot(&self) -> QuerySnapshot<T> {
        QuerySnapshot {
            data: self.data.clone(),
            error: self.error.clone(),
            loading: self.in_flight,
            refreshed_at: self.refreshed_at,
        }
    }
}

struct Completion<T> {
    key: String,
    generation: u64,
    result: Result<T, String>,
}

pub struct QueryCache<T> {
    entries: Mutex<HashMap<String, Entry<T>>>,
    tx: Sender<Completion<T>>,
    rx: Mutex<Receiver<Completion<T>>>,
    stale_after: Duration,
    max_retries: u32,
    retry_backoff: Duration,
}

impl<T: Send + 'static> QueryCache<T> {
    pub fn new(stale_after: Duration, max_retries: u32) -> Self {
        let (tx, rx) = channel();
        Self {
            entries: Mutex::new(HashMap::new()),
            tx,
            rx: Mutex::new(rx),
            stale_after,
            max_retries,
            retry_backoff: Duration::from_millis(250),
        }
    }

    /// Return the current snapshot for `key`, issuing a background fetch
    /// when the entry is missing or its freshness window has elapsed.
    /// Within the window repeated calls reuse the cached value. A stale
    /// entry keeps rendering its old data while the refetch runs.
    pub fn fetch_with<F>(&self, key: &str, fetch: F) -> QuerySnapshot<T>
    where
        F: Fn() -> anyhow::Result<T> + Send + 'static,
    {
        self.pump();
        let mut entries = self.entries.lock().expect("query cache poisoned");
        let entry = entries.entry(key.to_string()).or_default();

        let fresh = entry
            .fetched_at
            .map(|at| at.elapsed() < self.stale_after)
            .unwrap_or(false);

        if !entry.in_flight && !fresh {
            entry.generation += 1;
            entry.in_flight = true;
            let generation = entry.generation;
            let tx = self.tx.clone();
            let key = key.to_string();
            let max_retries = self.max_retries;
            let backoff = self.retry_backoff;
            std::thread::spawn(move || {
                let result = run_with_retries(&key, fetch, max_retries, backoff);
                // The UI thread may be gone on shutdown; nothing to do then.
                let _ = tx.send(Completion {
                    key,
                    generation,
                    result,
                });
            });
        }

        entry.snapshot()
    }

    /// Read the snapshot without triggering a fetch.
    pub fn snapshot(&self, key: &str) -> QuerySnapshot<T> {
        self.pump();
        self.entries
            .lock()
            .expect("query cache poisoned")
            .get(key)
            .map(Entry::snapshot)
            .unwrap_or_default()
    }

    /// Mark an entry stale so the next lookup refetches. The cached value
    /// stays available in the meantime.
    pub fn invalidate(&self, key: &str) {
        let mut entries = self.entries.lock().expect("query cache poisoned");
        if let Some(entry) = entries.get_mut(key) {
            entry.fetched_at = None;
            // Outstanding responses for the old generation are dropped.
            entry.generation += 1;
            entry.in_flight = false;
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("query cache poisoned")
            .clear();
    }

    /// True when any entry currently has a fetch in flight. The shell
    /// uses this to keep requesting repaints while work is pending.
    pub fn any_loading(&self) -> bool {
        self.entries
            .lock()
            .expect("query cache poisoned")
            .values()
            .any(|e| e.in_flight)
    }

    /// Apply completed fetches. Called implicitly by the lookup methods;
    /// tests call it directly while polling.
    pub fn pump(&self) {
        let rx = self.rx.lock().expect("query cache poisoned");
        while let Ok(completion) = rx.try_recv() {
            let mut entries = self.entries.lock().expect("query cache poisoned");
            let Some(entry) = entries.get_mut(&completion.key) else {
                continue;
            };
            if completion.generation != entry.generation {
                tracing::debug!(key = %completion.key, "discarding stale fetch result");
                continue;
            }
            entry.in_flight = false;
            entry.fetched_at = Some(Instant::now());
            match completion.result {
                Ok(value) => {
                    entry.data = Some(Arc::new(value));
                    entry.error = None;
                    entry.refreshed_at = Some(SystemTime::now());
                }
                Err(err) => {
                    tracing::warn!(key = %completion.key, error = %err, "fetch failed");
                    entry.error = Some(err);
                }
            }
        }
    }

    /// Poll until the entry for `key` settles or `timeout` elapses.
    /// Intended for tests and synchronous startup paths.
    pub fn wait_for(&self, key: &str, timeout: Duration) -> QuerySnapshot<T> {
        let deadline = Instant::now() + timeout;
        loop {
            let snapshot = self.snapshot(key);
            if !snapshot.loading || Instant::now() >= deadline {
                return snapshot;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

fn run_with_retries<T, F>(
    key: &str,
    fetch: F,
    max_retries: u32,
    backoff: Duration,
) -> Result<T, String>
where
    F: Fn() -> anyhow::Result<T>,
{
    let mut attempt = 0;
    loop {
        match fetch() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries => {
                attempt += 1;
                tracing::debug!(key, attempt, error = %err, "fetch attempt failed, retrying");
                std::thread::sleep(backoff * attempt);
            }
            Err(err) => return Err(format!("{err:#}")),
        }
    }
}
