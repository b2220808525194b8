// Per-path mutual exclusion for history writers.
//
// One slot per storage path, held by at most one operation. Waiters park on
// the holder's release signal and also wake every `poll_interval` so a
// holder that never releases is noticed:
// - a holder older than `stale_after` is presumed abandoned and its slot is
//   reclaimed by the next waiter (the abandoned operation is not checked)
// - a waiter whose own wait exceeds `timeout` gives up with `LockError::Timeout`

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Longest a waiter will wait before failing.
    pub timeout: Duration,
    /// Hold time after which a holder is presumed abandoned.
    pub stale_after: Duration,
    /// Periodic wake while waiting.
    pub poll_interval: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOCK_TIMEOUT,
            stale_after: DEFAULT_LOCK_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("timed out after {}ms waiting for history lock on `{}`", waited.as_millis(), path.display())]
    Timeout { path: PathBuf, waited: Duration },
}

#[derive(Debug)]
struct Slot {
    token: u64,
    acquired_at: Instant,
    released: Arc<Notify>,
}

enum Attempt<'a> {
    Acquired(LockGuard<'a>),
    Held { token: u64, released: Arc<Notify> },
}

/// Process-local lock table keyed by storage path.
///
/// Construct one per process (or per test) and share it by `Arc`.
#[derive(Debug, Default)]
pub struct LockManager {
    options: LockOptions,
    slots: Mutex<HashMap<PathBuf, Slot>>,
    next_token: AtomicU64,
}

impl LockManager {
    pub fn new(options: LockOptions) -> Self {
        Self { options, slots: Mutex::new(HashMap::new()), next_token: AtomicU64::new(1) }
    }

    pub fn options(&self) -> LockOptions {
        self.options
    }

    /// Run `f` while holding the lock for `path`.
    pub async fn with_lock<F, Fut, T>(&self, path: &Path, f: F) -> Result<T, LockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.acquire(path).await?;
        Ok(f().await)
    }

    /// Wait for exclusive access to `path`. Dropping the guard releases it.
    pub async fn acquire(&self, path: &Path) -> Result<LockGuard<'_>, LockError> {
        let started = Instant::now();
        loop {
            let (token, released) = match self.try_acquire(path) {
                Attempt::Acquired(guard) => return Ok(guard),
                Attempt::Held { token, released } => (token, released),
            };

            // Register for the release signal before re-checking the slot so
            // a release in between is not missed.
            let notified = released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_held_by(path, token) {
                continue;
            }

            let waited = started.elapsed();
            if waited > self.options.timeout {
                debug!(path = %path.display(), waited_ms = waited.as_millis() as u64, "history lock wait timed out");
                return Err(LockError::Timeout { path: path.to_path_buf(), waited });
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }
        }
    }

    /// Whether any operation currently holds `path`.
    pub fn is_locked(&self, path: &Path) -> bool {
        self.slots().contains_key(path)
    }

    /// Number of paths currently held.
    pub fn held_count(&self) -> usize {
        self.slots().len()
    }

    fn try_acquire(&self, path: &Path) -> Attempt<'_> {
        let mut slots = self.slots();
        let now = Instant::now();

        if let Some(slot) = slots.get(path) {
            let held_for = now.saturating_duration_since(slot.acquired_at);
            if held_for <= self.options.stale_after {
                return Attempt::Held { token: slot.token, released: Arc::clone(&slot.released) };
            }

            warn!(
                path = %path.display(),
                held_ms = held_for.as_millis() as u64,
                "reclaiming stale history lock"
            );
            if let Some(stale) = slots.remove(path) {
                stale.released.notify_waiters();
            }
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        slots.insert(
            path.to_path_buf(),
            Slot { token, acquired_at: now, released: Arc::new(Notify::new()) },
        );
        Attempt::Acquired(LockGuard { manager: self, path: path.to_path_buf(), token })
    }

    fn is_held_by(&self, path: &Path, token: u64) -> bool {
        self.slots().get(path).is_some_and(|slot| slot.token == token)
    }

    fn release(&self, path: &Path, token: u64) {
        let mut slots = self.slots();
        match slots.entry(path.to_path_buf()) {
            Entry::Occupied(entry) if entry.get().token == token => {
                entry.remove().released.notify_waiters();
            }
            _ => {
                // Reclaimed while we held it; the slot now belongs to someone else.
                debug!(path = %path.display(), "history lock was reclaimed before release");
            }
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<PathBuf, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive hold on one storage path.
#[derive(Debug)]
pub struct LockGuard<'a> {
    manager: &'a LockManager,
    path: PathBuf,
    token: u64,
}

impl LockGuard<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.manager.release(&self.path, self.token);
    }
}
