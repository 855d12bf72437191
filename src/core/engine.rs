//! The sync engine: bootstrap, the refresh daemon, and the cache write path.

use crate::core::cache::{CacheEntry, CacheStore, WriteReason};
use crate::error::{ConfError, Result};
use crate::notify::ListenerRegistry;
use crate::sources::{MirrorStore, RemoteSource};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Owns the cache, the remote and mirror handles, and the refresh daemon.
///
/// The engine is the only bulk writer of the cache, the sole writer of the
/// mirror, and the sole dispatcher of change notifications. Foreground
/// lookups go through [`get`](Self::get); everything else happens on the
/// single background daemon task.
///
/// Stop and wake are deliberately separate signals: a `watch` shutdown
/// channel terminates the daemon (checked at every blocking boundary), while
/// a [`Notify`] lets a first-time lookup cut the current monitor wait short
/// so the new key joins the tracked set on the next cycle.
pub(crate) struct SyncEngine {
    cache: CacheStore,
    remote: Arc<dyn RemoteSource>,
    mirror: MirrorStore,
    listeners: ListenerRegistry,
    wake: Notify,
    shutdown_tx: watch::Sender<bool>,
    idle_interval: Duration,
    backoff_interval: Duration,
    daemon: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    pub(crate) fn new(
        remote: Arc<dyn RemoteSource>,
        mirror: MirrorStore,
        idle_interval: Duration,
        backoff_interval: Duration,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            cache: CacheStore::new(),
            remote,
            mirror,
            listeners: ListenerRegistry::new(),
            wake: Notify::new(),
            shutdown_tx,
            idle_interval,
            backoff_interval,
            daemon: Mutex::new(None),
        }
    }

    pub(crate) fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub(crate) fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Insert or replace one cache entry and run the reason's side effects.
    ///
    /// This is the only write path into the cache. The entry is visible to
    /// readers before any listener runs, so a listener reading back through
    /// the cache observes the value it was notified about.
    pub(crate) async fn apply(&self, key: &str, value: Option<String>, reason: WriteReason) {
        let prior = self
            .cache
            .insert(key.to_owned(), CacheEntry::new(value.clone()));
        debug!(key, ?reason, value = value.as_deref(), "cache write");

        match reason {
            WriteReason::Reload => {
                let transitioned = match &prior {
                    Some(prior) => prior.value() != value.as_deref(),
                    None => true,
                };
                if transitioned {
                    if let Some(value) = &value {
                        self.listeners.on_change(key, value).await;
                    }
                }
            }
            WriteReason::Initial => {
                // New key: shorten the daemon's current monitor wait so it
                // starts tracking this key promptly.
                self.wake.notify_one();
            }
            WriteReason::Preload => {}
        }
    }

    /// Foreground lookup with a caller-supplied default.
    ///
    /// Cache hits (including cached misses) never touch the network. A miss
    /// asks the admin source once and caches whatever came back, absent
    /// included, so repeated lookups of a nonexistent key stay local. The
    /// default itself is never cached.
    pub(crate) async fn get(&self, key: &str, default: &str) -> String {
        if let Some(entry) = self.cache.get(key) {
            return match entry.value() {
                Some(value) => value.to_owned(),
                None => default.to_owned(),
            };
        }

        let fetched = match self.remote.find(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "remote lookup failed, caching as missing");
                None
            }
        };

        self.apply(key, fetched.clone(), WriteReason::Initial).await;

        match fetched {
            Some(value) => value,
            None => default.to_owned(),
        }
    }

    /// Run the bootstrap sequence: mirror, remote overlay, preload.
    ///
    /// Every step tolerates empty or failed inputs; a fresh install with an
    /// unreachable admin source bootstraps to an empty cache.
    pub(crate) async fn bootstrap(&self) {
        let mirror_data = self.mirror.read();

        let mut merged = mirror_data.clone();
        if !mirror_data.is_empty() {
            let keys: Vec<String> = mirror_data.keys().cloned().collect();
            match self.remote.find_many(&keys).await {
                // Remote wins over the mirror for any key present in both.
                Ok(remote_data) => merged.extend(remote_data),
                Err(err) => {
                    warn!(error = %err, "admin source unreachable at bootstrap, serving mirror contents");
                }
            }
        }

        for (key, value) in merged {
            self.apply(&key, Some(value), WriteReason::Preload).await;
        }

        info!(keys = self.cache.len(), "bootstrap complete");
    }

    /// Spawn the refresh daemon. Called once, after bootstrap.
    pub(crate) fn spawn_daemon(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move { engine.run(shutdown_rx).await });
        *self.daemon.lock().expect("daemon handle lock poisoned") = Some(handle);
    }

    /// The daemon loop: idle → monitor → (backoff) → sync → persist.
    async fn run(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        info!("refresh daemon started");
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            // Nothing tracked yet: nap instead of polling the admin source.
            if self.cache.is_empty() {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = self.wake.notified() => {}
                    _ = sleep(self.idle_interval) => {}
                }
                continue;
            }

            let keys = self.cache.tracked_keys();
            let fetch_now = tokio::select! {
                _ = shutdown_rx.changed() => break,
                // An Initial insert arrived: abandon the poll and re-fetch so
                // the new key is tracked this cycle.
                _ = self.wake.notified() => true,
                result = self.remote.monitor(&keys) => match result {
                    Ok(hint) => hint,
                    Err(err) => {
                        debug!(error = %err, "monitor call failed");
                        false
                    }
                },
            };

            // A failed or empty poll still refreshes, but only after a delay
            // so an unreachable admin source is not hammered.
            if !fetch_now {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = self.wake.notified() => {}
                    _ = sleep(self.backoff_interval) => {}
                }
                if *shutdown_rx.borrow() {
                    break;
                }
            }

            self.refresh_cycle().await;
        }
        info!("refresh daemon stopped");
    }

    /// One sync pass: bulk fetch, diff into the cache, rewrite the mirror.
    async fn refresh_cycle(&self) {
        // Re-read the key set: Initial inserts made during the monitor wait
        // join the tracked set here.
        let keys = self.cache.tracked_keys();
        if keys.is_empty() {
            return;
        }

        match self.remote.find_many(&keys).await {
            Ok(fetched) => {
                for (key, value) in fetched {
                    let unchanged = self
                        .cache
                        .get(&key)
                        .is_some_and(|entry| entry.value() == Some(value.as_str()));
                    if unchanged {
                        debug!(key = %key, "reload: unchanged, skipping");
                    } else {
                        self.apply(&key, Some(value), WriteReason::Reload).await;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "bulk fetch failed, keeping cached values");
            }
        }

        // Mirror always receives the *current* cache contents for the full
        // tracked set, not just this cycle's changes.
        let snapshot = self.cache.snapshot(&self.cache.tracked_keys());
        if let Err(err) = self.mirror.write(&snapshot) {
            warn!(error = %err, "mirror write failed, will retry next cycle");
        }
    }

    /// Cancel the daemon and wait for it to stop, bounded by `wait`.
    ///
    /// Interrupts an in-flight monitor call rather than waiting out its
    /// long-poll window.
    pub(crate) async fn shutdown(&self, wait: Duration) -> Result<()> {
        let _ = self.shutdown_tx.send(true);

        let handle = self
            .daemon
            .lock()
            .expect("daemon handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            match tokio::time::timeout(wait, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "refresh daemon panicked"),
                Err(_) => return Err(ConfError::ShutdownTimeout(wait)),
            }
        }
        Ok(())
    }
}
