//! The public client handle.

use crate::core::engine::SyncEngine;
use crate::core::ConfClientBuilder;
use crate::error::Result;
use crate::notify::ListenerHandle;
use std::sync::Arc;
use std::time::Duration;

/// Handle to a running configuration client.
///
/// Each client is an independent instance: it owns its cache, its refresh
/// daemon, and its mirror file. There is no process-global state, so tests
/// (and processes talking to several admin sources) can run multiple clients
/// side by side.
///
/// Cloning is cheap and every clone refers to the same underlying engine.
///
/// # Examples
///
/// ```rust,no_run
/// use confsync::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let client = ConfClient::builder()
///     .with_admin_address("http://conf-admin:8080/")
///     .with_mirror_file("/var/app/conf-mirror.json")
///     .build()
///     .await?;
///
/// let url = client.get("db.url", "postgres://localhost/dev").await;
///
/// let _watch = client.watch("db.url", |key, value| {
///     println!("{key} is now {value}");
/// }).await;
///
/// client.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct ConfClient {
    engine: Arc<SyncEngine>,
    shutdown_wait: Duration,
}

impl ConfClient {
    /// Create a new builder for constructing a client.
    pub fn builder() -> ConfClientBuilder {
        ConfClientBuilder::new()
    }

    pub(crate) fn new(engine: Arc<SyncEngine>, shutdown_wait: Duration) -> Self {
        Self {
            engine,
            shutdown_wait,
        }
    }

    /// Look up a key, falling back to `default` when the key is unset.
    ///
    /// Cached keys (including keys cached as missing) are answered locally
    /// without touching the network. A first-time lookup asks the admin
    /// source once, caches the answer either way, and joins the daemon's
    /// tracked set. Remote failures are absorbed — this method never errors,
    /// the worst case is the supplied default.
    ///
    /// Concurrent first-time lookups of the same key may each reach the
    /// admin source; there is no per-key single-flight de-duplication.
    pub async fn get(&self, key: &str, default: &str) -> String {
        self.engine.get(key, default).await
    }

    /// Register a listener for changes to one key.
    ///
    /// The callback fires once per genuine value transition detected by the
    /// refresh daemon. Drop the returned handle to unsubscribe.
    pub async fn watch<F>(&self, key: impl Into<String>, callback: F) -> ListenerHandle
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.engine.listeners().watch(key, callback).await
    }

    /// Register a wildcard listener invoked for every key change.
    pub async fn watch_all<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.engine.listeners().watch_all(callback).await
    }

    /// Number of keys this client currently tracks.
    pub fn tracked_len(&self) -> usize {
        self.engine.cache().len()
    }

    /// Stop the refresh daemon and wait for it to exit.
    ///
    /// Interrupts an in-flight monitor poll rather than waiting out its
    /// long-poll window. The wait is bounded by the builder's
    /// `with_shutdown_wait` setting.
    ///
    /// # Errors
    ///
    /// Returns [`ConfError::ShutdownTimeout`](crate::error::ConfError) if the
    /// daemon does not stop within the bounded wait.
    pub async fn shutdown(&self) -> Result<()> {
        self.engine.shutdown(self.shutdown_wait).await
    }
}

impl Clone for ConfClient {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            shutdown_wait: self.shutdown_wait,
        }
    }
}
