//! Listener registry for configuration change notifications.

use std::sync::Arc;
use tokio::sync::RwLock;

/// Handle for a registered listener that can be dropped to unsubscribe.
///
/// When the handle is dropped, the listener is automatically removed.
pub struct ListenerHandle {
    id: usize,
    registry: Arc<RwLock<ListenerRegistryInner>>,
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        let id = self.id;
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let mut inner = registry.write().await;
            inner.listeners.retain(|l| l.id != id);
        });
    }
}

type ChangeFn = Box<dyn Fn(&str, &str) + Send + Sync>;

struct Listener {
    id: usize,
    /// `None` watches every key (wildcard registration).
    key: Option<String>,
    callback: ChangeFn,
}

/// Internal listener registry state.
struct ListenerRegistryInner {
    listeners: Vec<Listener>,
    next_id: usize,
}

/// Registry of change listeners, keyed or wildcard.
///
/// The sync engine invokes [`on_change`](Self::on_change) exactly once per
/// genuine value transition per refresh cycle; an unchanged remote value
/// never reaches a listener.
///
/// # Examples
///
/// ```rust,no_run
/// use confsync::notify::ListenerRegistry;
///
/// # async fn example() {
/// let registry = ListenerRegistry::new();
///
/// let handle = registry.watch("db.url", |key, value| {
///     println!("{key} changed to {value}");
/// }).await;
///
/// registry.on_change("db.url", "postgres://replica").await;
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// # }
/// ```
pub struct ListenerRegistry {
    inner: Arc<RwLock<ListenerRegistryInner>>,
}

impl ListenerRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ListenerRegistryInner {
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register a listener for a single key.
    ///
    /// Returns a handle that can be dropped to unsubscribe.
    pub async fn watch<F>(&self, key: impl Into<String>, callback: F) -> ListenerHandle
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.register(Some(key.into()), Box::new(callback)).await
    }

    /// Register a wildcard listener invoked for every key change.
    pub async fn watch_all<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.register(None, Box::new(callback)).await
    }

    async fn register(&self, key: Option<String>, callback: ChangeFn) -> ListenerHandle {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push(Listener { id, key, callback });

        ListenerHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Dispatch a change to every listener watching `key`, plus wildcards.
    ///
    /// Listeners run on the caller's task, in registration order.
    pub async fn on_change(&self, key: &str, value: &str) {
        let inner = self.inner.read().await;
        for listener in &inner.listeners {
            match &listener.key {
                Some(watched) if watched != key => {}
                _ => (listener.callback)(key, value),
            }
        }
    }

    /// Number of registered listeners.
    pub async fn listener_count(&self) -> usize {
        self.inner.read().await.listeners.len()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ListenerRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
