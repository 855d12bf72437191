//! Shared test doubles: a scriptable in-memory admin source.

#![allow(dead_code)]

use async_trait::async_trait;
use confsync::error::{ConfError, Result};
use confsync::sources::RemoteSource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// In-memory [`RemoteSource`] driven by the test.
///
/// `monitor` blocks on a gate until the test calls [`release_monitor`], so
/// each daemon cycle runs exactly when the test says it should. Failure
/// injection flags simulate an unreachable admin source.
pub struct ScriptedRemote {
    values: Mutex<HashMap<String, String>>,
    monitor_gate: Notify,
    fail_finds: AtomicBool,
    fail_monitor: AtomicBool,
    pub find_calls: AtomicUsize,
    pub find_many_calls: AtomicUsize,
    pub monitor_calls: AtomicUsize,
    pub monitor_times: Mutex<Vec<Instant>>,
}

impl ScriptedRemote {
    pub fn new(values: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(
                values
                    .iter()
                    .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                    .collect(),
            ),
            monitor_gate: Notify::new(),
            fail_finds: AtomicBool::new(false),
            fail_monitor: AtomicBool::new(false),
            find_calls: AtomicUsize::new(0),
            find_many_calls: AtomicUsize::new(0),
            monitor_calls: AtomicUsize::new(0),
            monitor_times: Mutex::new(Vec::new()),
        })
    }

    /// Change a remote value, as an operator would through the admin UI.
    pub fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
    }

    /// Let the next (or current) blocked monitor call return `true`.
    pub fn release_monitor(&self) {
        self.monitor_gate.notify_one();
    }

    pub fn fail_finds(&self, fail: bool) {
        self.fail_finds.store(fail, Ordering::SeqCst);
    }

    pub fn fail_monitor(&self, fail: bool) {
        self.fail_monitor.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteSource for ScriptedRemote {
    async fn find(&self, key: &str) -> Result<Option<String>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_finds.load(Ordering::SeqCst) {
            return Err(ConfError::RemoteUnavailable("injected failure".into()));
        }
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn find_many(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        self.find_many_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_finds.load(Ordering::SeqCst) {
            return Err(ConfError::RemoteUnavailable("injected failure".into()));
        }
        let values = self.values.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|k| values.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn monitor(&self, _keys: &[String]) -> Result<bool> {
        self.monitor_calls.fetch_add(1, Ordering::SeqCst);
        self.monitor_times.lock().unwrap().push(Instant::now());
        if self.fail_monitor.load(Ordering::SeqCst) {
            return Err(ConfError::RemoteUnavailable("injected failure".into()));
        }
        // Long poll: held open until the test signals a change.
        self.monitor_gate.notified().await;
        Ok(true)
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met within 2s");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
