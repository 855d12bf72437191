//! Foreground lookup behavior: cache hits, defaults, negative caching, and
//! remote-failure absorption.

mod common;

use common::ScriptedRemote;
use confsync::prelude::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn client_with(remote: Arc<ScriptedRemote>, dir: &TempDir) -> ConfClient {
    ConfClient::builder()
        .with_remote_source(remote)
        .with_mirror_file(dir.path().join("mirror.json"))
        .with_idle_interval(Duration::from_millis(10))
        .with_backoff_interval(Duration::from_millis(10))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn lookup_returns_remote_value_then_serves_from_cache() {
    let dir = TempDir::new().unwrap();
    let remote = ScriptedRemote::new(&[("db.url", "postgres://primary")]);
    let client = client_with(Arc::clone(&remote), &dir).await;

    assert_eq!(client.get("db.url", "d").await, "postgres://primary");
    assert_eq!(client.get("db.url", "d").await, "postgres://primary");
    assert_eq!(remote.find_calls.load(Ordering::SeqCst), 1);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn unknown_key_returns_default_and_is_negatively_cached() {
    let dir = TempDir::new().unwrap();
    let remote = ScriptedRemote::new(&[]);
    let client = client_with(Arc::clone(&remote), &dir).await;

    assert_eq!(client.get("ghost", "d1").await, "d1");
    // Second lookup with a different default: answered locally, new default
    // honored, no second remote call.
    assert_eq!(client.get("ghost", "d2").await, "d2");
    assert_eq!(remote.find_calls.load(Ordering::SeqCst), 1);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn remote_failure_never_reaches_the_caller() {
    let dir = TempDir::new().unwrap();
    let remote = ScriptedRemote::new(&[("a", "1")]);
    remote.fail_finds(true);
    let client = client_with(Arc::clone(&remote), &dir).await;

    // Transport error is absorbed and cached as a miss.
    assert_eq!(client.get("a", "fallback").await, "fallback");
    assert_eq!(client.get("a", "fallback").await, "fallback");
    assert_eq!(remote.find_calls.load(Ordering::SeqCst), 1);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn empty_string_value_is_a_real_value() {
    let dir = TempDir::new().unwrap();
    let remote = ScriptedRemote::new(&[("flag", "")]);
    let client = client_with(Arc::clone(&remote), &dir).await;

    // An empty value from the admin source beats the default.
    assert_eq!(client.get("flag", "default").await, "");

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn lookups_join_the_tracked_set() {
    let dir = TempDir::new().unwrap();
    let remote = ScriptedRemote::new(&[("a", "1"), ("b", "2")]);
    let client = client_with(Arc::clone(&remote), &dir).await;

    assert_eq!(client.tracked_len(), 0);
    client.get("a", "d").await;
    client.get("b", "d").await;
    client.get("never.set", "d").await;
    assert_eq!(client.tracked_len(), 3);

    client.shutdown().await.unwrap();
}
