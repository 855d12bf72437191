//! # confsync
//!
//! Client runtime for a distributed configuration service: fetch key/value
//! configuration from a central admin source, cache it locally for fast
//! reads, stay synchronized via change notification, and keep serving the
//! last known good values — from a crash-safe disk mirror — when the admin
//! source is unreachable.
//!
//! ## Overview
//!
//! A [`ConfClient`](core::ConfClient) owns three moving parts:
//!
//! - a concurrent local cache, the single source of truth for reads, with
//!   negative caching of keys the admin source does not have;
//! - a background refresh daemon that long-polls the admin source for
//!   changes, diffs bulk fetches into the cache, dispatches change
//!   notifications, and rewrites the disk mirror after every cycle;
//! - a bootstrap sequence that merges the mirror with fresh remote data
//!   (remote wins) before the daemon starts.
//!
//! Remote and mirror failures never reach callers: lookups fall back to
//! cached values or the caller's default, and the daemon retries with
//! backoff. The only user-visible failure mode during a sustained outage is
//! stale data.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use confsync::prelude::*;
//!
//! # async fn example() -> confsync::error::Result<()> {
//! let client = ConfClient::builder()
//!     .with_admin_address("http://conf-admin:8080/")
//!     .with_env("production")
//!     .with_access_token("secret-token")
//!     .with_mirror_file("/var/app/conf-mirror.json")
//!     .build()
//!     .await?;
//!
//! // Served from the local cache after the first lookup.
//! let pool_size = client.get("db.pool.size", "16").await;
//!
//! // React to changes detected by the refresh daemon.
//! let _watch = client.watch("db.pool.size", |key, value| {
//!     println!("{key} changed to {value}");
//! }).await;
//!
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;
pub mod sources;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConfClient, ConfClientBuilder};
    pub use crate::error::{ConfError, Result};
    pub use crate::notify::ListenerHandle;
}
