//! Builder for constructing ConfClient instances.

use crate::core::engine::SyncEngine;
use crate::core::ConfClient;
use crate::error::{ConfError, Result};
use crate::sources::{HttpRemoteSource, MirrorStore, RemoteSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Builder for constructing a [`ConfClient`].
///
/// `build()` runs the full startup sequence: it establishes the remote and
/// mirror handles, bootstraps the cache from mirror + remote, and starts the
/// refresh daemon.
///
/// # Examples
///
/// ```rust,no_run
/// use confsync::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let client = ConfClient::builder()
///     .with_admin_address("http://conf-admin:8080/")
///     .with_env("production")
///     .with_access_token("secret-token")
///     .with_mirror_file("/var/app/conf-mirror.json")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ConfClientBuilder {
    admin_address: Option<String>,
    env: String,
    access_token: String,
    mirror_file: Option<PathBuf>,
    idle_interval: Duration,
    backoff_interval: Duration,
    shutdown_wait: Duration,
    remote: Option<Arc<dyn RemoteSource>>,
}

impl ConfClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            admin_address: None,
            env: "default".to_owned(),
            access_token: String::new(),
            mirror_file: None,
            idle_interval: Duration::from_secs(3),
            backoff_interval: Duration::from_secs(10),
            shutdown_wait: Duration::from_secs(5),
            remote: None,
        }
    }

    /// Set the admin source address, optionally a comma-separated failover
    /// list. Required unless a custom remote source is supplied.
    pub fn with_admin_address(mut self, address: impl Into<String>) -> Self {
        self.admin_address = Some(address.into());
        self
    }

    /// Set the environment namespace keys are resolved in. Default `"default"`.
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    /// Set the access token sent to the admin source. Default empty.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    /// Set the mirror file location. Required.
    ///
    /// The file need not exist; it is created on the first completed sync
    /// cycle and re-read at the next process start.
    pub fn with_mirror_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.mirror_file = Some(path.into());
        self
    }

    /// Set the daemon's sleep interval while the cache is empty. Default 3s.
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    /// Set the delay applied after a failed or empty monitor poll before the
    /// next refresh. Default 10s.
    pub fn with_backoff_interval(mut self, interval: Duration) -> Self {
        self.backoff_interval = interval;
        self
    }

    /// Set the bounded wait for [`ConfClient::shutdown`]. Default 5s.
    pub fn with_shutdown_wait(mut self, wait: Duration) -> Self {
        self.shutdown_wait = wait;
        self
    }

    /// Supply a custom remote source instead of the built-in HTTP one.
    ///
    /// Useful for tests and for admin sources speaking a different protocol.
    pub fn with_remote_source(mut self, remote: Arc<dyn RemoteSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Build the client: connect the sources, bootstrap, start the daemon.
    ///
    /// # Errors
    ///
    /// Returns an error only for invalid settings (no mirror file, no admin
    /// address or remote source, unbuildable HTTP client). An unreachable
    /// admin source or a missing mirror file is *not* an error — the client
    /// starts with whatever data is available.
    pub async fn build(self) -> Result<ConfClient> {
        let mirror_file = self
            .mirror_file
            .ok_or_else(|| ConfError::InvalidConfig("mirror file is required".into()))?;

        let remote: Arc<dyn RemoteSource> = match self.remote {
            Some(remote) => remote,
            None => {
                let address = self.admin_address.ok_or_else(|| {
                    ConfError::InvalidConfig(
                        "either an admin address or a custom remote source is required".into(),
                    )
                })?;
                Arc::new(
                    HttpRemoteSource::builder()
                        .with_admin_address(address)
                        .with_env(self.env)
                        .with_access_token(self.access_token)
                        .build()?,
                )
            }
        };

        let engine = Arc::new(SyncEngine::new(
            remote,
            MirrorStore::new(mirror_file),
            self.idle_interval,
            self.backoff_interval,
        ));

        engine.bootstrap().await;
        engine.spawn_daemon();

        Ok(ConfClient::new(engine, self.shutdown_wait))
    }
}

impl Default for ConfClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
