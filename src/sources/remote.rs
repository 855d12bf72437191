//! The remote admin source: point lookup, bulk lookup, and change monitoring.

use crate::error::{ConfError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Interface to the central configuration authority.
///
/// All three operations may fail with a transport error; the sync engine
/// absorbs every such failure (empty bootstrap contribution, daemon backoff,
/// negative cache) and never propagates it to foreground callers.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Look up a single key. `Ok(None)` means the admin source has no value
    /// for it.
    async fn find(&self, key: &str) -> Result<Option<String>>;

    /// Look up many keys at once. Keys the admin source does not know are
    /// omitted from the result.
    async fn find_many(&self, keys: &[String]) -> Result<HashMap<String, String>>;

    /// Block until the admin source reports a change among `keys`, or its
    /// long-poll window expires. `Ok(true)` means "re-fetch now",
    /// `Ok(false)` means nothing changed.
    ///
    /// Implementations must be cancel-safe: the engine drops a pending
    /// monitor future on shutdown or early wake.
    async fn monitor(&self, keys: &[String]) -> Result<bool>;
}

const FIND_PATH: &str = "conf/find";
const MONITOR_PATH: &str = "conf/monitor";
const CODE_SUCCESS: i64 = 200;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminRequest<'a> {
    access_token: &'a str,
    env: &'a str,
    keys: &'a [String],
}

#[derive(Debug, Deserialize)]
struct AdminResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<HashMap<String, String>>,
}

/// HTTP implementation of [`RemoteSource`] against an admin server.
///
/// POSTs a JSON body of `{accessToken, env, keys}` to `conf/find` and
/// `conf/monitor` and decodes the `{code, msg, data}` response envelope.
/// Accepts a comma-separated list of admin addresses and fails over through
/// them in order. The monitor call uses a longer per-request timeout than
/// lookups, since the server holds it open until a change or its own
/// long-poll window expires.
///
/// # Examples
///
/// ```rust,no_run
/// use confsync::sources::HttpRemoteSource;
/// use std::time::Duration;
///
/// # fn example() -> confsync::error::Result<()> {
/// let remote = HttpRemoteSource::builder()
///     .with_admin_address("http://conf-admin-a:8080/,http://conf-admin-b:8080/")
///     .with_env("production")
///     .with_access_token("secret-token")
///     .with_monitor_timeout(Duration::from_secs(60))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct HttpRemoteSource {
    addresses: Vec<String>,
    env: String,
    access_token: String,
    client: Client,
    monitor_timeout: Duration,
}

impl HttpRemoteSource {
    /// Create a new builder for constructing an HTTP remote source.
    pub fn builder() -> HttpRemoteSourceBuilder {
        HttpRemoteSourceBuilder::new()
    }

    /// POST `keys` to `path` on each admin address in turn, returning the
    /// first decodable envelope.
    async fn post(
        &self,
        path: &str,
        keys: &[String],
        timeout: Option<Duration>,
    ) -> Result<AdminResponse> {
        let body = AdminRequest {
            access_token: &self.access_token,
            env: &self.env,
            keys,
        };

        let mut last_err = None;
        for address in &self.addresses {
            let url = format!("{}/{}", address.trim_end_matches('/'), path);
            let mut request = self.client.post(&url).json(&body);
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => {
                    debug!(url = %url, error = %err, "admin request failed, trying next address");
                    last_err = Some(ConfError::RemoteUnavailable(err.to_string()));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                debug!(url = %url, %status, "admin returned non-success status");
                last_err = Some(ConfError::RemoteUnavailable(format!(
                    "{url} returned {status}"
                )));
                continue;
            }

            match response.json::<AdminResponse>().await {
                Ok(envelope) => return Ok(envelope),
                Err(err) => {
                    last_err = Some(ConfError::RemoteProtocol(err.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| ConfError::InvalidConfig("no admin address configured".into())))
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn find(&self, key: &str) -> Result<Option<String>> {
        let keys = [key.to_owned()];
        let mut data = self.find_many(&keys).await?;
        Ok(data.remove(key))
    }

    async fn find_many(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        let envelope = self.post(FIND_PATH, keys, None).await?;
        if envelope.code != CODE_SUCCESS {
            return Err(ConfError::RemoteProtocol(format!(
                "find returned code {}: {}",
                envelope.code,
                envelope.msg.unwrap_or_default()
            )));
        }
        Ok(envelope.data.unwrap_or_default())
    }

    async fn monitor(&self, keys: &[String]) -> Result<bool> {
        let envelope = self
            .post(MONITOR_PATH, keys, Some(self.monitor_timeout))
            .await?;
        // Any non-success code is the server saying "nothing changed" (its
        // long-poll window expired), not a transport failure.
        Ok(envelope.code == CODE_SUCCESS)
    }
}

/// Builder for constructing an [`HttpRemoteSource`].
pub struct HttpRemoteSourceBuilder {
    admin_address: Option<String>,
    env: String,
    access_token: String,
    find_timeout: Duration,
    monitor_timeout: Duration,
}

impl HttpRemoteSourceBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            admin_address: None,
            env: "default".to_owned(),
            access_token: String::new(),
            find_timeout: Duration::from_secs(10),
            monitor_timeout: Duration::from_secs(60),
        }
    }

    /// Set the admin address, optionally a comma-separated failover list.
    pub fn with_admin_address(mut self, address: impl Into<String>) -> Self {
        self.admin_address = Some(address.into());
        self
    }

    /// Set the environment namespace keys are resolved in. Default `"default"`.
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    /// Set the access token sent with every request. Default empty (no auth).
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    /// Set the timeout for `find`/`find_many` round trips. Default 10s.
    pub fn with_find_timeout(mut self, timeout: Duration) -> Self {
        self.find_timeout = timeout;
        self
    }

    /// Set the long-poll timeout for `monitor`. Default 60s. Must exceed the
    /// admin server's own hold-open window or every poll looks like a
    /// transport failure.
    pub fn with_monitor_timeout(mut self, timeout: Duration) -> Self {
        self.monitor_timeout = timeout;
        self
    }

    /// Build the remote source.
    ///
    /// # Errors
    ///
    /// Returns an error if no admin address was provided or the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<HttpRemoteSource> {
        let address = self
            .admin_address
            .ok_or_else(|| ConfError::InvalidConfig("admin address is required".into()))?;

        let addresses: Vec<String> = address
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_owned)
            .collect();
        if addresses.is_empty() {
            return Err(ConfError::InvalidConfig(
                "admin address list is empty".into(),
            ));
        }

        let client = Client::builder()
            .timeout(self.find_timeout)
            .build()
            .map_err(|e| ConfError::InvalidConfig(format!("failed to create HTTP client: {e}")))?;

        Ok(HttpRemoteSource {
            addresses,
            env: self.env,
            access_token: self.access_token,
            client,
            monitor_timeout: self.monitor_timeout,
        })
    }
}

impl Default for HttpRemoteSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let remote = HttpRemoteSource::builder()
            .with_admin_address("http://conf-admin:8080")
            .with_env("staging")
            .with_access_token("token123")
            .with_monitor_timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(remote.addresses, vec!["http://conf-admin:8080"]);
        assert_eq!(remote.env, "staging");
        assert_eq!(remote.monitor_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_no_address() {
        assert!(HttpRemoteSource::builder().build().is_err());
    }

    #[test]
    fn test_builder_splits_address_list() {
        let remote = HttpRemoteSource::builder()
            .with_admin_address("http://a:8080/, http://b:8080 ,")
            .build()
            .unwrap();

        assert_eq!(remote.addresses, vec!["http://a:8080/", "http://b:8080"]);
    }

    #[test]
    fn test_envelope_decodes_without_data() {
        let envelope: AdminResponse =
            serde_json::from_str(r#"{"code": 501, "msg": "monitor timeout"}"#).unwrap();
        assert_eq!(envelope.code, 501);
        assert_eq!(envelope.msg.as_deref(), Some("monitor timeout"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_envelope_decodes_data_map() {
        let envelope: AdminResponse =
            serde_json::from_str(r#"{"code": 200, "data": {"a": "1", "b": ""}}"#).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data["a"], "1");
        assert_eq!(data["b"], "");
    }

    #[test]
    fn test_request_body_shape() {
        let keys = vec!["a".to_owned()];
        let body = AdminRequest {
            access_token: "t",
            env: "default",
            keys: &keys,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["accessToken"], "t");
        assert_eq!(json["env"], "default");
        assert_eq!(json["keys"][0], "a");
    }
}
