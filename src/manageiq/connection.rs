//! Connection parameters
//!
//! Validates the `manageiq_connection` argument set and picks the
//! authentication scheme once, up front. Environment defaults are the
//! caller's business; nothing here reads the process environment.

use super::error::VmdbError;
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

const MISSING_ARGUMENT: &str = "missing required argument: manageiq_connection";

/// Connection arguments as supplied by the caller
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionParams {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// ManageIQ group to act as
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default)]
    pub ca_bundle_path: Option<PathBuf>,
    #[serde(default)]
    pub client_cert: Option<PathBuf>,
    #[serde(default)]
    pub client_key: Option<PathBuf>,
    /// Prefer basic auth over the token when both are configured
    #[serde(default)]
    pub force_basic_auth: bool,
}

fn default_verify_ssl() -> bool {
    true
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            token: None,
            group: None,
            verify_ssl: default_verify_ssl(),
            ca_bundle_path: None,
            client_cert: None,
            client_key: None,
            force_basic_auth: false,
        }
    }
}

/// How requests authenticate
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// `X-Auth-Token` header
    Token(String),
    /// HTTP basic authentication
    Basic { username: String, password: String },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print secrets
        match self {
            Auth::Token(_) => f.write_str("Token(***)"),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// TLS settings for the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsOptions {
    pub verify: bool,
    pub ca_bundle: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            verify: true,
            ca_bundle: None,
            client_cert: None,
            client_key: None,
        }
    }
}

/// A validated connection
#[derive(Debug, Clone)]
pub struct Connection {
    pub base_url: Url,
    pub auth: Auth,
    pub tls: TlsOptions,
    pub group: Option<String>,
}

/// Treat empty strings like absent values
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ConnectionParams {
    /// Validate the parameters and choose the authentication scheme.
    ///
    /// Accepts `url + username + password` or `url + token`. Otherwise the
    /// error names the first missing field in the order url, username,
    /// password.
    pub fn resolve(self) -> Result<Connection, VmdbError> {
        let url = present(&self.url);
        let username = present(&self.username);
        let password = present(&self.password);
        let token = present(&self.token);

        let (url, auth) = match (url, username, password, token) {
            (Some(url), Some(username), Some(password), Some(_)) if self.force_basic_auth => (
                url,
                Auth::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            ),
            (Some(url), _, _, Some(token)) => (url, Auth::Token(token.to_string())),
            (Some(url), Some(username), Some(password), None) => (
                url,
                Auth::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            ),
            _ => {
                let missing = if url.is_none() {
                    "url"
                } else if username.is_none() {
                    "username"
                } else {
                    "password"
                };
                return Err(VmdbError::InvalidConnection(format!(
                    "{MISSING_ARGUMENT}[{missing}]"
                )));
            }
        };

        let base_url = Url::parse(url)
            .map_err(|e| VmdbError::InvalidConnection(format!("invalid url '{url}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(VmdbError::InvalidConnection(format!(
                "invalid url '{url}': unsupported scheme '{}'",
                base_url.scheme()
            )));
        }

        if self.client_key.is_some() && self.client_cert.is_none() {
            return Err(VmdbError::InvalidConnection(
                "client_key requires client_cert".to_string(),
            ));
        }

        tracing::debug!(url = %base_url, auth = ?auth, "resolved connection");

        Ok(Connection {
            base_url,
            auth,
            tls: TlsOptions {
                verify: self.verify_ssl,
                ca_bundle: self.ca_bundle_path,
                client_cert: self.client_cert,
                client_key: self.client_key,
            },
            group: self.group.filter(|g| !g.is_empty()),
        })
    }
}

impl Connection {
    /// The REST API root, `<url>/api`
    pub fn api_url(&self) -> String {
        format!("{}/api", self.base_url.as_str().trim_end_matches('/'))
    }
}
