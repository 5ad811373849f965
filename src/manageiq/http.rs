//! HTTP transport for ManageIQ REST API calls

use super::connection::{Auth, Connection, TlsOptions};
use super::error::{TransportError, VmdbError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Certificate, Client, Identity, RequestBuilder};
use serde_json::Value;
use std::path::Path;

/// Content type sent with every request
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const AUTH_TOKEN_HEADER: &str = "x-auth-token";
const GROUP_HEADER: &str = "x-miq-group";

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// GET and POST against the API, returning decoded JSON.
///
/// The dispatcher only talks to this trait so tests can swap in a double.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// GET `url` without a body
    async fn get(&self, url: &str) -> Result<Value, VmdbError>;

    /// POST `body` as JSON to `url`
    async fn post(&self, url: &str, body: &Value) -> Result<Value, VmdbError>;
}

impl<T: Transport> Transport for &T {
    async fn get(&self, url: &str) -> Result<Value, VmdbError> {
        (**self).get(url).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, VmdbError> {
        (**self).post(url, body).await
    }
}

/// reqwest-backed transport authenticating every request
#[derive(Clone)]
pub struct MiqHttpClient {
    client: Client,
    auth: Auth,
}

impl MiqHttpClient {
    /// Build a client for a resolved connection
    pub fn new(connection: &Connection) -> Result<Self, VmdbError> {
        let mut headers = HeaderMap::new();
        if let Some(group) = &connection.group {
            let value = HeaderValue::from_str(group).map_err(|_| {
                VmdbError::InvalidConnection(format!("invalid group name '{group}'"))
            })?;
            headers.insert(HeaderName::from_static(GROUP_HEADER), value);
        }

        let builder = Client::builder()
            .user_agent(concat!("miq-vmdb/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);
        let client = apply_tls(builder, &connection.tls)?
            .build()
            .map_err(|e| {
                VmdbError::InvalidConnection(format!(
                    "failed to open connection ({}): {e}",
                    connection.base_url
                ))
            })?;

        Ok(Self {
            client,
            auth: connection.auth.clone(),
        })
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        match &self.auth {
            Auth::Token(token) => request.header(AUTH_TOKEN_HEADER, token),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Value, VmdbError> {
        let request_error = |source: reqwest::Error| TransportError::Request {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        let body = response.text().await.map_err(request_error)?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(TransportError::Status {
                status,
                message: error_message(&body),
            }
            .into());
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body).map_err(TransportError::from)?)
    }
}

impl Transport for MiqHttpClient {
    async fn get(&self, url: &str) -> Result<Value, VmdbError> {
        tracing::debug!("GET {}", url);
        let request = self.authenticate(self.client.get(url));
        self.send(url, request).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, VmdbError> {
        tracing::debug!("POST {}", url);
        let request = self.authenticate(self.client.post(url)).json(body);
        self.send(url, request).await
    }
}

/// Pull the API's own error text out of a failed response.
///
/// ManageIQ answers errors with `{"error": {"kind": ..., "message": ...}}`.
/// Anything else falls back to a sanitized excerpt of the body.
fn error_message(body: &str) -> String {
    if body.trim().is_empty() {
        return "empty response body".to_string();
    }

    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| sanitize_for_log(body))
}

fn apply_tls(
    mut builder: reqwest::ClientBuilder,
    tls: &TlsOptions,
) -> Result<reqwest::ClientBuilder, VmdbError> {
    if !tls.verify {
        tracing::warn!("TLS certificate verification disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(path) = &tls.ca_bundle {
        let pem = read_pem(path)?;
        let certs = Certificate::from_pem_bundle(&pem).map_err(|e| {
            VmdbError::InvalidConnection(format!("invalid CA bundle {}: {e}", path.display()))
        })?;
        if certs.is_empty() {
            return Err(VmdbError::InvalidConnection(format!(
                "no certificates in CA bundle {}",
                path.display()
            )));
        }
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    if let Some(cert_path) = &tls.client_cert {
        // rustls wants the certificate chain and the key in one PEM blob
        let mut pem = read_pem(cert_path)?;
        if let Some(key_path) = &tls.client_key {
            pem.push(b'\n');
            pem.extend(read_pem(key_path)?);
        }
        let identity = Identity::from_pem(&pem).map_err(|e| {
            VmdbError::InvalidConnection(format!(
                "invalid client certificate {}: {e}",
                cert_path.display()
            ))
        })?;
        builder = builder.identity(identity);
    }

    Ok(builder)
}

fn read_pem(path: &Path) -> Result<Vec<u8>, VmdbError> {
    std::fs::read(path).map_err(|e| {
        VmdbError::InvalidConnection(format!("failed to read {}: {e}", path.display()))
    })
}
