// Transport client - one HTTP connection to one cluster node
//
// This module is split into sub-modules:
// - config: connection options and consistency levels
//
// The transport owns the retry policy (bounded immediate retries with a
// client rebuild in between) and the leader-redirect policy (follow 3xx
// responses, switching nodes when the target host/port differs).

pub mod config;

use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::{Client, Method, Response, Url};
use serde_json::Value as JsonValue;

use crate::error::RqliteDbError;

pub use config::{ConnectOptions, ReadConsistency, Scheme};

/// Attempts per logical request before the last transport error propagates.
const RETRY_ATTEMPTS: u32 = 10;

/// One HTTP connection to one cluster node.
///
/// The effective target node changes when a write lands on a non-leader node
/// and the cluster answers with a redirect to the current leader; the old
/// client is dropped and a fresh one opened before the request is resent.
#[derive(Debug)]
pub struct Transport {
    http: Client,
    scheme: Scheme,
    host: String,
    port: u16,
    auth: Option<(String, String)>,
    timeout: Option<Duration>,
    max_redirects: Option<usize>,
    accept_invalid_certs: bool,
}

impl Transport {
    /// Open a transport against the configured node.
    ///
    /// # Errors
    ///
    /// Returns `RqliteDbError::ConfigError` when the HTTP client cannot be
    /// built.
    pub fn connect(options: &ConnectOptions) -> Result<Self, RqliteDbError> {
        let auth = match (&options.user, &options.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };
        Ok(Self {
            http: build_client(options.connect_timeout, options.accept_invalid_certs)?,
            scheme: options.scheme,
            host: options.host.clone(),
            port: options.port,
            auth,
            timeout: options.connect_timeout,
            max_redirects: options.max_redirects,
            accept_invalid_certs: options.accept_invalid_certs,
        })
    }

    /// The node this transport currently points at.
    #[must_use]
    pub fn target(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    /// Build a request URL for a path on the current node.
    ///
    /// # Errors
    ///
    /// Returns `RqliteDbError::ConfigError` for a host that does not form a
    /// valid URL.
    pub fn url_for(&self, path: &str) -> Result<Url, RqliteDbError> {
        let raw = format!("{}://{}:{}{}", self.scheme.as_str(), self.host, self.port, path);
        Url::parse(&raw)
            .map_err(|e| RqliteDbError::ConfigError(format!("invalid request url '{raw}': {e}")))
    }

    /// Send a request, handling transient failures and leader redirection.
    ///
    /// Transient transport failures are retried immediately up to the bound,
    /// reopening the underlying connection each time. Redirects are followed
    /// up to `max_redirects`; when the budget runs out the last response is
    /// returned as-is for the caller to interpret.
    ///
    /// # Errors
    ///
    /// Returns the last transport error once the retry budget is exhausted.
    pub async fn fetch_response(
        &mut self,
        method: Method,
        url: Url,
        body: Option<&JsonValue>,
    ) -> Result<Response, RqliteDbError> {
        let mut url = url;
        let mut response = self.retry_request(&method, &url, body).await?;
        let mut redirects = 0usize;

        while response.status().is_redirection() {
            let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
            else {
                break;
            };
            if let Some(max) = self.max_redirects
                && redirects >= max
            {
                break;
            }
            redirects += 1;

            let target = Url::parse(&location).map_err(|e| {
                RqliteDbError::OperationalError(format!(
                    "invalid redirect location '{location}': {e}"
                ))
            })?;
            tracing::debug!(status = %response.status(), location = %target, "following leader redirect");

            let host = target.host_str().unwrap_or_default().to_string();
            let port = target.port_or_known_default().unwrap_or(self.port);
            if host != self.host || port != self.port {
                self.host = host;
                self.port = port;
                self.scheme = if target.scheme() == "https" {
                    Scheme::Https
                } else {
                    Scheme::Http
                };
                self.reconnect()?;
            }

            url = target;
            response = self.retry_request(&method, &url, body).await?;
        }

        Ok(response)
    }

    async fn retry_request(
        &mut self,
        method: &Method,
        url: &Url,
        body: Option<&JsonValue>,
    ) -> Result<Response, RqliteDbError> {
        let mut tries = RETRY_ATTEMPTS;
        loop {
            tries -= 1;
            tracing::debug!(method = %method, url = %url, "sending request");
            let mut request = self.http.request(method.clone(), url.clone());
            if let Some((user, password)) = &self.auth {
                request = request.basic_auth(user, Some(password));
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            match request.send().await {
                Ok(response) => {
                    tracing::debug!(status = %response.status(), "response received");
                    return Ok(response);
                }
                Err(error) if tries > 0 => {
                    tracing::debug!(error = %error, remaining = tries, "request failed, reopening connection");
                    self.reconnect()?;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn reconnect(&mut self) -> Result<(), RqliteDbError> {
        self.http = build_client(self.timeout, self.accept_invalid_certs)?;
        Ok(())
    }
}

fn build_client(
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
) -> Result<Client, RqliteDbError> {
    let mut builder = Client::builder().redirect(reqwest::redirect::Policy::none());
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if accept_invalid_certs {
        builder = builder.danger_accept_invalid_certs(true);
    }
    builder
        .build()
        .map_err(|e| RqliteDbError::ConfigError(format!("failed to build http client: {e}")))
}
