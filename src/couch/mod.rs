pub mod admin;
pub mod database;
pub mod location;

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use reqwest::{Client, Method, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info_span, Instrument};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client bound to one CouchDB server.
#[derive(Debug, Clone)]
pub struct CouchClient {
    base: Url,
    client: Client,
}

#[derive(Debug)]
pub struct CouchResponse {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub body: Value,
}

impl CouchResponse {
    /// CouchDB's `reason` (or `error`) field, empty if absent.
    #[must_use]
    pub fn reason(&self) -> &str {
        self.body
            .get("reason")
            .or_else(|| self.body.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Fail with [`Error::Status`] unless the request succeeded.
    /// # Errors
    /// Returns an error if the status is not a success.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    #[must_use]
    pub fn into_error(self) -> Error {
        Error::Status {
            reason: self.reason().to_string(),
            method: self.method,
            url: self.url,
            status: self.status,
        }
    }
}

impl CouchClient {
    /// # Errors
    /// Returns an error if `url` is not an absolute http(s) URL or the client cannot be built.
    pub fn new(user_agent: &str, url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(url)?;

        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(Error::UnsupportedUrl(url.to_string()));
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self { base, client })
    }

    /// Endpoint for `segments` below the base URL, each segment percent-encoded.
    /// # Errors
    /// Returns an error if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::UnsupportedUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Issue one request and decode the JSON answer. Any HTTP status is a
    /// successful response here; only transport failures are errors.
    /// # Errors
    /// Returns an error if the request cannot be sent or times out.
    pub async fn request(
        &self,
        method: Method,
        segments: &[&str],
        auth: Option<&Credentials>,
        body: Option<&Value>,
    ) -> Result<CouchResponse> {
        let url = self.endpoint(segments)?;
        debug!("couch request: {} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header("Accept", "application/json");
        if let Some(creds) = auth {
            request = request.basic_auth(&creds.username, Some(creds.password.expose_secret()));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let span = info_span!(
            "couch.request",
            http.method = %method,
            url = %url,
            authenticated = auth.is_some()
        );
        let response = request.send().instrument(span).await?;
        let status = response.status();
        let text = response.text().await?;

        // CouchDB always answers JSON, proxies in front of it may not.
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        debug!("couch response: {} {} -> {}", method, url, status);

        Ok(CouchResponse {
            method,
            url: url.to_string(),
            status,
            body,
        })
    }
}
