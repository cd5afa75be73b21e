//! HTTP transport capability
//!
//! The export client performs exactly one POST per attempt through an
//! injected [`HttpTransport`]. The trait keeps the client testable with a
//! stub and keeps reqwest types out of the rest of the crate; the production
//! implementation is [`ReqwestTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client, ClientBuilder};

use crate::config::ApiConfig;
use crate::domain::errors::{RedcapError, TransportError};
use crate::domain::result::Result;

/// MIME type of the request body produced by the export client
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A raw HTTP response: status plus unparsed body bytes
///
/// The body is kept as bytes because the caller chose the serialization
/// format; the client never interprets it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Raw response body
    pub body: Vec<u8>,
}

/// Capability for performing a form-encoded POST
///
/// Implementations must be safe for concurrent use; the export client shares
/// one transport across concurrent `execute` calls. Connection pooling and
/// reuse discipline belong to the implementation, not the client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issues one POST with a form-encoded body and returns the response
    ///
    /// The implementation is responsible for bounding the call with its
    /// configured timeout and for following redirects up to its configured
    /// cap.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no HTTP status was obtained
    /// (connection failure, TLS failure, timeout, redirect cap exceeded,
    /// cancellation).
    async fn post_form(&self, url: &str, body: String) -> std::result::Result<HttpResponse, TransportError>;
}

/// Production transport backed by reqwest
///
/// Built once per client; reqwest's internal connection pool makes the
/// transport safe and cheap to share across concurrent calls.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a transport from API configuration
    ///
    /// TLS peer verification is on unless `tls_verify = false` was set
    /// explicitly. Disabling it accepts any certificate and should only be
    /// used against internal servers with self-signed certificates.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the underlying client cannot be
    /// constructed.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.timeout_seconds),
            config.max_redirects,
            config.tls_verify,
        )
    }

    /// Builds a transport with explicit settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the underlying client cannot be
    /// constructed.
    pub fn new(timeout: Duration, max_redirects: usize, tls_verify: bool) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(max_redirects));

        if !tls_verify {
            tracing::warn!("TLS certificate verification is DISABLED");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| RedcapError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_form(&self, url: &str, body: String) -> std::result::Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(classify_reqwest_error)?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// Maps a reqwest error onto the domain transport taxonomy
fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(err.to_string());
    }
    if err.is_redirect() {
        return TransportError::TooManyRedirects;
    }
    if err.is_connect() {
        // TLS handshake failures surface as connect errors; inspect the
        // message to keep them distinguishable for callers
        let mut message = err.to_string();
        if let Some(source) = std::error::Error::source(&err) {
            message = format!("{message}: {source}");
        }
        if message.contains("certificate") || message.contains("tls") || message.contains("TLS") {
            return TransportError::Tls(message);
        }
        return TransportError::ConnectionFailed(message);
    }
    TransportError::Other(err.to_string())
}
