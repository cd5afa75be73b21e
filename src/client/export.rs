//! Export client
//!
//! [`ExportClient`] turns one [`ParameterSet`] into one HTTP request/response
//! cycle and classifies the result. It holds no mutable state between calls,
//! so a single client may serve concurrent exports; the only shared resource
//! is the transport's connection pool.

use std::borrow::Cow;
use std::sync::Arc;

use tokio::sync::watch;
use url::form_urlencoded;

use crate::client::transport::{HttpResponse, HttpTransport, ReqwestTransport};
use crate::config::ApiConfig;
use crate::domain::errors::{ExportError, TransportError};
use crate::domain::params::{ExportFormat, ParameterSet, WireValue};
use crate::domain::result::Result;

/// A successful export: the requested format and the raw response body
///
/// The body is returned exactly as the server sent it; parsing it is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// The serialization format that was requested
    pub format: ExportFormat,

    /// Raw response body
    pub body: Vec<u8>,
}

impl ExportResult {
    /// The response body as text, with invalid UTF-8 replaced
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Client for submitting export requests to a token-authenticated API
///
/// The client is configured once (endpoint, transport, redirect cap) and can
/// then execute any number of parameter sets, concurrently if desired. Each
/// [`execute`](ExportClient::execute) call issues exactly one outbound HTTP
/// request; retry policy belongs to the caller.
///
/// # Example
///
/// ```no_run
/// use redcap_export::client::ExportClient;
/// use redcap_export::domain::{ExportContent, ExportFormat, ParameterSet, RecordType};
///
/// # async fn example(config: &redcap_export::config::ApiConfig)
/// #     -> Result<(), Box<dyn std::error::Error>> {
/// let client = ExportClient::from_config(config)?;
///
/// let params = ParameterSet::builder()
///     .token("0123456789ABCDEF")
///     .content(ExportContent::Record)
///     .format(ExportFormat::Csv)
///     .record_type(RecordType::Flat)
///     .build()?;
///
/// let result = client.execute(&params).await?;
/// println!("{}", result.body_text());
/// # Ok(())
/// # }
/// ```
pub struct ExportClient {
    endpoint_url: String,
    transport: Arc<dyn HttpTransport>,
    max_redirects: usize,
}

impl ExportClient {
    /// Creates a client with a reqwest transport built from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the transport cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let transport = ReqwestTransport::from_config(config)?;
        Ok(Self {
            endpoint_url: config.url.clone(),
            transport: Arc::new(transport),
            max_redirects: config.max_redirects,
        })
    }

    /// Creates a client with an injected transport
    ///
    /// This is the seam used by tests and by callers that manage their own
    /// transport. The transport keeps responsibility for timeouts and
    /// redirect following; `max_redirects` is only reported back in
    /// [`ExportError::RedirectLimit`].
    pub fn with_transport(
        endpoint_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        max_redirects: usize,
    ) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            transport,
            max_redirects,
        }
    }

    /// The configured API endpoint
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Executes one export attempt
    ///
    /// Serializes the parameter set, issues a single POST through the
    /// transport, and classifies the HTTP status: 2xx is a success, 4xx a
    /// rejection carrying the server's message body, 5xx a server failure.
    /// Never retries; the parameter set is immutable and may be passed to
    /// `execute` again for a caller-driven retry of the same logical
    /// request.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] classifying the failure; see the error
    /// type for the retryability of each kind.
    pub async fn execute(&self, params: &ParameterSet) -> std::result::Result<ExportResult, ExportError> {
        // The encoded body carries the token, so it is never logged
        let body = encode_wire_form(&params.to_wire_form());

        tracing::debug!(
            endpoint = %self.endpoint_url,
            content = %params.content(),
            format = %params.format(),
            "Submitting export request"
        );

        let response = self
            .transport
            .post_form(&self.endpoint_url, body)
            .await
            .map_err(|e| self.map_transport_error(e))?;

        self.classify(params, response)
    }

    /// Executes one export attempt that can be cancelled
    ///
    /// A signaled shutdown channel aborts the in-flight call and surfaces
    /// [`ExportError::Cancelled`], never a partial success.
    ///
    /// # Errors
    ///
    /// As [`execute`](ExportClient::execute), plus `Cancelled` when the
    /// shutdown signal fires first.
    pub async fn execute_with_shutdown(
        &self,
        params: &ParameterSet,
        mut shutdown: watch::Receiver<bool>,
    ) -> std::result::Result<ExportResult, ExportError> {
        if *shutdown.borrow() {
            return Err(ExportError::Cancelled);
        }

        let attempt = self.execute(params);
        tokio::pin!(attempt);

        loop {
            tokio::select! {
                result = &mut attempt => return result,
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Export cancelled by shutdown signal");
                        return Err(ExportError::Cancelled);
                    }
                }
            }
        }
    }

    fn map_transport_error(&self, err: TransportError) -> ExportError {
        match err {
            TransportError::TooManyRedirects => ExportError::RedirectLimit {
                max_redirects: self.max_redirects,
            },
            other => ExportError::from(other),
        }
    }

    fn classify(
        &self,
        params: &ParameterSet,
        response: HttpResponse,
    ) -> std::result::Result<ExportResult, ExportError> {
        match response.status {
            200..=299 => {
                tracing::info!(
                    status = response.status,
                    bytes = response.body.len(),
                    "Export succeeded"
                );
                Ok(ExportResult {
                    format: params.format(),
                    body: response.body,
                })
            }
            // The transport follows redirects itself; one surfacing here
            // means the cap stopped it
            300..=399 => Err(ExportError::RedirectLimit {
                max_redirects: self.max_redirects,
            }),
            400..=499 => {
                // The body commonly carries the API's human-readable error
                // message; pass it through unmodified
                let body = String::from_utf8_lossy(&response.body).into_owned();
                tracing::warn!(status = response.status, "Export rejected by API");
                Err(ExportError::ClientRejected {
                    status: response.status,
                    body,
                })
            }
            status => {
                tracing::warn!(status, "API server failure");
                Err(ExportError::ServerFailure { status })
            }
        }
    }
}

/// Serializes a wire form into an `application/x-www-form-urlencoded` body
///
/// Scalar entries become `key=value`; list entries become repeated
/// `key[]=item` pairs in input order. The output is byte-for-byte stable for
/// a given wire form.
pub fn encode_wire_form(form: &[(String, WireValue)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form {
        match value {
            WireValue::Scalar(v) => {
                serializer.append_pair(key, v);
            }
            WireValue::List(items) => {
                let list_key = format!("{key}[]");
                for item in items {
                    serializer.append_pair(&list_key, item);
                }
            }
        }
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::{ExportContent, RecordType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport stub returning a canned response and counting calls
    struct StubTransport {
        status: u16,
        body: Vec<u8>,
        calls: AtomicUsize,
    }

    impl StubTransport {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.as_bytes().to_vec(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpTransport for StubTransport {
        async fn post_form(
            &self,
            _url: &str,
            _body: String,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    /// Transport stub failing with a fixed transport error
    struct FailingTransport<F: Fn() -> TransportError + Send + Sync>(F);

    #[async_trait]
    impl<F: Fn() -> TransportError + Send + Sync> HttpTransport for FailingTransport<F> {
        async fn post_form(
            &self,
            _url: &str,
            _body: String,
        ) -> std::result::Result<HttpResponse, TransportError> {
            Err((self.0)())
        }
    }

    fn record_params() -> ParameterSet {
        ParameterSet::builder()
            .token("ABC")
            .content(ExportContent::Record)
            .format(ExportFormat::Csv)
            .record_type(RecordType::Flat)
            .build()
            .unwrap()
    }

    fn client_with(transport: Arc<dyn HttpTransport>) -> ExportClient {
        ExportClient::with_transport("https://redcap.example.edu/api/", transport, 10)
    }

    #[test]
    fn test_encode_scalar_and_list_entries() {
        let form = vec![
            ("token".to_string(), WireValue::Scalar("ABC".to_string())),
            (
                "forms".to_string(),
                WireValue::List(vec!["a".to_string(), "b".to_string()]),
            ),
        ];
        assert_eq!(
            encode_wire_form(&form),
            "token=ABC&forms%5B%5D=a&forms%5B%5D=b"
        );
    }

    #[test]
    fn test_encode_escapes_reserved_characters() {
        let form = vec![(
            "filterLogic".to_string(),
            WireValue::Scalar("[age] > 30".to_string()),
        )];
        assert_eq!(encode_wire_form(&form), "filterLogic=%5Bage%5D+%3E+30");
    }

    #[tokio::test]
    async fn test_success_returns_raw_body() {
        let transport = Arc::new(StubTransport::new(200, "record_id,age\n1,42\n"));
        let client = client_with(transport.clone());

        let result = client.execute(&record_params()).await.unwrap();
        assert_eq!(result.format, ExportFormat::Csv);
        assert_eq!(result.body_text(), "record_id,age\n1,42\n");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_is_idempotent_against_stable_transport() {
        let transport = Arc::new(StubTransport::new(200, "ok"));
        let client = client_with(transport.clone());
        let params = record_params();

        let first = client.execute(&params).await.unwrap();
        let second = client.execute(&params).await.unwrap();
        assert_eq!(first, second);
        // One outbound request per execute call
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_403_classified_as_client_rejected_with_body() {
        let transport = Arc::new(StubTransport::new(403, "Error: invalid token"));
        let client = client_with(transport);

        let err = client.execute(&record_params()).await.unwrap_err();
        match err {
            ExportError::ClientRejected { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "Error: invalid token");
            }
            other => panic!("Expected ClientRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_500_classified_as_server_failure() {
        let transport = Arc::new(StubTransport::new(503, "unavailable"));
        let client = client_with(transport);

        let err = client.execute(&record_params()).await.unwrap_err();
        assert!(matches!(err, ExportError::ServerFailure { status: 503 }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_unfollowed_redirect_classified_as_redirect_limit() {
        let transport = Arc::new(StubTransport::new(302, ""));
        let client = client_with(transport);

        let err = client.execute(&record_params()).await.unwrap_err();
        assert!(matches!(err, ExportError::RedirectLimit { max_redirects: 10 }));
    }

    #[tokio::test]
    async fn test_timeout_classified_as_transport_failure() {
        let transport = Arc::new(FailingTransport(|| {
            TransportError::Timeout("30s elapsed".to_string())
        }));
        let client = client_with(transport);

        let err = client.execute(&record_params()).await.unwrap_err();
        assert!(matches!(
            err,
            ExportError::Transport(TransportError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_redirect_cap_from_transport_maps_to_redirect_limit() {
        let transport = Arc::new(FailingTransport(|| TransportError::TooManyRedirects));
        let client = client_with(transport);

        let err = client.execute(&record_params()).await.unwrap_err();
        assert!(matches!(err, ExportError::RedirectLimit { max_redirects: 10 }));
    }

    #[tokio::test]
    async fn test_already_signaled_shutdown_cancels_before_any_request() {
        let transport = Arc::new(StubTransport::new(200, "ok"));
        let client = client_with(transport.clone());
        let (tx, rx) = watch::channel(true);

        let err = client
            .execute_with_shutdown(&record_params(), rx)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Cancelled));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        drop(tx);
    }

    #[tokio::test]
    async fn test_shutdown_signal_cancels_in_flight_request() {
        /// Transport that never completes
        struct HangingTransport;

        #[async_trait]
        impl HttpTransport for HangingTransport {
            async fn post_form(
                &self,
                _url: &str,
                _body: String,
            ) -> std::result::Result<HttpResponse, TransportError> {
                futures::future::pending().await
            }
        }

        let client = client_with(Arc::new(HangingTransport));
        let (tx, rx) = watch::channel(false);
        let params = record_params();

        let export = client.execute_with_shutdown(&params, rx);
        tokio::pin!(export);

        // Give the request a chance to start, then signal shutdown
        tokio::select! {
            _ = &mut export => panic!("export should still be in flight"),
            _ = tokio::time::sleep(std::time::Duration::from_millis(10)) => {}
        }
        tx.send(true).unwrap();

        let err = export.await.unwrap_err();
        assert!(matches!(err, ExportError::Cancelled));
    }
}
