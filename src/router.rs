//! Request Router: decides per call between synthetic data and the real
//! backend.
//!
//! The mock path is taken only when mocking is enabled in [`RouterConfig`]
//! *and* the request carries a [`MockProvider`]. Everything else goes to the
//! [`Transport`] unchanged.

use crate::errors::{AppError, DomainCode};
use crate::models::ResponseEnvelope;
use crate::transport::Transport;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

// ============ Request descriptor ============

/// A file posted as the `file` part of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    File(UploadedFile),
}

/// Arguments handed to computed providers and forwarded to the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestArgs {
    pub query: BTreeMap<String, String>,
    pub body: Option<RequestBody>,
}

impl RequestArgs {
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Some(RequestBody::Json(value)) => Some(value),
            _ => None,
        }
    }

    pub fn file(&self) -> Option<&UploadedFile> {
        match &self.body {
            Some(RequestBody::File(file)) => Some(file),
            _ => None,
        }
    }
}

/// A raw download (export endpoints).
#[derive(Debug, Clone, PartialEq)]
pub struct FileDownload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// What a mock provider answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Data { data: Value, message: String },
    /// Validation failure: wrapped as a non-zero-code envelope.
    Rejected { code: DomainCode, message: String },
    File(FileDownload),
}

impl MockReply {
    pub fn data(data: Value) -> Self {
        MockReply::Data {
            data,
            message: "success".to_string(),
        }
    }

    pub fn message(data: Value, message: impl Into<String>) -> Self {
        MockReply::Data {
            data,
            message: message.into(),
        }
    }

    pub fn rejected(code: DomainCode, message: impl Into<String>) -> Self {
        MockReply::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Turns a validation error into a rejection; other errors pass through
    /// as provider faults.
    pub fn from_validation(err: AppError) -> Result<Self, AppError> {
        match err.root() {
            AppError::Validation { code, message } => Ok(Self::rejected(*code, message.clone())),
            _ => Err(err),
        }
    }
}

pub type ProviderFuture = BoxFuture<'static, Result<MockReply, AppError>>;
pub type ProviderFn = Arc<dyn Fn(RequestArgs) -> ProviderFuture + Send + Sync>;

/// Synthetic data attached to one request.
#[derive(Clone)]
pub enum MockProvider {
    Static(MockReply),
    Computed(ProviderFn),
}

impl MockProvider {
    pub fn computed<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MockReply, AppError>> + Send + 'static,
    {
        MockProvider::Computed(Arc::new(move |args| f(args).boxed()))
    }

    async fn evaluate(&self, args: RequestArgs) -> Result<MockReply, AppError> {
        match self {
            MockProvider::Static(reply) => Ok(reply.clone()),
            MockProvider::Computed(f) => f(args).await,
        }
    }
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MockProvider::Static(reply) => f.debug_tuple("Static").field(reply).finish(),
            MockProvider::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// One outbound call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub args: RequestArgs,
    pub mock: Option<MockProvider>,
    /// Overrides the router's default mock delay.
    pub mock_delay: Option<Duration>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            args: RequestArgs::default(),
            mock: None,
            mock_delay: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.query.insert(key.into(), value.into());
        self
    }

    pub fn queries(mut self, query: BTreeMap<String, String>) -> Self {
        self.args.query.extend(query);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.args.body = Some(RequestBody::Json(body));
        self
    }

    pub fn file(mut self, file: UploadedFile) -> Self {
        self.args.body = Some(RequestBody::File(file));
        self
    }

    pub fn with_mock(mut self, provider: MockProvider) -> Self {
        self.mock = Some(provider);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.mock_delay = Some(delay);
        self
    }
}

// ============ Response ============

#[derive(Debug, Clone, PartialEq)]
pub enum RoutedResponse {
    Envelope(ResponseEnvelope),
    File(FileDownload),
}

impl RoutedResponse {
    /// The envelope, or an error if the call produced a download.
    pub fn into_envelope(self) -> Result<ResponseEnvelope, AppError> {
        match self {
            RoutedResponse::Envelope(envelope) => Ok(envelope),
            RoutedResponse::File(file) => Err(AppError::Internal(format!(
                "Expected an envelope, got file {}",
                file.file_name
            ))),
        }
    }
}

impl From<MockReply> for RoutedResponse {
    fn from(reply: MockReply) -> Self {
        match reply {
            MockReply::Data { data, message } => {
                RoutedResponse::Envelope(ResponseEnvelope::with_message(data, message))
            }
            MockReply::Rejected { code, message } => {
                RoutedResponse::Envelope(ResponseEnvelope::rejected(code, message))
            }
            MockReply::File(file) => RoutedResponse::File(file),
        }
    }
}

// ============ Router ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    pub mock_enabled: bool,
    pub default_delay: Duration,
}

impl RouterConfig {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            mock_enabled: config.mock_enabled,
            default_delay: config.mock_delay(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mock_enabled: true,
            default_delay: Duration::from_millis(300),
        }
    }
}

#[derive(Clone)]
pub struct RequestRouter {
    config: RouterConfig,
    transport: Arc<dyn Transport>,
}

impl RequestRouter {
    pub fn new(config: RouterConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> RouterConfig {
        self.config
    }

    /// Routes one request. Transport failures and provider faults are
    /// returned unchanged.
    pub async fn route(&self, request: RequestDescriptor) -> Result<RoutedResponse, AppError> {
        let RequestDescriptor {
            method,
            path,
            args,
            mock,
            mock_delay,
        } = request;

        match mock {
            Some(provider) if self.config.mock_enabled => {
                let delay = mock_delay.unwrap_or(self.config.default_delay);
                tracing::info!("Serving {} {} from mock ({:?} delay)", method, path, delay);

                tokio::time::sleep(delay).await;
                let reply = provider.evaluate(args).await.map_err(|e| {
                    tracing::warn!("Mock provider for {} {} failed: {}", method, path, e);
                    e
                })?;
                Ok(reply.into())
            }
            _ => {
                tracing::debug!("Forwarding {} {} to transport", method, path);
                self.transport.send(&method, &path, &args).await
            }
        }
    }

    /// Routes and expects an envelope back.
    pub async fn route_envelope(
        &self,
        request: RequestDescriptor,
    ) -> Result<ResponseEnvelope, AppError> {
        self.route(request).await?.into_envelope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<(Method, String, RequestArgs)>>,
        fail: bool,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(
            &self,
            method: &Method,
            path: &str,
            args: &RequestArgs,
        ) -> Result<RoutedResponse, AppError> {
            self.calls
                .lock()
                .unwrap()
                .push((method.clone(), path.to_string(), args.clone()));
            if self.fail {
                return Err(AppError::Transport("connection refused".into()));
            }
            Ok(RoutedResponse::Envelope(ResponseEnvelope::success(
                json!({"source": "real"}),
            )))
        }
    }

    fn router(mock_enabled: bool, transport: Arc<RecordingTransport>) -> RequestRouter {
        RequestRouter::new(
            RouterConfig {
                mock_enabled,
                default_delay: Duration::from_millis(300),
            },
            transport,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_provider_served_after_default_delay() {
        let transport = Arc::new(RecordingTransport::default());
        let router = router(true, transport.clone());
        let request = RequestDescriptor::get("/user/info")
            .with_mock(MockProvider::Static(MockReply::data(json!({"name": "admin"}))));

        let start = Instant::now();
        let envelope = router.route_envelope(request).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(300));
        assert!(envelope.is_success());
        assert_eq!(envelope.data["name"], "admin");
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_computed_provider_sees_args_and_delay_override() {
        let transport = Arc::new(RecordingTransport::default());
        let router = router(true, transport.clone());
        let request = RequestDescriptor::get("/analysisReport/creditScore")
            .query("enterpriseId", "E002")
            .with_delay(Duration::from_millis(500))
            .with_mock(MockProvider::computed(|args: RequestArgs| async move {
                Ok(MockReply::data(json!({
                    "echo": args.query_param("enterpriseId")
                })))
            }));

        let start = Instant::now();
        let envelope = router.route_envelope(request).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(500));
        assert_eq!(envelope.data["echo"], "E002");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_flag_off_forwards_without_delay() {
        let transport = Arc::new(RecordingTransport::default());
        let router = router(false, transport.clone());
        let evaluated = Arc::new(AtomicUsize::new(0));
        let counter = evaluated.clone();
        let request = RequestDescriptor::get("/analysisReport/creditScore")
            .query("timeRange", "month")
            .with_mock(MockProvider::computed(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(MockReply::data(json!({"source": "mock"}))) }
            }));

        let start = Instant::now();
        let envelope = router.route_envelope(request).await.unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(envelope.data["source"], "real");
        assert_eq!(evaluated.load(Ordering::SeqCst), 0);

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "/analysisReport/creditScore");
        assert_eq!(calls[0].2.query_param("timeRange"), Some("month"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_provider_forwards_even_when_enabled() {
        let transport = Arc::new(RecordingTransport::default());
        let router = router(true, transport.clone());

        let start = Instant::now();
        let envelope = router
            .route_envelope(RequestDescriptor::get("/somewhere/else"))
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(envelope.data["source"], "real");
        assert_eq!(transport.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_fault_propagates() {
        let router = router(true, Arc::new(RecordingTransport::default()));
        let request = RequestDescriptor::post("/aiAssistant/chat").with_mock(
            MockProvider::computed(|_| async { Err(AppError::Provider("boom".into())) }),
        );

        let err = router.route(request).await.unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_becomes_non_zero_envelope() {
        let router = router(true, Arc::new(RecordingTransport::default()));
        let request = RequestDescriptor::get("/analysisReport/creditScore").with_mock(
            MockProvider::computed(|_| async {
                MockReply::from_validation(AppError::validation(
                    DomainCode::UNSUPPORTED_TIME_RANGE,
                    "bad range",
                ))
            }),
        );

        let envelope = router.route_envelope(request).await.unwrap();
        assert_eq!(envelope.code, 4002);
        assert_eq!(envelope.data, Value::Null);
        assert_eq!(envelope.message, "bad range");
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let router = router(false, transport);
        let err = router
            .route(RequestDescriptor::get("/user/info"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[test]
    fn test_from_validation_keeps_other_errors() {
        let err = MockReply::from_validation(AppError::Internal("x".into())).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
