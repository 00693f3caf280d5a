use crate::client::DashboardClient;
use crate::config::Config;
use crate::errors::{AppError, DomainCode, ResultExt};
use crate::router::{RequestBody, RequestDescriptor, RoutedResponse, UploadedFile};
use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Extra room on top of the upload limit for multipart framing.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Router plus synthetic catalog.
    pub client: DashboardClient,
    pub config: Config,
}

/// Builds the gateway with its middleware stack.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.upload_max_bytes + BODY_LIMIT_SLACK;
    Router::new()
        .route("/health", get(health))
        .route("/api/*path", any(gateway))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint.
///
/// Reports whether the synthetic path is active and where real calls go.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "scf-mock-gateway",
            "version": env!("CARGO_PKG_VERSION"),
            "mockEnabled": state.client.router().config().mock_enabled,
            "apiBaseUrl": state.config.api_base_url,
        })),
    )
}

/// ANY /api/*path
///
/// Turns the inbound request into a descriptor, routes it through the mock
/// catalog or the real backend, and renders the result.
pub async fn gateway(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path(path): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
    request: Request,
) -> Result<Response, AppError> {
    tracing::info!("{} /api/{} - query: {:?}", method, path, query);

    let body = read_body(request, &state).await?;
    let mut descriptor = RequestDescriptor::new(method.clone(), format!("/{}", path)).queries(query);
    descriptor.args.body = body;

    let routed = state
        .client
        .request(descriptor)
        .await
        .with_context(|| format!("{} /api/{}", method, path))?;
    render(routed)
}

async fn read_body(request: Request, state: &Arc<AppState>) -> Result<Option<RequestBody>, AppError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AppError::validation(DomainCode::MALFORMED_REQUEST, e.body_text()))?;
        return Ok(read_file_part(multipart).await?.map(RequestBody::File));
    }

    let bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| AppError::validation(DomainCode::MALFORMED_REQUEST, e.to_string()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value = serde_json::from_slice(&bytes).map_err(|e| {
        AppError::validation(
            DomainCode::MALFORMED_REQUEST,
            format!("Request body is not valid JSON: {}", e),
        )
    })?;
    Ok(Some(RequestBody::Json(value)))
}

/// Reads the `file` part; other parts are skipped.
async fn read_file_part(mut multipart: Multipart) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(DomainCode::MALFORMED_REQUEST, e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(DomainCode::MALFORMED_REQUEST, e.body_text()))?;
        tracing::debug!("Received upload {} ({} bytes)", file_name, bytes.len());
        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

fn render(routed: RoutedResponse) -> Result<Response, AppError> {
    match routed {
        RoutedResponse::Envelope(envelope) => Ok((StatusCode::OK, Json(envelope)).into_response()),
        RoutedResponse::File(file) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, file.content_type)
            .header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            )
            .body(Body::from(file.bytes))
            .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{RequestArgs, RequestRouter, RouterConfig};
    use crate::synthetic::MockCatalog;
    use crate::transport::Transport;
    use async_trait::async_trait;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn send(
            &self,
            _method: &reqwest::Method,
            _path: &str,
            _args: &RequestArgs,
        ) -> Result<RoutedResponse, AppError> {
            Err(AppError::Transport("backend offline".to_string()))
        }
    }

    fn app(mock_enabled: bool) -> Router {
        let config = Config {
            mock_enabled,
            ..Config::default()
        };
        let router = RequestRouter::new(
            RouterConfig {
                mock_enabled,
                default_delay: Duration::from_millis(300),
            },
            Arc::new(Offline),
        );
        let client = DashboardClient::new(
            router,
            MockCatalog::builtin(config.upload_max_bytes).unwrap(),
        );
        build_router(Arc::new(AppState { client, config }))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(true).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["mockEnabled"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_analytics_envelope() {
        let response = app(true)
            .oneshot(get(
                "/api/analysisReport/creditScore?enterpriseId=E003&timeRange=month",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["score"], 648);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_rejection_is_an_envelope() {
        let response = app(true)
            .oneshot(get(
                "/api/analysisReport/creditScore?enterpriseId=E003&timeRange=decade",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["code"], 4002);
        assert!(body["data"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_json_body() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/aiAssistant/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"message": "any overdue warnings?"}"#))
            .unwrap();
        let response = app(true).oneshot(request).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["stages"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/aiAssistant/chat")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], 4000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multipart_upload() {
        let boundary = "scfboundary";
        let payload = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"q3.xlsx\"\r\n\
             Content-Type: application/vnd.openxmlformats-officedocument.spreadsheetml.sheet\r\n\r\n\
             PK-sheet-bytes\r\n--{b}--\r\n",
            b = boundary
        );
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/dataManagement/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(payload))
            .unwrap();
        let response = app(true).oneshot(request).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["fileName"], "q3.xlsx");
        assert_eq!(body["data"]["fileSize"], 14);
        assert_eq!(body["data"]["totalCount"], 156);
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_download_headers() {
        let response = app(true)
            .oneshot(get("/api/dataManagement/export?type=enterprise"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"enterprise-"));
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_when_mock_disabled() {
        let response = app(false)
            .oneshot(get("/api/user/info"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["code"], 5000);
    }
}
