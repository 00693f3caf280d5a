use crate::errors::AppError;
use crate::models::ResponseEnvelope;
use crate::router::{FileDownload, RequestArgs, RequestBody, RoutedResponse};
use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Method;
use std::time::Duration;
use url::Url;

/// The real backend the router forwards to when the mock path is not taken.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: &Method,
        path: &str,
        args: &RequestArgs,
    ) -> Result<RoutedResponse, AppError>;
}

/// Client for the dashboard's real HTTP API.
///
/// JSON responses are decoded as envelopes; any other content type is
/// treated as a file download.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Creates a new `HttpTransport`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base address every request path is joined onto.
    /// * `timeout` - Whole-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        // A trailing slash makes `join` append instead of replacing the last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::Internal(format!("Invalid API base URL {}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::Internal(format!("Invalid request path {}: {}", path, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: &Method,
        path: &str,
        args: &RequestArgs,
    ) -> Result<RoutedResponse, AppError> {
        let url = self.url_for(path)?;
        tracing::info!("Forwarding {} {} to {}", method, path, url);

        let mut request = self.client.request(method.clone(), url);
        if !args.query.is_empty() {
            request = request.query(&args.query);
        }
        match &args.body {
            Some(RequestBody::Json(body)) => request = request.json(body),
            Some(RequestBody::File(file)) => {
                let mut part = reqwest::multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone());
                if let Some(content_type) = &file.content_type {
                    part = part.mime_str(content_type).map_err(|e| {
                        AppError::Internal(format!("Invalid content type {}: {}", content_type, e))
                    })?;
                }
                request = request.multipart(reqwest::multipart::Form::new().part("file", part));
            }
            None => {}
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("{} {} failed: {}", method, path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("{} {} returned {}: {}", method, path, status, error_text);
            return Err(AppError::Transport(format!(
                "{} {} returned {}: {}",
                method, path, status, error_text
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("json") {
            let envelope: ResponseEnvelope = response.json().await.map_err(|e| {
                AppError::Transport(format!("Failed to parse {} response: {}", path, e))
            })?;
            return Ok(RoutedResponse::Envelope(envelope));
        }

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| "download".to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to read {} body: {}", path, e)))?;

        tracing::debug!("Received {} byte download {}", bytes.len(), file_name);
        Ok(RoutedResponse::File(FileDownload {
            file_name,
            content_type: if content_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                content_type
            },
            bytes: bytes.to_vec(),
        }))
    }
}

/// Extracts `filename` from a `Content-Disposition` header value.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|param| {
        let value = param.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}
