use crate::chat::ChatBackend;
use crate::errors::{AppError, DomainCode};
use crate::models::{
    AnalysisParams, AnalyticsModule, ChatReply, ChatRequest, DataType, ResponseEnvelope,
    UploadManifest,
};
use crate::report_models::{EnterpriseList, FullAnalysisReport};
use crate::router::{FileDownload, RequestDescriptor, RequestRouter, RoutedResponse, UploadedFile};
use crate::synthetic::MockCatalog;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Typed dashboard API on top of the request router.
///
/// Every call is attached to its synthetic provider before routing, so the
/// router alone decides between the mock path and the real backend.
#[derive(Clone)]
pub struct DashboardClient {
    router: RequestRouter,
    catalog: MockCatalog,
}

impl DashboardClient {
    pub fn new(router: RequestRouter, catalog: MockCatalog) -> Self {
        Self { router, catalog }
    }

    pub fn router(&self) -> &RequestRouter {
        &self.router
    }

    pub fn catalog(&self) -> &MockCatalog {
        &self.catalog
    }

    pub async fn request(&self, request: RequestDescriptor) -> Result<RoutedResponse, AppError> {
        self.router.route(self.catalog.attach(request)).await
    }

    pub async fn envelope(&self, request: RequestDescriptor) -> Result<ResponseEnvelope, AppError> {
        self.request(request).await?.into_envelope()
    }

    /// Non-zero codes become validation errors; `null` data becomes `None`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<Option<T>, AppError> {
        let envelope = self.envelope(request).await?;
        if !envelope.is_success() {
            return Err(AppError::validation(
                DomainCode(envelope.code),
                envelope.message,
            ));
        }
        if envelope.data.is_null() {
            return Ok(None);
        }
        envelope.decode().map(Some)
    }

    pub async fn list_enterprises(&self) -> Result<EnterpriseList, AppError> {
        self.fetch(RequestDescriptor::get("/analysisReport/enterprises"))
            .await?
            .ok_or_else(|| AppError::Provider("Enterprise list was empty".to_string()))
    }

    /// One analytics module. `None` is a resolution miss, not an error.
    pub async fn analysis<T: DeserializeOwned>(
        &self,
        module: AnalyticsModule,
        params: &AnalysisParams,
    ) -> Result<Option<T>, AppError> {
        let path = format!("/analysisReport/{}", module.endpoint());
        self.fetch(RequestDescriptor::get(path).queries(params.to_query()))
            .await
    }

    pub async fn full_report(
        &self,
        params: &AnalysisParams,
    ) -> Result<Option<FullAnalysisReport>, AppError> {
        self.fetch(RequestDescriptor::get("/analysisReport/fullReport").queries(params.to_query()))
            .await
    }

    pub async fn upload(&self, file: UploadedFile) -> Result<UploadManifest, AppError> {
        self.fetch(RequestDescriptor::post("/dataManagement/upload").file(file))
            .await?
            .ok_or_else(|| AppError::Provider("Upload returned no manifest".to_string()))
    }

    pub async fn export(&self, data_type: DataType) -> Result<FileDownload, AppError> {
        let request =
            RequestDescriptor::get("/dataManagement/export").query("type", data_type.as_str());
        match self.request(request).await? {
            RoutedResponse::File(file) => Ok(file),
            RoutedResponse::Envelope(envelope) if !envelope.is_success() => Err(
                AppError::validation(DomainCode(envelope.code), envelope.message),
            ),
            RoutedResponse::Envelope(_) => Err(AppError::Internal(
                "Export returned an envelope instead of a file".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ChatBackend for DashboardClient {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, AppError> {
        let body: Value = serde_json::to_value(&request)?;
        self.fetch(RequestDescriptor::post("/aiAssistant/chat").json(body))
            .await?
            .ok_or_else(|| AppError::Provider("Chat reply was empty".to_string()))
    }
}
