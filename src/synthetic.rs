//! Catalog of synthetic providers, one per dashboard endpoint.
//!
//! Given a method and a path (relative to the API base) the catalog returns
//! the provider and latency the router should use when mocking is enabled.

use crate::analytics::AnalyticsService;
use crate::assistant::AssistantMock;
use crate::data_management::DataManagementMock;
use crate::enterprise_dashboard::EnterpriseDashboardMock;
use crate::errors::{AppError, DomainCode};
use crate::models::{AnalysisParams, AnalyticsModule};
use crate::router::{MockProvider, MockReply, RequestArgs, RequestDescriptor};
use anyhow::Context;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const EMBEDDED_USER: &str = include_str!("../data/user.json");

pub const ANALYTICS_DELAY: Duration = Duration::from_millis(500);
pub const FULL_REPORT_DELAY: Duration = Duration::from_millis(1000);
pub const UPLOAD_DELAY: Duration = Duration::from_millis(2000);
pub const BATCH_DELETE_DELAY: Duration = Duration::from_millis(1000);
pub const CHAT_DELAY: Duration = Duration::from_millis(500);

/// A provider plus its latency; `None` means the router default.
#[derive(Debug, Clone)]
pub struct MockRoute {
    pub provider: MockProvider,
    pub delay: Option<Duration>,
}

impl MockRoute {
    fn new(provider: MockProvider, delay: Option<Duration>) -> Self {
        Self { provider, delay }
    }
}

#[derive(Clone)]
pub struct MockCatalog {
    analytics: AnalyticsService,
    data: Arc<DataManagementMock>,
    dashboard: Arc<EnterpriseDashboardMock>,
    assistant: Arc<AssistantMock>,
    user_info: Value,
}

impl MockCatalog {
    pub fn new(
        analytics: AnalyticsService,
        data: DataManagementMock,
        dashboard: EnterpriseDashboardMock,
        assistant: AssistantMock,
        user_info: Value,
    ) -> Self {
        Self {
            analytics,
            data: Arc::new(data),
            dashboard: Arc::new(dashboard),
            assistant: Arc::new(assistant),
            user_info,
        }
    }

    /// Catalog over the embedded templates and fixtures.
    pub fn builtin(upload_max_bytes: usize) -> anyhow::Result<Self> {
        let user: Value =
            serde_json::from_str(EMBEDDED_USER).context("Failed to load embedded user fixture")?;
        let user_info = user
            .get("userInfo")
            .cloned()
            .context("User fixture has no userInfo")?;

        Ok(Self::new(
            AnalyticsService::builtin()?,
            DataManagementMock::embedded(upload_max_bytes)?,
            EnterpriseDashboardMock::embedded()?,
            AssistantMock::embedded()?,
            user_info,
        ))
    }

    pub fn analytics(&self) -> &AnalyticsService {
        &self.analytics
    }

    /// Attaches the matching provider (if any) to a descriptor.
    pub fn attach(&self, request: RequestDescriptor) -> RequestDescriptor {
        match self.provider_for(&request.method, &request.path) {
            Some(route) => {
                let request = request.with_mock(route.provider);
                match route.delay {
                    Some(delay) if request.mock_delay.is_none() => request.with_delay(delay),
                    _ => request,
                }
            }
            None => request,
        }
    }

    pub fn provider_for(&self, method: &Method, path: &str) -> Option<MockRoute> {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match (method.as_str(), segments.as_slice()) {
            ("GET", ["analysisReport", "enterprises"]) => {
                let list = serde_json::to_value(self.analytics.list_entities()).ok()?;
                Some(MockRoute::new(
                    MockProvider::Static(MockReply::data(list)),
                    None,
                ))
            }
            ("GET", ["analysisReport", "fullReport"]) => {
                let analytics = self.analytics.clone();
                Some(MockRoute::new(
                    MockProvider::computed(move |args: RequestArgs| {
                        let analytics = analytics.clone();
                        async move { full_report_reply(&analytics, &args) }
                    }),
                    Some(FULL_REPORT_DELAY),
                ))
            }
            ("GET", ["analysisReport", endpoint]) => {
                let module = AnalyticsModule::from_endpoint(endpoint);
                let analytics = self.analytics.clone();
                let endpoint = endpoint.to_string();
                Some(MockRoute::new(
                    MockProvider::computed(move |args: RequestArgs| {
                        let analytics = analytics.clone();
                        let endpoint = endpoint.clone();
                        async move {
                            match module {
                                Some(module) => module_reply(&analytics, module, &args),
                                None => Ok(MockReply::rejected(
                                    DomainCode::UNKNOWN_ROUTE,
                                    format!("Unknown analysis endpoint {}", endpoint),
                                )),
                            }
                        }
                    }),
                    Some(ANALYTICS_DELAY),
                ))
            }
            ("GET", ["enterpriseDashboard", endpoint]) => self.dashboard_route(endpoint),
            ("GET", ["user", "info"]) => Some(MockRoute::new(
                MockProvider::Static(MockReply::data(self.user_info.clone())),
                None,
            )),
            ("POST", ["user", "logout"]) => Some(MockRoute::new(
                MockProvider::Static(MockReply::message(Value::Null, "Logged out")),
                None,
            )),
            ("POST", ["dataManagement", "upload"]) => {
                let data = self.data.clone();
                Some(MockRoute::new(
                    MockProvider::computed(move |args: RequestArgs| {
                        let data = data.clone();
                        async move { data.upload_reply(&args) }
                    }),
                    Some(UPLOAD_DELAY),
                ))
            }
            ("GET", ["dataManagement", "list"]) => {
                let data = self.data.clone();
                Some(MockRoute::new(
                    MockProvider::computed(move |args: RequestArgs| {
                        let data = data.clone();
                        async move { data.list_reply(&args) }
                    }),
                    None,
                ))
            }
            ("GET", ["dataManagement", "statistics"]) => {
                let data = self.data.clone();
                Some(MockRoute::new(
                    MockProvider::computed(move |_| {
                        let data = data.clone();
                        async move { data.statistics_reply() }
                    }),
                    None,
                ))
            }
            ("GET", ["dataManagement", "export"]) => {
                let data = self.data.clone();
                Some(MockRoute::new(
                    MockProvider::computed(move |args: RequestArgs| {
                        let data = data.clone();
                        async move { data.export_reply(&args) }
                    }),
                    None,
                ))
            }
            ("POST", ["dataManagement", "batchDelete"]) => {
                let data = self.data.clone();
                Some(MockRoute::new(
                    MockProvider::computed(move |args: RequestArgs| {
                        let data = data.clone();
                        async move { data.batch_delete_reply(&args) }
                    }),
                    Some(BATCH_DELETE_DELAY),
                ))
            }
            ("DELETE", ["dataManagement", id]) => {
                let data = self.data.clone();
                let id = id.to_string();
                Some(MockRoute::new(
                    MockProvider::computed(move |args: RequestArgs| {
                        let data = data.clone();
                        let id = id.clone();
                        async move { data.delete_reply(&id, &args) }
                    }),
                    Some(ANALYTICS_DELAY),
                ))
            }
            ("POST", ["aiAssistant", "chat"]) => {
                let assistant = self.assistant.clone();
                Some(MockRoute::new(
                    MockProvider::computed(move |args: RequestArgs| {
                        let assistant = assistant.clone();
                        async move { assistant.chat_reply(&args) }
                    }),
                    Some(CHAT_DELAY),
                ))
            }
            _ => None,
        }
    }

    /// `/enterpriseDashboard/{endpoint}`; fixture-backed, router default latency.
    fn dashboard_route(&self, endpoint: &str) -> Option<MockRoute> {
        let dashboard = self.dashboard.clone();
        let provider = match endpoint {
            "enterprises" => MockProvider::Static(dashboard.enterprises_reply().ok()?),
            "ranking" => MockProvider::computed(move |_| {
                let dashboard = dashboard.clone();
                async move { dashboard.ranking_reply() }
            }),
            "basicInfo" => MockProvider::computed(move |args: RequestArgs| {
                let dashboard = dashboard.clone();
                async move { dashboard.basic_info_reply(&args) }
            }),
            "financialHealth" => MockProvider::computed(move |args: RequestArgs| {
                let dashboard = dashboard.clone();
                async move { dashboard.financial_health_reply(&args) }
            }),
            "transactionTrend" => MockProvider::computed(move |args: RequestArgs| {
                let dashboard = dashboard.clone();
                async move { dashboard.transaction_trend_reply(&args) }
            }),
            "orderStatistics" => MockProvider::computed(move |args: RequestArgs| {
                let dashboard = dashboard.clone();
                async move { dashboard.order_statistics_reply(&args) }
            }),
            "partners" => MockProvider::computed(move |args: RequestArgs| {
                let dashboard = dashboard.clone();
                async move { dashboard.partners_reply(&args) }
            }),
            _ => return None,
        };
        Some(MockRoute::new(provider, None))
    }
}

fn module_reply(
    analytics: &AnalyticsService,
    module: AnalyticsModule,
    args: &RequestArgs,
) -> Result<MockReply, AppError> {
    let params = match AnalysisParams::from_query(&args.query) {
        Ok(params) => params,
        Err(e) => return MockReply::from_validation(e),
    };
    Ok(MockReply::data(analytics.derive(module, &params)?))
}

fn full_report_reply(
    analytics: &AnalyticsService,
    args: &RequestArgs,
) -> Result<MockReply, AppError> {
    let params = match AnalysisParams::from_query(&args.query) {
        Ok(params) => params,
        Err(e) => return MockReply::from_validation(e),
    };
    let report = analytics.full_report(&params);
    Ok(MockReply::data(serde_json::to_value(report)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RoutedResponse;

    fn catalog() -> MockCatalog {
        MockCatalog::builtin(5 * 1024 * 1024).unwrap()
    }

    async fn evaluate(route: MockRoute, args: RequestArgs) -> Result<MockReply, AppError> {
        match route.provider {
            MockProvider::Static(reply) => Ok(reply),
            MockProvider::Computed(f) => f(args).await,
        }
    }

    fn query(pairs: &[(&str, &str)]) -> RequestArgs {
        RequestArgs {
            query: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: None,
        }
    }

    #[test]
    fn test_route_table_delays() {
        let c = catalog();
        let delay = |m: Method, p: &str| c.provider_for(&m, p).map(|r| r.delay);

        assert_eq!(delay(Method::GET, "/analysisReport/enterprises"), Some(None));
        assert_eq!(
            delay(Method::GET, "/analysisReport/creditScore"),
            Some(Some(ANALYTICS_DELAY))
        );
        assert_eq!(
            delay(Method::GET, "analysisReport/fullReport"),
            Some(Some(FULL_REPORT_DELAY))
        );
        assert_eq!(
            delay(Method::POST, "/dataManagement/upload"),
            Some(Some(UPLOAD_DELAY))
        );
        assert_eq!(
            delay(Method::POST, "/aiAssistant/chat"),
            Some(Some(CHAT_DELAY))
        );
        assert!(c.provider_for(&Method::POST, "/analysisReport/creditScore").is_none());
        assert_eq!(delay(Method::GET, "/enterpriseDashboard/basicInfo"), Some(None));
        assert!(c.provider_for(&Method::GET, "/enterpriseDashboard/unknown").is_none());
        assert!(c.provider_for(&Method::POST, "/enterpriseDashboard/partners").is_none());
    }

    #[tokio::test]
    async fn test_module_provider_validates_query() {
        let c = catalog();
        let route = c
            .provider_for(&Method::GET, "/analysisReport/creditScore")
            .unwrap();
        let reply = evaluate(route, query(&[("enterpriseId", "E003")])).await.unwrap();
        assert!(matches!(
            reply,
            MockReply::Rejected { code: DomainCode::MISSING_IDENTIFIER, .. }
        ));

        let route = c
            .provider_for(&Method::GET, "/analysisReport/riskAnalysis")
            .unwrap();
        let reply = evaluate(
            route,
            query(&[("enterpriseId", "E003"), ("timeRange", "week")]),
        )
        .await
        .unwrap();
        assert!(matches!(
            reply,
            MockReply::Rejected { code: DomainCode::UNSUPPORTED_TIME_RANGE, .. }
        ));
    }

    #[tokio::test]
    async fn test_module_provider_derives_data() {
        let c = catalog();
        let route = c
            .provider_for(&Method::GET, "/analysisReport/creditScore")
            .unwrap();
        let reply = evaluate(
            route,
            query(&[("entityId", "E003"), ("timeRange", "month")]),
        )
        .await
        .unwrap();
        let MockReply::Data { data, .. } = reply else {
            panic!("expected data");
        };
        assert_eq!(data["score"], 648);
        assert_eq!(data["level"], "poor");
    }

    #[tokio::test]
    async fn test_unknown_entity_yields_null_data() {
        let c = catalog();
        let route = c
            .provider_for(&Method::GET, "/analysisReport/fullReport")
            .unwrap();
        let reply = evaluate(
            route,
            query(&[("enterpriseId", "E777"), ("timeRange", "year")]),
        )
        .await
        .unwrap();
        let RoutedResponse::Envelope(envelope) = RoutedResponse::from(reply) else {
            panic!("expected envelope");
        };
        assert_eq!(envelope.code, 0);
        assert_eq!(envelope.data, Value::Null);
    }

    #[tokio::test]
    async fn test_enterprise_dashboard_providers() {
        let c = catalog();
        let route = c
            .provider_for(&Method::GET, "/enterpriseDashboard/partners")
            .unwrap();
        let reply = evaluate(route, query(&[("enterpriseId", "E002")])).await.unwrap();
        let MockReply::Data { data, .. } = reply else {
            panic!("expected data");
        };
        assert_eq!(data["enterpriseId"], "E002");
        assert_eq!(data["total"], 4);

        let route = c
            .provider_for(&Method::GET, "/enterpriseDashboard/basicInfo")
            .unwrap();
        let reply = evaluate(route, RequestArgs::default()).await.unwrap();
        assert!(matches!(
            reply,
            MockReply::Rejected { code: DomainCode::MISSING_ENTERPRISE_ID, .. }
        ));

        let route = c
            .provider_for(&Method::GET, "/enterpriseDashboard/transactionTrend")
            .unwrap();
        let reply = evaluate(route, query(&[("enterpriseId", "E777")])).await.unwrap();
        assert!(matches!(
            reply,
            MockReply::Rejected { code: DomainCode::UNKNOWN_ENTERPRISE, .. }
        ));

        let route = c
            .provider_for(&Method::GET, "/enterpriseDashboard/financialHealth")
            .unwrap();
        let reply = evaluate(
            route,
            query(&[("enterpriseId", "E001"), ("timeRange", "week")]),
        )
        .await
        .unwrap();
        assert!(matches!(
            reply,
            MockReply::Rejected { code: DomainCode::INVALID_TIME_RANGE, .. }
        ));

        let route = c
            .provider_for(&Method::GET, "/enterpriseDashboard/enterprises")
            .unwrap();
        let MockReply::Data { data, .. } = evaluate(route, RequestArgs::default()).await.unwrap()
        else {
            panic!("expected data");
        };
        assert_eq!(data["total"], 3);
    }

    #[tokio::test]
    async fn test_unknown_analysis_endpoint() {
        let c = catalog();
        let route = c
            .provider_for(&Method::GET, "/analysisReport/liquidity")
            .unwrap();
        let reply = evaluate(route, RequestArgs::default()).await.unwrap();
        assert!(matches!(
            reply,
            MockReply::Rejected { code: DomainCode::UNKNOWN_ROUTE, .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_route_captures_id() {
        let c = catalog();
        let route = c
            .provider_for(&Method::DELETE, "/dataManagement/LN2024003")
            .unwrap();
        let reply = evaluate(route, query(&[("type", "loan")])).await.unwrap();
        assert_eq!(
            reply,
            MockReply::message(Value::Null, "Data item LN2024003 deleted")
        );
    }

    #[test]
    fn test_attach_keeps_explicit_delay() {
        let c = catalog();
        let request = c.attach(
            RequestDescriptor::get("/analysisReport/benchmark").with_delay(Duration::from_millis(5)),
        );
        assert!(request.mock.is_some());
        assert_eq!(request.mock_delay, Some(Duration::from_millis(5)));

        let request = c.attach(RequestDescriptor::get("/analysisReport/benchmark"));
        assert_eq!(request.mock_delay, Some(ANALYTICS_DELAY));

        let request = c.attach(RequestDescriptor::get("/not/mocked"));
        assert!(request.mock.is_none());
    }
}
