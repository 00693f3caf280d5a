use crate::errors::{AppError, DomainCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============ Envelope ============

/// Uniform wrapper returned for every routed request, mock or real.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T = Value> {
    /// `0` on success, a non-zero domain code otherwise.
    pub code: i32,
    /// Module-specific payload, `null` on failure or resolution miss.
    pub data: T,
    /// Human-readable status message.
    pub message: String,
}

impl ResponseEnvelope<Value> {
    pub fn success(data: Value) -> Self {
        Self::with_message(data, "success")
    }

    pub fn with_message(data: Value, message: impl Into<String>) -> Self {
        Self {
            code: DomainCode::SUCCESS.0,
            data,
            message: message.into(),
        }
    }

    pub fn rejected(code: DomainCode, message: impl Into<String>) -> Self {
        Self {
            code: code.0,
            data: Value::Null,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == DomainCode::SUCCESS.0
    }

    /// Decodes the payload into a typed value.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, AppError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

// ============ Time range ============

/// Closed time-range vocabulary accepted by every analytics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Month,
    Quarter,
    Year,
    All,
}

impl TimeRange {
    pub const ALL_RANGES: [TimeRange; 4] = [
        TimeRange::Month,
        TimeRange::Quarter,
        TimeRange::Year,
        TimeRange::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Month => "month",
            TimeRange::Quarter => "quarter",
            TimeRange::Year => "year",
            TimeRange::All => "all",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(TimeRange::Month),
            "quarter" => Ok(TimeRange::Quarter),
            "year" => Ok(TimeRange::Year),
            "all" => Ok(TimeRange::All),
            other => Err(AppError::validation(
                DomainCode::UNSUPPORTED_TIME_RANGE,
                format!(
                    "Unsupported timeRange '{}', expected one of month, quarter, year, all",
                    other
                ),
            )),
        }
    }
}

// ============ Analytics modules ============

/// The six analytics datasets derived per (entity, time range).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsModule {
    CreditScore,
    RiskAnalysis,
    CashFlow,
    TransactionTrend,
    Benchmark,
    AiAnalysis,
}

impl AnalyticsModule {
    pub const ALL: [AnalyticsModule; 6] = [
        AnalyticsModule::CreditScore,
        AnalyticsModule::RiskAnalysis,
        AnalyticsModule::CashFlow,
        AnalyticsModule::TransactionTrend,
        AnalyticsModule::Benchmark,
        AnalyticsModule::AiAnalysis,
    ];

    /// Last path segment under `/analysisReport/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            AnalyticsModule::CreditScore => "creditScore",
            AnalyticsModule::RiskAnalysis => "riskAnalysis",
            AnalyticsModule::CashFlow => "cashFlow",
            AnalyticsModule::TransactionTrend => "transactionTrend",
            AnalyticsModule::Benchmark => "benchmark",
            AnalyticsModule::AiAnalysis => "aiAnalysis",
        }
    }

    pub fn from_endpoint(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.endpoint() == segment)
    }
}

impl fmt::Display for AnalyticsModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Validated query parameters of an analytics request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParams {
    pub enterprise_id: String,
    pub time_range: TimeRange,
}

impl AnalysisParams {
    pub fn new(enterprise_id: impl Into<String>, time_range: TimeRange) -> Self {
        Self {
            enterprise_id: enterprise_id.into(),
            time_range,
        }
    }

    /// Extracts and validates `enterpriseId` (alias `entityId`) and `timeRange`.
    pub fn from_query(query: &BTreeMap<String, String>) -> Result<Self, AppError> {
        let enterprise_id = query
            .get("enterpriseId")
            .or_else(|| query.get("entityId"))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::validation(
                    DomainCode::MISSING_IDENTIFIER,
                    "enterpriseId is required",
                )
            })?;

        let time_range = query
            .get("timeRange")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::validation(DomainCode::MISSING_IDENTIFIER, "timeRange is required")
            })?
            .parse()?;

        Ok(Self {
            enterprise_id: enterprise_id.to_string(),
            time_range,
        })
    }

    pub fn to_query(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("enterpriseId".to_string(), self.enterprise_id.clone()),
            ("timeRange".to_string(), self.time_range.as_str().to_string()),
        ])
    }
}

// ============ Chat ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Thinking,
    Analyzing,
    Planning,
    Executing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Processing,
    Done,
}

/// One reasoning step of an assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StageKind,
    pub title: String,
    pub content: String,
    pub status: StageStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<Stage>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message_id: String,
    pub content: String,
    pub stages: Vec<Stage>,
}

// ============ Data management ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Transaction,
    Loan,
    Enterprise,
    Financial,
}

impl DataType {
    pub const ALL: [DataType; 4] = [
        DataType::Transaction,
        DataType::Loan,
        DataType::Enterprise,
        DataType::Financial,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Transaction => "transaction",
            DataType::Loan => "loan",
            DataType::Enterprise => "enterprise",
            DataType::Financial => "financial",
        }
    }
}

impl FromStr for DataType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                AppError::validation(
                    DomainCode::UNKNOWN_DATA_TYPE,
                    format!("Data type '{}' does not exist", s),
                )
            })
    }
}

/// Result of parsing an uploaded spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadManifest {
    pub file_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub upload_time: DateTime<Utc>,
    pub data_types: Vec<DataType>,
    pub total_count: u64,
    pub type_counts: BTreeMap<DataType, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTableColumn {
    pub key: String,
    pub title: String,
    pub data_index: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorter: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataListPage {
    pub list: Vec<serde_json::Map<String, Value>>,
    pub total: usize,
    pub columns: Vec<DataTableColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStatistics {
    pub transaction_count: u64,
    pub loan_count: u64,
    pub enterprise_count: u64,
    pub financial_count: u64,
    pub total_count: u64,
    pub recent_upload_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_upload_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_rejects_unknown_values() {
        assert_eq!("quarter".parse::<TimeRange>().unwrap(), TimeRange::Quarter);

        let err = "week".parse::<TimeRange>().unwrap_err();
        assert_eq!(err.code(), DomainCode::UNSUPPORTED_TIME_RANGE);

        // Case matters: the vocabulary is closed and lowercase.
        assert!("Month".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_analysis_params_validation() {
        let mut query = BTreeMap::new();
        query.insert("timeRange".to_string(), "month".to_string());
        let err = AnalysisParams::from_query(&query).unwrap_err();
        assert_eq!(err.code(), DomainCode::MISSING_IDENTIFIER);

        query.insert("entityId".to_string(), "E002".to_string());
        let params = AnalysisParams::from_query(&query).unwrap();
        assert_eq!(params, AnalysisParams::new("E002", TimeRange::Month));

        query.insert("timeRange".to_string(), "decade".to_string());
        let err = AnalysisParams::from_query(&query).unwrap_err();
        assert_eq!(err.code(), DomainCode::UNSUPPORTED_TIME_RANGE);
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = ResponseEnvelope::rejected(DomainCode::MISSING_FILE, "no file");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"code": 1001, "data": null, "message": "no file"})
        );
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_stage_kind_serializes_as_type() {
        let stage = Stage {
            id: "stage-1".into(),
            kind: StageKind::Analyzing,
            title: "Analyzing".into(),
            content: "Looking at cash flow".into(),
            status: StageStatus::Done,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&stage).unwrap();
        assert_eq!(value["type"], "analyzing");
        assert_eq!(value["status"], "done");
        assert!(value.get("createdAt").is_some());
    }
}
