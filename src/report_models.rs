//! Wire shapes of the six analytics datasets.
//!
//! The same types describe both the hand-authored templates and the derived
//! records: a template is simply an un-scaled instance.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ Credit score ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditLevel {
    Excellent,
    Good,
    Medium,
    Poor,
    Bad,
}

impl CreditLevel {
    pub fn label(self) -> &'static str {
        match self {
            CreditLevel::Excellent => "Excellent",
            CreditLevel::Good => "Good",
            CreditLevel::Medium => "Medium",
            CreditLevel::Poor => "Poor",
            CreditLevel::Bad => "Bad",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Sub-scores, each on a 0-200 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBreakdown {
    pub payment_history: i64,
    pub debt_burden: i64,
    pub business_stability: i64,
    pub industry_status: i64,
    pub supply_chain_health: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub date: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditScore {
    /// Composite score on a 0-1000 scale.
    pub score: i64,
    pub level: CreditLevel,
    pub level_label: String,
    pub trend: Trend,
    pub trend_value: i64,
    pub breakdown: CreditBreakdown,
    pub history: Vec<ScorePoint>,
}

// ============ Risk analysis ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Node of the risk hierarchy (rendered as a sunburst).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskNode {
    pub name: String,
    pub value: i64,
    /// Severity 1-5 in templates; derived values are capped at 4.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RiskNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_style: Option<ItemStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub total_risk_points: i64,
    pub high_risk_count: i64,
    pub medium_risk_count: i64,
    pub low_risk_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDetail {
    pub category: String,
    pub subcategory: String,
    pub level: Severity,
    pub description: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    pub risk_tree: Vec<RiskNode>,
    pub summary: RiskSummary,
    pub risk_details: Vec<RiskDetail>,
}

// ============ Cash flow ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowNode {
    pub name: String,
    /// Optional throughput, in ten-thousands of currency units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowLink {
    pub source: String,
    pub target: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    pub name: String,
    pub amount: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowSummary {
    pub total_inflow: i64,
    pub total_outflow: i64,
    pub net_cash_flow: i64,
    pub major_suppliers: Vec<Counterparty>,
    pub major_customers: Vec<Counterparty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub nodes: Vec<CashFlowNode>,
    pub links: Vec<CashFlowLink>,
    pub summary: CashFlowSummary,
}

// ============ Transactions and repayments ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPoint {
    pub date: String,
    pub count: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentPoint {
    pub date: String,
    pub on_time_count: i64,
    pub late_count: i64,
    #[serde(default)]
    pub default_count: i64,
    /// Percentage with two decimals.
    pub on_time_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub total_transactions: i64,
    pub total_transaction_amount: i64,
    pub avg_transaction_amount: f64,
    pub total_repayments: i64,
    pub on_time_repayment_rate: f64,
    /// Days.
    pub avg_repayment_delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRepaymentTrend {
    pub transaction_trend: Vec<TransactionPoint>,
    pub repayment_trend: Vec<RepaymentPoint>,
    pub summary: TrendSummary,
}

// ============ Industry benchmark ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseMetrics {
    pub name: String,
    pub credit_score: i64,
    pub revenue: i64,
    pub profit_margin: f64,
    pub debt_ratio: f64,
    pub turnover_rate: f64,
    pub supply_chain_efficiency: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryAverage {
    pub credit_score: i64,
    pub revenue: i64,
    pub profit_margin: f64,
    pub debt_ratio: f64,
    pub turnover_rate: f64,
    pub supply_chain_efficiency: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEnterprise {
    pub name: String,
    pub credit_score: i64,
    pub revenue: i64,
    pub profit_margin: f64,
    pub ranking: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionPoint {
    pub name: String,
    pub credit_score: i64,
    pub revenue: i64,
    pub is_current_enterprise: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rankings {
    pub credit_score_rank: i64,
    pub revenue_rank: i64,
    pub profit_margin_rank: i64,
    pub total_enterprises: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub rank: i64,
    /// Share of the industry ranked below this entity, one decimal.
    pub percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryBenchmark {
    pub current_enterprise: EnterpriseMetrics,
    pub industry_average: IndustryAverage,
    pub top_enterprises: Vec<TopEnterprise>,
    pub industry_distribution: Vec<DistributionPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rankings: Option<Rankings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<Ranking>,
}

// ============ Narrative analysis ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallAssessment {
    pub rating: String,
    pub rating_label: String,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightAction {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub level: String,
    pub category: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<InsightAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub id: String,
    pub level: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub affected_areas: Vec<String>,
    pub suggested_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub priority: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub expected_impact: String,
    pub implementation_difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub overall_assessment: OverallAssessment,
    pub insights: Vec<Insight>,
    pub warnings: Vec<Warning>,
    pub recommendations: Vec<Recommendation>,
}

// ============ Aggregates ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseListItem {
    pub id: String,
    pub name: String,
    pub credit_rating: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterpriseList {
    pub enterprises: Vec<EnterpriseListItem>,
    pub total: usize,
}

/// All six modules for one (entity, time range); each may be absent
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullAnalysisReport {
    pub enterprise_id: String,
    pub enterprise_name: String,
    pub report_date: chrono::DateTime<chrono::Utc>,
    pub time_range: crate::models::TimeRange,
    pub credit_score: Option<CreditScore>,
    pub risk_analysis: Option<RiskAnalysis>,
    pub cash_flow: Option<CashFlow>,
    pub transaction_repayment_trend: Option<TransactionRepaymentTrend>,
    pub industry_benchmark: Option<IndustryBenchmark>,
    pub ai_analysis: Option<AiAnalysis>,
}
