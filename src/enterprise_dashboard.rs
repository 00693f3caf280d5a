//! Synthetic enterprise-dashboard endpoints: enterprise selector, basic
//! info, financial health, transaction trend, order statistics, partners
//! and the cross-enterprise ranking board.
//!
//! Unlike the analysis report these records are stored per enterprise in a
//! fixture and served as-is. An enterprise without a fixture entry is a
//! rejection (1002), not a `null` payload.

use crate::errors::{AppError, DomainCode};
use crate::models::TimeRange;
use crate::report_models::Trend;
use crate::router::{MockReply, RequestArgs};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EMBEDDED_FIXTURES: &str = include_str!("../data/enterprise_dashboard.json");

// ============ Models ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEnterprise {
    pub id: String,
    pub name: String,
    pub credit_rating: String,
    pub industry: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardEnterpriseList {
    pub enterprises: Vec<DashboardEnterprise>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainRole {
    Core,
    Supplier,
    Distributor,
    Logistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub id: String,
    pub enterprise_name: String,
    pub credit_code: String,
    pub legal_person: String,
    /// In units of 10,000 CNY.
    pub registered_capital: i64,
    pub industry: String,
    pub industry_label: String,
    pub credit_rating: String,
    pub register_date: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub contact_address: String,
    pub chain_role: ChainRole,
    pub chain_role_label: String,
    pub established_years: i64,
    pub employee_count: String,
    pub business_status: String,
    pub main_business: String,
}

/// Ratios are percentages on a 0-100 scale unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialHealthMetrics {
    pub asset_liability_ratio: f64,
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub net_profit_margin: f64,
    pub roe: f64,
    pub roa: f64,
    pub receivable_turnover: f64,
    pub inventory_turnover: f64,
    pub revenue_growth_rate: f64,
    pub profit_growth_rate: f64,
    pub overdue_rate: f64,
    pub default_rate: f64,
    /// Days.
    pub cash_conversion_cycle: i64,
    pub supply_chain_finance_ratio: f64,
    pub credit_utilization_rate: f64,
    pub comprehensive_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialHealth {
    pub enterprise_id: String,
    pub time_range: TimeRange,
    pub metrics: FinancialHealthMetrics,
    pub update_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountPoint {
    pub date: String,
    pub amount: i64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTrend {
    pub timeline: Vec<AmountPoint>,
    pub total_amount: i64,
    pub total_count: i64,
    pub avg_amount: f64,
    pub max_amount: i64,
    pub max_amount_date: String,
    pub min_amount: i64,
    pub min_amount_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCategory {
    pub category: String,
    pub count: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCountPoint {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatistics {
    pub by_type: Vec<OrderCategory>,
    pub timeline: Vec<OrderCountPoint>,
    pub total_count: i64,
    pub total_amount: i64,
}

/// A per-range record wrapped with the request it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangedRecord<T> {
    pub enterprise_id: String,
    pub time_range: TimeRange,
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerType {
    Supplier,
    Customer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: String,
    pub partner_name: String,
    pub partner_type: PartnerType,
    pub partner_type_label: String,
    pub cooperation_years: i64,
    pub transaction_amount: i64,
    pub transaction_count: i64,
    pub credit_rating: String,
    pub last_transaction_date: String,
    pub status: PartnerStatus,
    pub status_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerList {
    pub enterprise_id: String,
    pub partners: Vec<Partner>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: i64,
    pub enterprise_id: String,
    pub enterprise_name: String,
    pub comprehensive_score: i64,
    pub credit_rating: String,
    pub transaction_amount: i64,
    pub trend: Trend,
    /// Places moved since the previous ranking.
    pub trend_value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingBoard {
    pub rankings: Vec<RankingEntry>,
    pub update_time: DateTime<Utc>,
}

// ============ Fixture store ============

type PerRange<T> = BTreeMap<TimeRange, T>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFixtures {
    enterprise_list: Vec<DashboardEnterprise>,
    enterprise_basic_info: BTreeMap<String, BasicInfo>,
    financial_health: BTreeMap<String, PerRange<FinancialHealthMetrics>>,
    transaction_trend: BTreeMap<String, PerRange<DashboardTrend>>,
    order_statistics: BTreeMap<String, PerRange<OrderStatistics>>,
    partners: BTreeMap<String, Vec<Partner>>,
    enterprise_ranking: Vec<RankingEntry>,
}

#[derive(Debug, Clone)]
pub struct EnterpriseDashboardMock {
    fixtures: RawFixtures,
}

impl EnterpriseDashboardMock {
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_json(EMBEDDED_FIXTURES).context("Failed to load embedded enterprise dashboard fixtures")
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let fixtures: RawFixtures = serde_json::from_str(json)?;
        for enterprise in &fixtures.enterprise_list {
            if !fixtures.enterprise_basic_info.contains_key(&enterprise.id) {
                anyhow::bail!("Listed enterprise {} has no basic info", enterprise.id);
            }
        }
        Ok(Self { fixtures })
    }

    pub fn enterprises(&self) -> DashboardEnterpriseList {
        DashboardEnterpriseList {
            enterprises: self.fixtures.enterprise_list.clone(),
            total: self.fixtures.enterprise_list.len(),
        }
    }

    pub fn basic_info(&self, args: &RequestArgs) -> Result<BasicInfo, AppError> {
        let id = enterprise_id(args)?;
        self.fixtures
            .enterprise_basic_info
            .get(id)
            .cloned()
            .ok_or_else(|| unknown_enterprise(id, "basic info"))
    }

    pub fn financial_health(
        &self,
        args: &RequestArgs,
        now: DateTime<Utc>,
    ) -> Result<FinancialHealth, AppError> {
        let record = ranged(&self.fixtures.financial_health, args, "financial data")?;
        Ok(FinancialHealth {
            enterprise_id: record.enterprise_id,
            time_range: record.time_range,
            metrics: record.data,
            update_time: now,
        })
    }

    pub fn transaction_trend(
        &self,
        args: &RequestArgs,
    ) -> Result<RangedRecord<DashboardTrend>, AppError> {
        ranged(&self.fixtures.transaction_trend, args, "transaction data")
    }

    pub fn order_statistics(
        &self,
        args: &RequestArgs,
    ) -> Result<RangedRecord<OrderStatistics>, AppError> {
        ranged(&self.fixtures.order_statistics, args, "order data")
    }

    pub fn partners(&self, args: &RequestArgs) -> Result<PartnerList, AppError> {
        let id = enterprise_id(args)?;
        let partners = self
            .fixtures
            .partners
            .get(id)
            .cloned()
            .ok_or_else(|| unknown_enterprise(id, "partner data"))?;
        Ok(PartnerList {
            enterprise_id: id.to_string(),
            total: partners.len(),
            partners,
        })
    }

    pub fn ranking(&self, now: DateTime<Utc>) -> RankingBoard {
        RankingBoard {
            rankings: self.fixtures.enterprise_ranking.clone(),
            update_time: now,
        }
    }

    // ============ Provider adapters ============

    pub fn enterprises_reply(&self) -> Result<MockReply, AppError> {
        Ok(MockReply::data(serde_json::to_value(self.enterprises())?))
    }

    pub fn basic_info_reply(&self, args: &RequestArgs) -> Result<MockReply, AppError> {
        reply(self.basic_info(args))
    }

    pub fn financial_health_reply(&self, args: &RequestArgs) -> Result<MockReply, AppError> {
        reply(self.financial_health(args, Utc::now()))
    }

    pub fn transaction_trend_reply(&self, args: &RequestArgs) -> Result<MockReply, AppError> {
        reply(self.transaction_trend(args))
    }

    pub fn order_statistics_reply(&self, args: &RequestArgs) -> Result<MockReply, AppError> {
        reply(self.order_statistics(args))
    }

    pub fn partners_reply(&self, args: &RequestArgs) -> Result<MockReply, AppError> {
        reply(self.partners(args))
    }

    pub fn ranking_reply(&self) -> Result<MockReply, AppError> {
        Ok(MockReply::data(serde_json::to_value(self.ranking(Utc::now()))?))
    }
}

fn reply<T: Serialize>(result: Result<T, AppError>) -> Result<MockReply, AppError> {
    match result {
        Ok(record) => Ok(MockReply::data(serde_json::to_value(record)?)),
        Err(e) => MockReply::from_validation(e),
    }
}

fn enterprise_id(args: &RequestArgs) -> Result<&str, AppError> {
    args.query_param("enterpriseId")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            AppError::validation(DomainCode::MISSING_ENTERPRISE_ID, "enterpriseId is required")
        })
}

fn unknown_enterprise(id: &str, what: &str) -> AppError {
    AppError::validation(
        DomainCode::UNKNOWN_ENTERPRISE,
        format!("No {} for enterprise {}", what, id),
    )
}

/// Looks up one enterprise's record for the requested range. A missing
/// `timeRange` means `month`; the enterprise is checked before the range.
fn ranged<T: Clone>(
    table: &BTreeMap<String, PerRange<T>>,
    args: &RequestArgs,
    what: &str,
) -> Result<RangedRecord<T>, AppError> {
    let id = enterprise_id(args)?;
    let per_range = table.get(id).ok_or_else(|| unknown_enterprise(id, what))?;

    let raw_range = args
        .query_param("timeRange")
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("month");
    let invalid_range = || {
        AppError::validation(
            DomainCode::INVALID_TIME_RANGE,
            format!("Invalid timeRange '{}'", raw_range),
        )
    };
    let time_range: TimeRange = raw_range.parse().map_err(|_| invalid_range())?;
    let data = per_range.get(&time_range).cloned().ok_or_else(invalid_range)?;

    Ok(RangedRecord {
        enterprise_id: id.to_string(),
        time_range,
        data,
    })
}
