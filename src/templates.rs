//! Template Store: the canonical, hand-authored analytics datasets.
//!
//! Loaded once at startup and shared read-only afterwards. Templates are
//! keyed by (entity id, time range); the reference entity must cover every
//! time range of every module because it is the universal fallback.

use crate::models::{AnalyticsModule, TimeRange};
use crate::report_models::{
    AiAnalysis, CashFlow, CreditScore, IndustryBenchmark, RiskAnalysis, TransactionRepaymentTrend,
};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

const EMBEDDED_TEMPLATES: &str = include_str!("../data/analysis_report.json");

/// Templates of one module, keyed by entity then time range.
#[derive(Debug, Clone)]
pub struct TemplateTable<T> {
    entries: HashMap<String, HashMap<TimeRange, T>>,
}

impl<T> Default for TemplateTable<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> TemplateTable<T> {
    pub fn get(&self, entity_id: &str, range: TimeRange) -> Option<&T> {
        self.entries.get(entity_id)?.get(&range)
    }

    pub fn insert(&mut self, entity_id: impl Into<String>, range: TimeRange, record: T) {
        self.entries
            .entry(entity_id.into())
            .or_default()
            .insert(range, record);
    }

    pub fn contains(&self, entity_id: &str, range: TimeRange) -> bool {
        self.get(entity_id, range).is_some()
    }

    fn missing_ranges(&self, entity_id: &str) -> Vec<TimeRange> {
        TimeRange::ALL_RANGES
            .into_iter()
            .filter(|range| !self.contains(entity_id, *range))
            .collect()
    }

    fn from_raw(raw: BTreeMap<String, BTreeMap<String, T>>, module: &str) -> anyhow::Result<Self> {
        let mut table = Self::default();
        for (entity_id, by_range) in raw {
            for (range, record) in by_range {
                let range: TimeRange = range.parse().map_err(|e| {
                    anyhow::anyhow!("{} template for {}: {}", module, entity_id, e)
                })?;
                table.insert(entity_id.clone(), range, record);
            }
        }
        Ok(table)
    }
}

/// A borrowed template of any module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemplateRef<'a> {
    CreditScore(&'a CreditScore),
    RiskAnalysis(&'a RiskAnalysis),
    CashFlow(&'a CashFlow),
    TransactionTrend(&'a TransactionRepaymentTrend),
    Benchmark(&'a IndustryBenchmark),
    AiAnalysis(&'a AiAnalysis),
}

impl TemplateRef<'_> {
    pub fn module(&self) -> AnalyticsModule {
        match self {
            TemplateRef::CreditScore(_) => AnalyticsModule::CreditScore,
            TemplateRef::RiskAnalysis(_) => AnalyticsModule::RiskAnalysis,
            TemplateRef::CashFlow(_) => AnalyticsModule::CashFlow,
            TemplateRef::TransactionTrend(_) => AnalyticsModule::TransactionTrend,
            TemplateRef::Benchmark(_) => AnalyticsModule::Benchmark,
            TemplateRef::AiAnalysis(_) => AnalyticsModule::AiAnalysis,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTemplates {
    reference_entity: String,
    credit_score: BTreeMap<String, BTreeMap<String, CreditScore>>,
    risk_analysis: BTreeMap<String, BTreeMap<String, RiskAnalysis>>,
    supply_chain_cash_flow: BTreeMap<String, BTreeMap<String, CashFlow>>,
    transaction_repayment_trend: BTreeMap<String, BTreeMap<String, TransactionRepaymentTrend>>,
    industry_benchmark: BTreeMap<String, BTreeMap<String, IndustryBenchmark>>,
    ai_analysis: BTreeMap<String, BTreeMap<String, AiAnalysis>>,
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    reference_entity: String,
    pub credit_score: TemplateTable<CreditScore>,
    pub risk_analysis: TemplateTable<RiskAnalysis>,
    pub cash_flow: TemplateTable<CashFlow>,
    pub transaction_trend: TemplateTable<TransactionRepaymentTrend>,
    pub benchmark: TemplateTable<IndustryBenchmark>,
    pub ai_analysis: TemplateTable<AiAnalysis>,
}

impl TemplateStore {
    /// Loads the templates compiled into the binary.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_json(EMBEDDED_TEMPLATES).context("Failed to load embedded analytics templates")
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw: RawTemplates =
            serde_json::from_str(json).context("Analytics templates are not valid JSON")?;

        let store = Self {
            reference_entity: raw.reference_entity,
            credit_score: TemplateTable::from_raw(raw.credit_score, "creditScore")?,
            risk_analysis: TemplateTable::from_raw(raw.risk_analysis, "riskAnalysis")?,
            cash_flow: TemplateTable::from_raw(raw.supply_chain_cash_flow, "cashFlow")?,
            transaction_trend: TemplateTable::from_raw(
                raw.transaction_repayment_trend,
                "transactionTrend",
            )?,
            benchmark: TemplateTable::from_raw(raw.industry_benchmark, "benchmark")?,
            ai_analysis: TemplateTable::from_raw(raw.ai_analysis, "aiAnalysis")?,
        };
        store.validate()?;

        tracing::info!(
            "Template store loaded (reference entity {})",
            store.reference_entity
        );
        Ok(store)
    }

    /// Builds a store from already-typed tables. Used by tests and tools that
    /// author templates in code.
    pub fn from_tables(
        reference_entity: impl Into<String>,
        credit_score: TemplateTable<CreditScore>,
        risk_analysis: TemplateTable<RiskAnalysis>,
        cash_flow: TemplateTable<CashFlow>,
        transaction_trend: TemplateTable<TransactionRepaymentTrend>,
        benchmark: TemplateTable<IndustryBenchmark>,
        ai_analysis: TemplateTable<AiAnalysis>,
    ) -> anyhow::Result<Self> {
        let store = Self {
            reference_entity: reference_entity.into(),
            credit_score,
            risk_analysis,
            cash_flow,
            transaction_trend,
            benchmark,
            ai_analysis,
        };
        store.validate()?;
        Ok(store)
    }

    pub fn reference_entity(&self) -> &str {
        &self.reference_entity
    }

    /// Exact lookup without any fallback.
    pub fn get(
        &self,
        module: AnalyticsModule,
        entity_id: &str,
        range: TimeRange,
    ) -> Option<TemplateRef<'_>> {
        match module {
            AnalyticsModule::CreditScore => self
                .credit_score
                .get(entity_id, range)
                .map(TemplateRef::CreditScore),
            AnalyticsModule::RiskAnalysis => self
                .risk_analysis
                .get(entity_id, range)
                .map(TemplateRef::RiskAnalysis),
            AnalyticsModule::CashFlow => self
                .cash_flow
                .get(entity_id, range)
                .map(TemplateRef::CashFlow),
            AnalyticsModule::TransactionTrend => self
                .transaction_trend
                .get(entity_id, range)
                .map(TemplateRef::TransactionTrend),
            AnalyticsModule::Benchmark => self
                .benchmark
                .get(entity_id, range)
                .map(TemplateRef::Benchmark),
            AnalyticsModule::AiAnalysis => self
                .ai_analysis
                .get(entity_id, range)
                .map(TemplateRef::AiAnalysis),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        let reference = self.reference_entity.as_str();
        let gaps = [
            ("creditScore", self.credit_score.missing_ranges(reference)),
            ("riskAnalysis", self.risk_analysis.missing_ranges(reference)),
            ("cashFlow", self.cash_flow.missing_ranges(reference)),
            ("transactionTrend", self.transaction_trend.missing_ranges(reference)),
            ("benchmark", self.benchmark.missing_ranges(reference)),
            ("aiAnalysis", self.ai_analysis.missing_ranges(reference)),
        ];

        for (module, missing) in gaps {
            if !missing.is_empty() {
                let ranges: Vec<&str> = missing.iter().map(|r| r.as_str()).collect();
                anyhow::bail!(
                    "Reference entity {} has no {} template for: {}",
                    reference,
                    module,
                    ranges.join(", ")
                );
            }
        }
        Ok(())
    }
}

/// Parses a single typed record; handy for fixtures.
pub fn parse_record<T: DeserializeOwned>(json: &str) -> anyhow::Result<T> {
    serde_json::from_str(json).context("Template record is not valid JSON")
}
