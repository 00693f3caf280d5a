use crate::errors::AppError;
use crate::models::{AnalysisParams, AnalyticsModule};
use crate::profiles::{EntityProfile, ProfileTable};
use crate::report_models::{
    AiAnalysis, CashFlow, CreditScore, EnterpriseList, FullAnalysisReport, IndustryBenchmark,
    RiskAnalysis, TransactionRepaymentTrend,
};
use crate::resolution::ResolutionChain;
use crate::templates::{TemplateRef, TemplateStore};
use crate::transforms::{self, ScalingContext};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// Resolves templates and derives per-entity analytics on demand.
///
/// Store and profiles are shared read-only; every call derives a fresh record.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<TemplateStore>,
    profiles: Arc<ProfileTable>,
    chain: Arc<ResolutionChain>,
}

impl AnalyticsService {
    pub fn new(store: Arc<TemplateStore>, profiles: Arc<ProfileTable>) -> Result<Self, AppError> {
        if store.reference_entity() != profiles.reference_id() {
            return Err(AppError::Internal(format!(
                "Template reference entity {} does not match profile reference {}",
                store.reference_entity(),
                profiles.reference_id()
            )));
        }
        let chain = Arc::new(ResolutionChain::standard(store.reference_entity()));
        Ok(Self {
            store,
            profiles,
            chain,
        })
    }

    /// Embedded templates with the built-in profile table.
    pub fn builtin() -> anyhow::Result<Self> {
        let store = Arc::new(TemplateStore::embedded()?);
        let profiles = Arc::new(ProfileTable::builtin()?);
        Ok(Self::new(store, profiles)?)
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub fn list_entities(&self) -> EnterpriseList {
        self.profiles.list_entities()
    }

    /// Scaling context for a known entity; `None` for unknown ids.
    fn context(&self, entity_id: &str) -> Option<ScalingContext<'_>> {
        match self.profiles.get(entity_id) {
            Some(entity) => Some(ScalingContext::new(entity, self.profiles.reference())),
            None => {
                tracing::warn!("Unknown entity {}, returning no data", entity_id);
                None
            }
        }
    }

    fn template(&self, module: AnalyticsModule, params: &AnalysisParams) -> Option<TemplateRef<'_>> {
        self.chain
            .resolve(&self.store, module, &params.enterprise_id, params.time_range)
    }

    pub fn credit_score(&self, params: &AnalysisParams) -> Option<CreditScore> {
        let ctx = self.context(&params.enterprise_id)?;
        let template = self
            .chain
            .resolve_in(&self.store.credit_score, &params.enterprise_id, params.time_range)?;
        Some(transforms::derive_credit_score(template.record, &ctx))
    }

    pub fn risk_analysis(&self, params: &AnalysisParams) -> Option<RiskAnalysis> {
        let ctx = self.context(&params.enterprise_id)?;
        let template = self
            .chain
            .resolve_in(&self.store.risk_analysis, &params.enterprise_id, params.time_range)?;
        Some(transforms::derive_risk_analysis(template.record, &ctx))
    }

    pub fn cash_flow(&self, params: &AnalysisParams) -> Option<CashFlow> {
        let ctx = self.context(&params.enterprise_id)?;
        let template = self
            .chain
            .resolve_in(&self.store.cash_flow, &params.enterprise_id, params.time_range)?;
        Some(transforms::derive_cash_flow(template.record, &ctx))
    }

    pub fn transaction_trend(&self, params: &AnalysisParams) -> Option<TransactionRepaymentTrend> {
        let ctx = self.context(&params.enterprise_id)?;
        let template = self.chain.resolve_in(
            &self.store.transaction_trend,
            &params.enterprise_id,
            params.time_range,
        )?;
        Some(transforms::derive_transaction_trend(template.record, &ctx))
    }

    pub fn benchmark(&self, params: &AnalysisParams) -> Option<IndustryBenchmark> {
        let ctx = self.context(&params.enterprise_id)?;
        let template = self
            .chain
            .resolve_in(&self.store.benchmark, &params.enterprise_id, params.time_range)?;
        Some(transforms::derive_benchmark(template.record, &ctx))
    }

    pub fn ai_analysis(&self, params: &AnalysisParams) -> Option<AiAnalysis> {
        let ctx = self.context(&params.enterprise_id)?;
        let template = self
            .chain
            .resolve_in(&self.store.ai_analysis, &params.enterprise_id, params.time_range)?;
        Some(transforms::derive_ai_analysis(template.record, &ctx))
    }

    /// Derives one module as JSON, `Value::Null` on a resolution miss.
    pub fn derive(&self, module: AnalyticsModule, params: &AnalysisParams) -> Result<Value, AppError> {
        let Some(ctx) = self.context(&params.enterprise_id) else {
            return Ok(Value::Null);
        };
        let value = match self.template(module, params) {
            None => Value::Null,
            Some(TemplateRef::CreditScore(t)) => {
                serde_json::to_value(transforms::derive_credit_score(t, &ctx))?
            }
            Some(TemplateRef::RiskAnalysis(t)) => {
                serde_json::to_value(transforms::derive_risk_analysis(t, &ctx))?
            }
            Some(TemplateRef::CashFlow(t)) => {
                serde_json::to_value(transforms::derive_cash_flow(t, &ctx))?
            }
            Some(TemplateRef::TransactionTrend(t)) => {
                serde_json::to_value(transforms::derive_transaction_trend(t, &ctx))?
            }
            Some(TemplateRef::Benchmark(t)) => {
                serde_json::to_value(transforms::derive_benchmark(t, &ctx))?
            }
            Some(TemplateRef::AiAnalysis(t)) => {
                serde_json::to_value(transforms::derive_ai_analysis(t, &ctx))?
            }
        };
        tracing::debug!(
            "Derived {} for {}/{} (null: {})",
            module,
            params.enterprise_id,
            params.time_range,
            value.is_null()
        );
        Ok(value)
    }

    /// All six modules at once; each may be absent independently.
    pub fn full_report(&self, params: &AnalysisParams) -> Option<FullAnalysisReport> {
        let entity: &EntityProfile = self.profiles.get(&params.enterprise_id)?;
        Some(FullAnalysisReport {
            enterprise_id: entity.id.clone(),
            enterprise_name: entity.display_name.clone(),
            report_date: Utc::now(),
            time_range: params.time_range,
            credit_score: self.credit_score(params),
            risk_analysis: self.risk_analysis(params),
            cash_flow: self.cash_flow(params),
            transaction_repayment_trend: self.transaction_trend(params),
            industry_benchmark: self.benchmark(params),
            ai_analysis: self.ai_analysis(params),
        })
    }
}
