//! Data Resolution Chain.
//!
//! Picks the best available template for an (entity, time range) pair by
//! trying an ordered list of strategies; the first hit wins:
//!
//! 1. exact template for (entity, range)
//! 2. reference entity, same range
//! 3. reference entity, default range
//!
//! A miss on every step is an expected outcome ("no data yet"), not an
//! error. Results borrow from the store; nothing is copied or mutated.

use crate::models::{AnalyticsModule, TimeRange};
use crate::templates::{TemplateRef, TemplateStore, TemplateTable};

/// Key a strategy proposes to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateKey<'a> {
    pub entity_id: &'a str,
    pub range: TimeRange,
}

/// One step of the resolution chain.
pub trait ResolverStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// The template key this step tries for the requested pair.
    fn key<'a>(&'a self, entity_id: &'a str, range: TimeRange) -> TemplateKey<'a>;
}

/// Step 1: the template authored for exactly this entity and range.
#[derive(Debug, Clone, Default)]
pub struct ExactMatch;

impl ResolverStrategy for ExactMatch {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn key<'a>(&'a self, entity_id: &'a str, range: TimeRange) -> TemplateKey<'a> {
        TemplateKey { entity_id, range }
    }
}

/// Step 2: the reference entity's template for the same range.
#[derive(Debug, Clone)]
pub struct ReferenceSameRange {
    pub reference_entity: String,
}

impl ResolverStrategy for ReferenceSameRange {
    fn name(&self) -> &'static str {
        "reference-same-range"
    }

    fn key<'a>(&'a self, _entity_id: &'a str, range: TimeRange) -> TemplateKey<'a> {
        TemplateKey {
            entity_id: &self.reference_entity,
            range,
        }
    }
}

/// Step 3: the reference entity's template for the default range.
#[derive(Debug, Clone)]
pub struct ReferenceDefaultRange {
    pub reference_entity: String,
    pub default_range: TimeRange,
}

impl ResolverStrategy for ReferenceDefaultRange {
    fn name(&self) -> &'static str {
        "reference-default-range"
    }

    fn key<'a>(&'a self, _entity_id: &'a str, _range: TimeRange) -> TemplateKey<'a> {
        TemplateKey {
            entity_id: &self.reference_entity,
            range: self.default_range,
        }
    }
}

/// A template found by the chain, with the step that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'s, T> {
    pub record: &'s T,
    pub step: &'static str,
}

impl<T> Resolved<'_, T> {
    pub fn is_exact(&self) -> bool {
        self.step == ExactMatch.name()
    }
}

pub struct ResolutionChain {
    steps: Vec<Box<dyn ResolverStrategy>>,
}

impl std::fmt::Debug for ResolutionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|s| s.name()))
            .finish()
    }
}

impl ResolutionChain {
    /// The standard three-step chain, defaulting to `month` as last resort.
    pub fn standard(reference_entity: impl Into<String>) -> Self {
        let reference_entity = reference_entity.into();
        Self::with_steps(vec![
            Box::new(ExactMatch),
            Box::new(ReferenceSameRange {
                reference_entity: reference_entity.clone(),
            }),
            Box::new(ReferenceDefaultRange {
                reference_entity,
                default_range: TimeRange::Month,
            }),
        ])
    }

    pub fn with_steps(steps: Vec<Box<dyn ResolverStrategy>>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Resolves within one module's table.
    pub fn resolve_in<'s, T>(
        &self,
        table: &'s TemplateTable<T>,
        entity_id: &str,
        range: TimeRange,
    ) -> Option<Resolved<'s, T>> {
        for step in &self.steps {
            let key = step.key(entity_id, range);
            if let Some(record) = table.get(key.entity_id, key.range) {
                if step.name() != ExactMatch.name() {
                    tracing::debug!(
                        "Template for {}/{} resolved via {} ({}/{})",
                        entity_id,
                        range,
                        step.name(),
                        key.entity_id,
                        key.range
                    );
                }
                return Some(Resolved {
                    record,
                    step: step.name(),
                });
            }
        }
        tracing::debug!("No template for {}/{}", entity_id, range);
        None
    }

    /// `resolve(module, entityId, timeRange) -> TemplateRecord | absent`.
    pub fn resolve<'s>(
        &self,
        store: &'s TemplateStore,
        module: AnalyticsModule,
        entity_id: &str,
        range: TimeRange,
    ) -> Option<TemplateRef<'s>> {
        match module {
            AnalyticsModule::CreditScore => self
                .resolve_in(&store.credit_score, entity_id, range)
                .map(|r| TemplateRef::CreditScore(r.record)),
            AnalyticsModule::RiskAnalysis => self
                .resolve_in(&store.risk_analysis, entity_id, range)
                .map(|r| TemplateRef::RiskAnalysis(r.record)),
            AnalyticsModule::CashFlow => self
                .resolve_in(&store.cash_flow, entity_id, range)
                .map(|r| TemplateRef::CashFlow(r.record)),
            AnalyticsModule::TransactionTrend => self
                .resolve_in(&store.transaction_trend, entity_id, range)
                .map(|r| TemplateRef::TransactionTrend(r.record)),
            AnalyticsModule::Benchmark => self
                .resolve_in(&store.benchmark, entity_id, range)
                .map(|r| TemplateRef::Benchmark(r.record)),
            AnalyticsModule::AiAnalysis => self
                .resolve_in(&store.ai_analysis, entity_id, range)
                .map(|r| TemplateRef::AiAnalysis(r.record)),
        }
    }
}
