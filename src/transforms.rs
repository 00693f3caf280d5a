//! Correlated scaling transforms.
//!
//! Each function turns one template plus one entity profile into a derived
//! record. All six share the entity's scale multiplier `m`, so the datasets
//! stay mutually consistent: lower `m` means a lower credit score, a larger
//! risk tree, smaller flows, fewer on-time repayments and a worse rank.
//!
//! Everything here is pure and deterministic. Rounding follows the
//! dashboard's `Math.round` convention (halves round toward +infinity).

use crate::profiles::EntityProfile;
use crate::report_models::{
    AiAnalysis, CashFlow, CashFlowLink, CashFlowNode, CashFlowSummary, Counterparty,
    CreditBreakdown, CreditLevel, CreditScore, EnterpriseMetrics, IndustryBenchmark, Ranking,
    Rankings, RepaymentPoint, RiskAnalysis, RiskNode, RiskSummary, ScorePoint, TransactionPoint,
    TransactionRepaymentTrend, TrendSummary,
};

pub const CREDIT_SCORE_MIN: i64 = 300;
pub const CREDIT_SCORE_MAX: i64 = 1000;
/// Highest severity a derived risk node may carry.
pub const RISK_LEVEL_CAP: i64 = 4;
pub const REPAYMENT_QUALITY_FACTOR: f64 = 0.98;
/// Industry size used when a benchmark template does not state one.
pub const BENCHMARK_TOTAL_ENTERPRISES: i64 = 156;
pub const BASE_CREDIT_SCORE_RANK: i64 = 8;
pub const BASE_REVENUE_RANK: i64 = 8;
pub const BASE_PROFIT_MARGIN_RANK: i64 = 12;

/// The requested entity plus the reference entity whose name appears in
/// templates.
#[derive(Debug, Clone, Copy)]
pub struct ScalingContext<'a> {
    pub entity: &'a EntityProfile,
    pub reference: &'a EntityProfile,
}

impl<'a> ScalingContext<'a> {
    pub fn new(entity: &'a EntityProfile, reference: &'a EntityProfile) -> Self {
        Self { entity, reference }
    }

    pub fn multiplier(&self) -> f64 {
        self.entity.scale_multiplier
    }

    fn rename<'s>(&'s self, label: &'s str) -> &'s str {
        if label == self.reference.display_name {
            &self.entity.display_name
        } else {
            label
        }
    }

    fn substitute(&self, text: &str) -> String {
        text.replace(&self.reference.display_name, &self.entity.display_name)
    }
}

// ============ Rounding ============

/// `Math.round`: nearest integer, halves toward +infinity.
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// `Math.round(x * 10^d) / 10^d`.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor + 0.5).floor() / factor
}

fn scale(value: i64, factor: f64) -> i64 {
    round_half_up(value as f64 * factor)
}

// ============ Credit ============

/// Scaled credit score, held inside the valid band wherever it appears.
fn scale_credit(score: i64, m: f64) -> i64 {
    scale(score, m).clamp(CREDIT_SCORE_MIN, CREDIT_SCORE_MAX)
}

/// Level for a score. Thresholds are inclusive lower bounds.
pub fn credit_level(score: i64) -> CreditLevel {
    match score {
        s if s >= 850 => CreditLevel::Excellent,
        s if s >= 750 => CreditLevel::Good,
        s if s >= 650 => CreditLevel::Medium,
        s if s >= 550 => CreditLevel::Poor,
        _ => CreditLevel::Bad,
    }
}

pub fn derive_credit_score(template: &CreditScore, ctx: &ScalingContext<'_>) -> CreditScore {
    let m = ctx.multiplier();
    let score = scale_credit(template.score, m);
    let level = credit_level(score);
    let b = &template.breakdown;

    CreditScore {
        score,
        level,
        level_label: level.label().to_string(),
        trend: template.trend,
        trend_value: scale(template.trend_value, m),
        breakdown: CreditBreakdown {
            payment_history: scale(b.payment_history, m),
            debt_burden: scale(b.debt_burden, m),
            business_stability: scale(b.business_stability, m),
            industry_status: scale(b.industry_status, m),
            supply_chain_health: scale(b.supply_chain_health, m),
        },
        history: template
            .history
            .iter()
            .map(|point| ScorePoint {
                date: point.date.clone(),
                score: scale(point.score, m),
            })
            .collect(),
    }
}

// ============ Risk ============

/// Lower credit means proportionally more risk.
pub fn risk_multiplier(m: f64) -> f64 {
    2.0 - m
}

fn scale_risk_node(node: &RiskNode, rm: f64) -> RiskNode {
    RiskNode {
        name: node.name.clone(),
        value: scale(node.value, rm),
        // A zero level means "unrated" and stays zero.
        level: node.level.map(|level| {
            if level == 0 {
                0
            } else {
                scale(level, rm).min(RISK_LEVEL_CAP)
            }
        }),
        children: node
            .children
            .iter()
            .map(|child| scale_risk_node(child, rm))
            .collect(),
        item_style: node.item_style.clone(),
    }
}

pub fn derive_risk_analysis(template: &RiskAnalysis, ctx: &ScalingContext<'_>) -> RiskAnalysis {
    let rm = risk_multiplier(ctx.multiplier());
    let s = &template.summary;

    RiskAnalysis {
        risk_tree: template
            .risk_tree
            .iter()
            .map(|node| scale_risk_node(node, rm))
            .collect(),
        summary: RiskSummary {
            total_risk_points: scale(s.total_risk_points, rm),
            // High risk must not under-count, low risk must not vanish.
            high_risk_count: (s.high_risk_count as f64 * rm).ceil() as i64,
            medium_risk_count: scale(s.medium_risk_count, rm),
            low_risk_count: ((s.low_risk_count as f64 / rm).floor() as i64).max(1),
        },
        risk_details: template.risk_details.clone(),
    }
}

// ============ Cash flow ============

fn scale_counterparties(parties: &[Counterparty], m: f64) -> Vec<Counterparty> {
    parties
        .iter()
        .map(|p| Counterparty {
            name: p.name.clone(),
            amount: scale(p.amount, m),
            percentage: p.percentage,
        })
        .collect()
}

pub fn derive_cash_flow(template: &CashFlow, ctx: &ScalingContext<'_>) -> CashFlow {
    let m = ctx.multiplier();
    let s = &template.summary;

    CashFlow {
        nodes: template
            .nodes
            .iter()
            .map(|node| CashFlowNode {
                name: ctx.rename(&node.name).to_string(),
                value: node.value.map(|v| scale(v, m)),
            })
            .collect(),
        links: template
            .links
            .iter()
            .map(|link| CashFlowLink {
                source: ctx.rename(&link.source).to_string(),
                target: ctx.rename(&link.target).to_string(),
                value: scale(link.value, m),
            })
            .collect(),
        summary: CashFlowSummary {
            total_inflow: scale(s.total_inflow, m),
            total_outflow: scale(s.total_outflow, m),
            net_cash_flow: scale(s.net_cash_flow, m),
            major_suppliers: scale_counterparties(&s.major_suppliers, m),
            major_customers: scale_counterparties(&s.major_customers, m),
        },
    }
}

// ============ Transactions and repayments ============

/// Share of repayments made on time, capped at 1.0.
pub fn repayment_quality(m: f64) -> f64 {
    (m * REPAYMENT_QUALITY_FACTOR).min(1.0)
}

fn derive_repayment_point(point: &RepaymentPoint, m: f64, quality: f64) -> RepaymentPoint {
    // Recomputed from the scaled total so on-time + late never drifts.
    let total = scale(point.on_time_count + point.late_count, m);
    let on_time = round_half_up(total as f64 * quality);
    let late = (total - on_time).max(0);
    let on_time_rate = if total > 0 {
        round_half_up(on_time as f64 / total as f64 * 10_000.0) as f64 / 100.0
    } else {
        0.0
    };

    RepaymentPoint {
        date: point.date.clone(),
        on_time_count: on_time,
        late_count: late,
        default_count: point.default_count,
        on_time_rate,
    }
}

pub fn derive_transaction_trend(
    template: &TransactionRepaymentTrend,
    ctx: &ScalingContext<'_>,
) -> TransactionRepaymentTrend {
    let m = ctx.multiplier();
    let quality = repayment_quality(m);
    let s = &template.summary;

    TransactionRepaymentTrend {
        transaction_trend: template
            .transaction_trend
            .iter()
            .map(|point| TransactionPoint {
                date: point.date.clone(),
                count: scale(point.count, m),
                amount: scale(point.amount, m),
            })
            .collect(),
        repayment_trend: template
            .repayment_trend
            .iter()
            .map(|point| derive_repayment_point(point, m, quality))
            .collect(),
        summary: TrendSummary {
            total_transactions: scale(s.total_transactions, m),
            total_transaction_amount: scale(s.total_transaction_amount, m),
            avg_transaction_amount: round_to(s.avg_transaction_amount * m, 2),
            total_repayments: scale(s.total_repayments, m),
            on_time_repayment_rate: round_to(s.on_time_repayment_rate * quality, 2).min(100.0),
            avg_repayment_delay: s.avg_repayment_delay * (2.0 - quality),
        },
    }
}

// ============ Benchmark ============

/// Lower credit pushes the entity further down the industry ranking.
pub fn rank_multiplier(m: f64) -> f64 {
    2.0 - m
}

fn scaled_rank(base: i64, rm: f64, total: i64) -> i64 {
    scale(base, rm).clamp(1, total.max(1))
}

/// Share of the industry ranked below `rank`, one decimal, never negative.
pub fn percentile(rank: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = round_half_up((1.0 - rank as f64 / total as f64) * 1000.0) as f64 / 10.0;
    raw.max(0.0)
}

pub fn derive_benchmark(template: &IndustryBenchmark, ctx: &ScalingContext<'_>) -> IndustryBenchmark {
    let m = ctx.multiplier();
    let rm = rank_multiplier(m);
    let current = &template.current_enterprise;
    let total = template
        .rankings
        .as_ref()
        .map(|r| r.total_enterprises)
        .filter(|t| *t > 0)
        .unwrap_or(BENCHMARK_TOTAL_ENTERPRISES);

    let rankings = Rankings {
        credit_score_rank: scaled_rank(BASE_CREDIT_SCORE_RANK, rm, total),
        revenue_rank: scaled_rank(BASE_REVENUE_RANK, rm, total),
        profit_margin_rank: scaled_rank(BASE_PROFIT_MARGIN_RANK, rm, total),
        total_enterprises: total,
    };
    let ranking = Ranking {
        rank: rankings.credit_score_rank,
        percentile: percentile(rankings.credit_score_rank, total),
    };

    IndustryBenchmark {
        current_enterprise: EnterpriseMetrics {
            name: ctx.entity.display_name.clone(),
            credit_score: scale_credit(current.credit_score, m),
            revenue: scale(current.revenue, m),
            profit_margin: round_to(current.profit_margin * m, 2),
            // Leverage rises as creditworthiness falls.
            debt_ratio: round_to(current.debt_ratio * (1.0 + (1.0 - m) * 0.3), 2),
            turnover_rate: round_to(current.turnover_rate * m, 2),
            supply_chain_efficiency: scale(current.supply_chain_efficiency, m),
        },
        industry_average: template.industry_average.clone(),
        top_enterprises: template.top_enterprises.clone(),
        industry_distribution: template
            .industry_distribution
            .iter()
            .map(|point| {
                let mut point = point.clone();
                if point.is_current_enterprise {
                    point.name = ctx.entity.display_name.clone();
                    point.credit_score = scale_credit(point.credit_score, m);
                    point.revenue = scale(point.revenue, m);
                }
                point
            })
            .collect(),
        rankings: Some(rankings),
        ranking: Some(ranking),
    }
}

// ============ Narrative ============

pub fn derive_ai_analysis(template: &AiAnalysis, ctx: &ScalingContext<'_>) -> AiAnalysis {
    let sub_all = |items: &[String]| items.iter().map(|s| ctx.substitute(s)).collect::<Vec<_>>();
    let mut out = template.clone();

    let overall = &mut out.overall_assessment;
    overall.summary = ctx.substitute(&overall.summary);
    overall.strengths = sub_all(&overall.strengths);
    overall.weaknesses = sub_all(&overall.weaknesses);
    overall.opportunities = sub_all(&overall.opportunities);
    overall.threats = sub_all(&overall.threats);

    for insight in &mut out.insights {
        insight.title = ctx.substitute(&insight.title);
        insight.content = ctx.substitute(&insight.content);
    }
    for warning in &mut out.warnings {
        warning.title = ctx.substitute(&warning.title);
        warning.description = ctx.substitute(&warning.description);
        warning.suggested_actions = sub_all(&warning.suggested_actions);
    }
    for rec in &mut out.recommendations {
        rec.title = ctx.substitute(&rec.title);
        rec.description = ctx.substitute(&rec.description);
        rec.expected_impact = ctx.substitute(&rec.expected_impact);
    }
    out
}
