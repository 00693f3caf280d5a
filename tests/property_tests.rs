/// Property-based tests using proptest
/// Invariants of the scaling transforms that must hold for every multiplier
use proptest::prelude::*;
use scf_mock_gateway::analytics::AnalyticsService;
use scf_mock_gateway::models::{AnalysisParams, AnalyticsModule, TimeRange};
use scf_mock_gateway::profiles::{EntityProfile, ProfileTable};
use scf_mock_gateway::report_models::{
    CashFlow, CashFlowLink, CashFlowNode, CashFlowSummary, CreditLevel, RepaymentPoint,
    RiskAnalysis, RiskNode, RiskSummary, TransactionRepaymentTrend, TrendSummary,
};
use scf_mock_gateway::resolution::ResolutionChain;
use scf_mock_gateway::templates::TemplateStore;
use scf_mock_gateway::transforms::{
    credit_level, derive_cash_flow, derive_credit_score, derive_risk_analysis,
    derive_transaction_trend, rank_multiplier, repayment_quality, risk_multiplier, round_half_up,
    ScalingContext, CREDIT_SCORE_MAX, CREDIT_SCORE_MIN, REPAYMENT_QUALITY_FACTOR,
};
use std::sync::Arc;

const REFERENCE_NAME: &str = "Huaxia Supply Chain Technology Co., Ltd.";

fn reference() -> EntityProfile {
    EntityProfile::new("E001", REFERENCE_NAME, "AAA", 1.0).unwrap()
}

fn entity(m: f64) -> EntityProfile {
    EntityProfile::new("E900", "Test Trading Co.", "A", m).unwrap()
}

fn risk_node(name: &str, value: i64, children: Vec<RiskNode>) -> RiskNode {
    RiskNode {
        name: name.to_string(),
        value,
        level: None,
        children,
        item_style: None,
    }
}

fn flatten(nodes: &[RiskNode]) -> Vec<i64> {
    nodes
        .iter()
        .flat_map(|n| std::iter::once(n.value).chain(flatten(&n.children)))
        .collect()
}

fn multiplier() -> impl Strategy<Value = f64> {
    (1u32..=1000u32).prop_map(|n| n as f64 / 1000.0)
}

// Property: risk values scale by 2 - m at every depth
proptest! {
    #[test]
    fn risk_values_scale_by_risk_multiplier(
        m in multiplier(),
        leaves in prop::collection::vec(0i64..50_000, 1..6),
        high in 0i64..50,
        low in 0i64..50,
    ) {
        let parent_value: i64 = leaves.iter().sum();
        let template = RiskAnalysis {
            risk_tree: vec![risk_node(
                "Operational",
                parent_value,
                leaves
                    .iter()
                    .enumerate()
                    .map(|(i, v)| risk_node(&format!("leaf-{}", i), *v, Vec::new()))
                    .collect(),
            )],
            summary: RiskSummary {
                total_risk_points: parent_value,
                high_risk_count: high,
                medium_risk_count: 3,
                low_risk_count: low,
            },
            risk_details: Vec::new(),
        };

        let (reference, entity) = (reference(), entity(m));
        let derived = derive_risk_analysis(&template, &ScalingContext::new(&entity, &reference));
        let rm = risk_multiplier(m);

        prop_assert!((rm - (2.0 - m)).abs() < f64::EPSILON);
        for (original, scaled) in flatten(&template.risk_tree).iter().zip(flatten(&derived.risk_tree)) {
            prop_assert_eq!(scaled, round_half_up(*original as f64 * rm));
        }
        prop_assert_eq!(derived.risk_tree[0].children.len(), leaves.len());
        prop_assert!(derived.summary.high_risk_count >= high);
        prop_assert!(derived.summary.low_risk_count >= 1);
    }
}

// Property: on-time + late equals the scaled template total
proptest! {
    #[test]
    fn repayment_counts_never_drift(
        m in multiplier(),
        points in prop::collection::vec((0i64..500, 0i64..100), 1..12),
    ) {
        let template = TransactionRepaymentTrend {
            transaction_trend: Vec::new(),
            repayment_trend: points
                .iter()
                .enumerate()
                .map(|(i, (on_time, late))| RepaymentPoint {
                    date: format!("2024-{:02}", i + 1),
                    on_time_count: *on_time,
                    late_count: *late,
                    default_count: 0,
                    on_time_rate: 0.0,
                })
                .collect(),
            summary: TrendSummary {
                total_transactions: 0,
                total_transaction_amount: 0,
                avg_transaction_amount: 0.0,
                total_repayments: 0,
                on_time_repayment_rate: 98.5,
                avg_repayment_delay: 1.2,
            },
        };

        let (reference, entity) = (reference(), entity(m));
        let derived = derive_transaction_trend(&template, &ScalingContext::new(&entity, &reference));
        let quality = repayment_quality(m);
        prop_assert!(quality <= 1.0);

        for ((on_time, late), point) in points.iter().zip(&derived.repayment_trend) {
            let expected_total = round_half_up((on_time + late) as f64 * m);
            prop_assert_eq!(point.on_time_count + point.late_count, expected_total);
            prop_assert!(point.late_count >= 0);
            prop_assert!(point.on_time_rate <= 100.0);
        }
        prop_assert!(derived.summary.on_time_repayment_rate <= 100.0);
    }
}

// Property: credit level is a pure function of the clamped score
proptest! {
    #[test]
    fn credit_level_thresholds_are_inclusive(score in -500i64..2000) {
        let clamped = score.clamp(CREDIT_SCORE_MIN, CREDIT_SCORE_MAX);
        let expected = if clamped >= 850 {
            CreditLevel::Excellent
        } else if clamped >= 750 {
            CreditLevel::Good
        } else if clamped >= 650 {
            CreditLevel::Medium
        } else if clamped >= 550 {
            CreditLevel::Poor
        } else {
            CreditLevel::Bad
        };
        prop_assert_eq!(credit_level(clamped), expected);
    }

    #[test]
    fn derived_credit_score_stays_in_bounds(m in multiplier(), range_index in 0usize..4) {
        let store = TemplateStore::embedded().unwrap();
        let range = TimeRange::ALL_RANGES[range_index];
        let template = store.credit_score.get(store.reference_entity(), range).unwrap();

        let (reference, entity) = (reference(), entity(m));
        let credit = derive_credit_score(template, &ScalingContext::new(&entity, &reference));

        prop_assert!((CREDIT_SCORE_MIN..=CREDIT_SCORE_MAX).contains(&credit.score));
        prop_assert_eq!(credit.level, credit_level(credit.score));
        prop_assert_eq!(credit.level_label.as_str(), credit.level.label());
    }
}

// Property: only labels equal to the reference name are renamed
proptest! {
    #[test]
    fn cash_flow_rename_is_exact(
        m in multiplier(),
        others in prop::collection::vec("[A-Za-z ]{1,24}", 0..6),
    ) {
        let mut names = vec![
            REFERENCE_NAME.to_string(),
            format!("{} (Shenzhen Branch)", REFERENCE_NAME),
        ];
        names.extend(others);

        let template = CashFlow {
            nodes: names
                .iter()
                .map(|name| CashFlowNode { name: name.clone(), value: Some(1_000) })
                .collect(),
            links: names
                .iter()
                .skip(1)
                .map(|name| CashFlowLink {
                    source: REFERENCE_NAME.to_string(),
                    target: name.clone(),
                    value: 500,
                })
                .collect(),
            summary: CashFlowSummary {
                total_inflow: 0,
                total_outflow: 0,
                net_cash_flow: 0,
                major_suppliers: Vec::new(),
                major_customers: Vec::new(),
            },
        };

        let (reference, entity) = (reference(), entity(m));
        let derived = derive_cash_flow(&template, &ScalingContext::new(&entity, &reference));

        for (original, node) in template.nodes.iter().zip(&derived.nodes) {
            if original.name == REFERENCE_NAME {
                prop_assert_eq!(node.name.as_str(), "Test Trading Co.");
            } else {
                prop_assert_eq!(&node.name, &original.name);
            }
        }
        for (original, link) in template.links.iter().zip(&derived.links) {
            prop_assert_eq!(link.source.as_str(), "Test Trading Co.");
            if original.target != REFERENCE_NAME {
                prop_assert_eq!(&link.target, &original.target);
            }
            prop_assert_eq!(link.value, round_half_up(500.0 * m));
        }
    }
}

// Property: the resolution chain is total
proptest! {
    #[test]
    fn resolution_chain_never_fails(entity_id in "\\PC{0,12}", range_index in 0usize..4, module_index in 0usize..6) {
        let store = TemplateStore::embedded().unwrap();
        let chain = ResolutionChain::standard(store.reference_entity());
        let range = TimeRange::ALL_RANGES[range_index];
        let module = AnalyticsModule::ALL[module_index];

        // The reference entity covers every range, so unknown ids still resolve.
        let resolved = chain.resolve(&store, module, &entity_id, range);
        prop_assert!(resolved.is_some());
    }
}

// Property: the six records derived for one (entity, range) agree with each other
proptest! {
    #[test]
    fn derived_records_are_mutually_consistent(m in multiplier(), range_index in 0usize..4) {
        let store = Arc::new(TemplateStore::embedded().unwrap());
        let profiles = Arc::new(
            ProfileTable::new(vec![reference(), entity(m)], "E001").unwrap(),
        );
        let service = AnalyticsService::new(store.clone(), profiles).unwrap();
        let range = TimeRange::ALL_RANGES[range_index];
        let params = AnalysisParams::new("E900", range);

        let report = service.full_report(&params).unwrap();
        let credit = report.credit_score.unwrap();
        let risk = report.risk_analysis.unwrap();
        let cash_flow = report.cash_flow.unwrap();
        let trend = report.transaction_repayment_trend.unwrap();
        let benchmark = report.industry_benchmark.unwrap();
        let narrative = report.ai_analysis.unwrap();

        // Risk and rank move together, opposite to the credit multiplier.
        prop_assert!((risk_multiplier(m) - (2.0 - m)).abs() < f64::EPSILON);
        prop_assert!((rank_multiplier(m) - risk_multiplier(m)).abs() < f64::EPSILON);
        prop_assert!((repayment_quality(m) - (REPAYMENT_QUALITY_FACTOR * m).min(1.0)).abs() < f64::EPSILON);
        prop_assert!(!risk.risk_tree.is_empty());
        prop_assert!(trend.summary.on_time_repayment_rate <= 100.0);

        // Both credit figures stay in the valid band and match when the
        // templates start from the same score.
        let reference_id = store.reference_entity();
        let credit_template = store.credit_score.get(reference_id, range).unwrap();
        let benchmark_template = store.benchmark.get(reference_id, range).unwrap();
        let current = &benchmark.current_enterprise;
        prop_assert!((CREDIT_SCORE_MIN..=CREDIT_SCORE_MAX).contains(&current.credit_score));
        if credit_template.score == benchmark_template.current_enterprise.credit_score {
            prop_assert_eq!(credit.score, current.credit_score);
        }
        for point in benchmark.industry_distribution.iter().filter(|p| p.is_current_enterprise) {
            prop_assert_eq!(point.credit_score, current.credit_score);
            prop_assert_eq!(point.name.as_str(), "Test Trading Co.");
        }

        // Every label that named the reference now names the entity.
        prop_assert_eq!(report.enterprise_name.as_str(), "Test Trading Co.");
        prop_assert_eq!(current.name.as_str(), "Test Trading Co.");
        prop_assert!(cash_flow.nodes.iter().any(|n| n.name == "Test Trading Co."));
        prop_assert!(cash_flow.nodes.iter().all(|n| n.name != REFERENCE_NAME));
        let narrative_text = serde_json::to_string(&narrative).unwrap();
        prop_assert!(!narrative_text.contains(REFERENCE_NAME));
    }
}
