//! End-to-end scenarios across the alert, pacing and gap calculators.

use campaign_core::types::{
    CampaignSnapshot, CampaignStatus, Channel, MetricRecord, MetricsSummary, TacticalChannelPlan,
    TacticalMetricTarget,
};
use campaign_reporting::alerts::{AlertCategory, AlertEvaluator, AlertRule, Severity};
use campaign_reporting::budget::{self, PacingCalculator, PacingStatus};
use campaign_reporting::gap::{GapAnalyzer, GapStatus, StructureMatch};
use campaign_reporting::metrics;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn as_of() -> NaiveDate {
    date(2024, 9, 10)
}

fn campaign(channel: Channel, budget_total: f64, budget_spent: f64) -> CampaignSnapshot {
    CampaignSnapshot {
        id: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        name: format!("{channel} campaign"),
        channel,
        status: CampaignStatus::Active,
        budget_total,
        budget_spent,
        start_date: date(2024, 9, 1),
        end_date: Some(date(2024, 9, 30)),
        campaign_type: None,
        funnel_stage: None,
        bidding_strategy: None,
    }
}

// Scenario 1 ------------------------------------------------------------------

#[test]
fn clicks_without_conversions_is_critical() {
    let c = campaign(Channel::Google, 10_000.0, 2_000.0);
    let summary = MetricsSummary {
        clicks: Some(120.0),
        conversions: Some(0.0),
        leads: Some(0.0),
        ..Default::default()
    };

    let alerts = AlertEvaluator::default().evaluate(
        &[c.clone()],
        &BTreeMap::from([(c.id, summary)]),
        as_of(),
    );

    let hit = alerts
        .iter()
        .find(|a| a.rule == AlertRule::NoConversions)
        .expect("no-conversion rule fires");
    assert_eq!(hit.severity, Severity::Critical);
    assert_eq!(hit.category, AlertCategory::Conversion);
    assert_eq!(hit.current_value, 120.0);
}

// Scenario 2 ------------------------------------------------------------------

#[test]
fn budget_bands_and_status_tiers_are_independent() {
    let evaluator = AlertEvaluator::default();
    let calc = PacingCalculator::default();
    // Measured but rule-neutral, so only the budget rules can fire.
    let measured = MetricsSummary {
        periods_recorded: 9,
        impressions: Some(20_000.0),
        clicks: Some(30.0),
        ..Default::default()
    };

    let at_95 = campaign(Channel::Meta, 1_000.0, 950.0);
    let pct = budget::pacing_percent(at_95.budget_spent, at_95.budget_total);
    assert_eq!(pct, 95.0);
    assert_eq!(calc.pacing_status(pct), PacingStatus::Danger);
    let rules: Vec<_> = evaluator
        .evaluate_campaign(&at_95, Some(&measured), as_of())
        .into_iter()
        .map(|a| a.rule)
        .collect();
    assert_eq!(rules, vec![AlertRule::BudgetNearlyExhausted]);

    let at_90 = campaign(Channel::Meta, 1_000.0, 900.0);
    let pct = budget::pacing_percent(at_90.budget_spent, at_90.budget_total);
    assert_eq!(pct, 90.0);
    assert_eq!(calc.pacing_status(pct), PacingStatus::Attention);
    let alerts = evaluator.evaluate_campaign(&at_90, Some(&measured), as_of());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].rule, AlertRule::BudgetNearlyExhausted);
    assert_eq!(alerts[0].severity, Severity::Warning);
    assert_eq!(alerts[0].current_value, 90.0);
}

#[test]
fn unmeasured_active_campaign_is_also_flagged_stale() {
    let c = campaign(Channel::Meta, 1_000.0, 950.0);

    let rules: Vec<_> = AlertEvaluator::default()
        .evaluate_campaign(&c, None, as_of())
        .into_iter()
        .map(|a| a.rule)
        .collect();

    assert_eq!(
        rules,
        vec![AlertRule::BudgetNearlyExhausted, AlertRule::StaleCampaign]
    );
}

// Scenario 3 ------------------------------------------------------------------

#[test]
fn linkedin_ctr_below_minimum() {
    let c = campaign(Channel::Linkedin, 10_000.0, 2_000.0);
    let summary = MetricsSummary {
        ctr: Some(0.3),
        ..Default::default()
    };

    let alerts = AlertEvaluator::default().evaluate_campaign(&c, Some(&summary), as_of());

    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.rule, AlertRule::LowCtr);
    assert_eq!(alert.severity, Severity::Warning);
    assert_eq!(alert.category, AlertCategory::Efficiency);
    assert_eq!(alert.current_value, 0.3);
    assert_eq!(alert.threshold, 0.4);
    assert_eq!(alert.unit, "%");
}

// Scenario 4 ------------------------------------------------------------------

#[test]
fn leads_short_of_plan_is_below() {
    let gaps = GapAnalyzer::default().build_metric_gaps(
        &[TacticalMetricTarget {
            metric: "leads".to_string(),
            planned: 100.0,
            unit: None,
        }],
        &BTreeMap::from([("leads".to_string(), Some(72.0))]),
    );

    assert_eq!(gaps[0].gap_percent, Some(-28.0));
    assert_eq!(gaps[0].status, GapStatus::Below);
}

// Scenario 5 ------------------------------------------------------------------

#[test]
fn linear_projection_a_third_into_the_month() {
    let elapsed = budget::elapsed_fraction_of_month(2024, 9, date(2024, 9, 10));
    assert!((elapsed - 1.0 / 3.0).abs() < 1e-12);

    let projection = budget::projection(1_500.0, 5_000.0, elapsed);
    assert!((projection.projected_spend - 4_500.0).abs() < 1e-6);
    assert!(!projection.will_overspend);
}

// Scenario 6 ------------------------------------------------------------------

#[test]
fn plan_without_campaigns_scores_zero() {
    let project_id = Uuid::new_v4();
    let plan = TacticalChannelPlan {
        project_id,
        channel: Channel::Google,
        campaign_type: Some("Search".to_string()),
        funnel_stage: None,
        bidding_strategy: None,
        metrics: vec![],
    };

    let project = GapAnalyzer::default().analyze_project(project_id, &[plan], &[], &BTreeMap::new());

    assert_eq!(project.channels.len(), 1);
    let google = &project.channels[0];
    assert_eq!(google.adherence_score, 0.0);
    assert!(google
        .summary
        .to_lowercase()
        .contains("plan defined, no campaigns in execution"));
    assert_eq!(project.overall_adherence, 0.0);
}

// Properties ------------------------------------------------------------------

#[test]
fn evaluation_is_byte_identical_across_runs() {
    let evaluator = AlertEvaluator::default();
    let mut campaigns = Vec::new();
    let mut summaries = BTreeMap::new();
    for (i, channel) in Channel::ALL.into_iter().enumerate() {
        let c = campaign(channel, 1_000.0, 850.0 + i as f64 * 60.0);
        summaries.insert(
            c.id,
            MetricsSummary {
                clicks: Some(400.0),
                conversions: Some(0.0),
                leads: Some(0.0),
                ctr: Some(0.2),
                cpc: Some(20.0),
                roas: Some(0.4),
                ..Default::default()
            },
        );
        campaigns.push(c);
    }

    let first = serde_json::to_string(&evaluator.evaluate(&campaigns, &summaries, as_of())).unwrap();
    let second = serde_json::to_string(&evaluator.evaluate(&campaigns, &summaries, as_of())).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn all_null_metrics_never_raise_false_criticals() {
    let evaluator = AlertEvaluator::default();
    let analyzer = GapAnalyzer::default();
    let empty = MetricsSummary::default();

    for channel in Channel::ALL {
        let c = campaign(channel, 10_000.0, 5_000.0);
        let alerts = evaluator.evaluate_campaign(&c, Some(&empty), as_of());
        assert!(alerts
            .iter()
            .all(|a| a.severity != Severity::Critical && a.severity != Severity::Warning));
    }

    let targets: Vec<TacticalMetricTarget> = ["leads", "cpa", "ctr", "roas", "investment"]
        .into_iter()
        .map(|metric| TacticalMetricTarget {
            metric: metric.to_string(),
            planned: 10.0,
            unit: None,
        })
        .collect();
    let actuals = metrics::actuals_for(&empty, targets.iter().map(|t| t.metric.as_str()));
    let gaps = analyzer.build_metric_gaps(&targets, &actuals);
    assert!(gaps.iter().all(|g| g.status == GapStatus::NoData));
    assert_eq!(
        analyzer.compute_adherence_score(&gaps, &StructureMatch::default()),
        0.0
    );
}

#[test]
fn pacing_boundaries() {
    let calc = PacingCalculator::default();
    assert_eq!(calc.pacing_status(80.0), PacingStatus::Attention);
    assert_eq!(calc.pacing_status(95.0), PacingStatus::Danger);
    assert_eq!(calc.pacing_status(100.0), PacingStatus::Danger);
    assert_eq!(calc.pacing_status(100.01), PacingStatus::Overspent);
}

#[test]
fn metric_rows_flow_into_alerts_and_gaps() {
    let project_id = Uuid::new_v4();
    let mut c = campaign(Channel::Meta, 5_000.0, 2_000.0);
    c.project_id = project_id;
    c.campaign_type = Some("Conversions".to_string());

    let rows: Vec<MetricRecord> = (1..=4)
        .map(|d| MetricRecord {
            campaign_id: c.id,
            period_date: date(2024, 9, d),
            impressions: Some(25_000.0),
            clicks: Some(150.0),
            conversions: Some(2.0),
            leads: None,
            sessions: Some(120.0),
            cost: Some(500.0),
            revenue: Some(600.0),
            ltv: None,
        })
        .collect();
    let summaries = metrics::summarize_by_campaign(&rows);
    let summary = &summaries[&c.id];
    assert_eq!(summary.periods_recorded, 4);
    assert!((summary.ctr.unwrap() - 0.6).abs() < 1e-9);

    // CTR 0.6% < 0.8%, CPA R$ 250 > R$ 100, ROAS 1.2x in the low band.
    let rules: Vec<_> = AlertEvaluator::default()
        .evaluate(&[c.clone()], &summaries, as_of())
        .into_iter()
        .map(|a| a.rule)
        .collect();
    assert_eq!(
        rules,
        vec![AlertRule::RoasLow, AlertRule::LowCtr, AlertRule::HighCpa]
    );

    let plan = TacticalChannelPlan {
        project_id,
        channel: Channel::Meta,
        campaign_type: Some("conversions".to_string()),
        funnel_stage: None,
        bidding_strategy: None,
        metrics: vec![
            TacticalMetricTarget {
                metric: "conversions".to_string(),
                planned: 8.0,
                unit: None,
            },
            TacticalMetricTarget {
                metric: "cpa".to_string(),
                planned: 200.0,
                unit: Some("R$".to_string()),
            },
        ],
    };
    let project = GapAnalyzer::default().analyze_project(project_id, &[plan], &[c], &summaries);
    let meta = &project.channels[0];
    assert_eq!(meta.gaps[0].status, GapStatus::OnTrack);
    // CPA 25% above plan on a lower-is-better metric.
    assert_eq!(meta.gaps[1].gap_percent, Some(25.0));
    assert_eq!(meta.gaps[1].status, GapStatus::Below);
    assert_eq!(meta.structure_match.campaign_type, Some(true));
    // 0.3 * 100 + 0.7 * 75
    assert_eq!(meta.adherence_score, 83.0);
    assert_eq!(project.overall_adherence, 83.0);
}
