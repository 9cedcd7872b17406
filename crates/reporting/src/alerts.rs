//! Rule-based performance alerts for running campaigns.
//!
//! Rules are evaluated independently per campaign in a fixed order, so a
//! campaign may raise several alerts. A rule whose metric has no data is
//! skipped; missing data never produces an alert.

use crate::budget::{expected_pacing, pacing_percent};
use crate::metrics::round_one;
use campaign_core::config::{AlertThresholds, AppConfig, ChannelThresholdTable};
use campaign_core::types::{CampaignSnapshot, CampaignStatus, Channel, MetricsSummary};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Budget,
    Efficiency,
    Conversion,
    Quality,
    Pacing,
    Trend,
}

/// The alert rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertRule {
    BudgetExhausted,
    BudgetNearlyExhausted,
    RoasNegative,
    RoasLow,
    NoConversions,
    NegativeRoi,
    UnfavorableCacLtv,
    SpendWithoutReturn,
    LowCtr,
    HighCpc,
    HighCpa,
    PacingLag,
    StaleCampaign,
}

impl AlertRule {
    pub fn key(&self) -> &'static str {
        match self {
            AlertRule::BudgetExhausted => "budget_exhausted",
            AlertRule::BudgetNearlyExhausted => "budget_nearly_exhausted",
            AlertRule::RoasNegative => "roas_negative",
            AlertRule::RoasLow => "roas_low",
            AlertRule::NoConversions => "no_conversions",
            AlertRule::NegativeRoi => "negative_roi",
            AlertRule::UnfavorableCacLtv => "unfavorable_cac_ltv",
            AlertRule::SpendWithoutReturn => "spend_without_return",
            AlertRule::LowCtr => "low_ctr",
            AlertRule::HighCpc => "high_cpc",
            AlertRule::HighCpa => "high_cpa",
            AlertRule::PacingLag => "pacing_lag",
            AlertRule::StaleCampaign => "stale_campaign",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertRule::BudgetExhausted
            | AlertRule::RoasNegative
            | AlertRule::NoConversions
            | AlertRule::NegativeRoi
            | AlertRule::UnfavorableCacLtv
            | AlertRule::SpendWithoutReturn => Severity::Critical,
            AlertRule::BudgetNearlyExhausted
            | AlertRule::RoasLow
            | AlertRule::LowCtr
            | AlertRule::HighCpc
            | AlertRule::HighCpa => Severity::Warning,
            AlertRule::PacingLag | AlertRule::StaleCampaign => Severity::Info,
        }
    }

    pub fn category(&self) -> AlertCategory {
        match self {
            AlertRule::BudgetExhausted | AlertRule::BudgetNearlyExhausted => AlertCategory::Budget,
            AlertRule::RoasNegative
            | AlertRule::RoasLow
            | AlertRule::NoConversions
            | AlertRule::SpendWithoutReturn => AlertCategory::Conversion,
            AlertRule::NegativeRoi | AlertRule::UnfavorableCacLtv => AlertCategory::Quality,
            AlertRule::LowCtr | AlertRule::HighCpc | AlertRule::HighCpa => AlertCategory::Efficiency,
            AlertRule::PacingLag => AlertCategory::Pacing,
            AlertRule::StaleCampaign => AlertCategory::Trend,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertRule::BudgetExhausted => "Budget exhausted",
            AlertRule::BudgetNearlyExhausted => "Budget nearly exhausted",
            AlertRule::RoasNegative => "Negative ROAS",
            AlertRule::RoasLow => "Low ROAS",
            AlertRule::NoConversions => "Clicks without conversions",
            AlertRule::NegativeRoi => "Negative accumulated ROI",
            AlertRule::UnfavorableCacLtv => "Unfavorable CAC:LTV",
            AlertRule::SpendWithoutReturn => "High spend with no return",
            AlertRule::LowCtr => "CTR below channel minimum",
            AlertRule::HighCpc => "CPC above channel maximum",
            AlertRule::HighCpa => "CPA above channel benchmark",
            AlertRule::PacingLag => "Spend pacing behind schedule",
            AlertRule::StaleCampaign => "No metrics recorded",
        }
    }
}

/// A single triggered rule. Carries the literal current value, threshold and
/// unit so the UI can render "current vs. limit" without recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAlert {
    /// `<campaign id>:<rule key>`; stable across evaluations.
    pub id: String,
    pub campaign_id: Uuid,
    pub campaign_name: String,
    pub channel: Channel,
    pub rule: AlertRule,
    pub severity: Severity,
    pub category: AlertCategory,
    pub title: String,
    pub description: String,
    pub current_value: f64,
    pub threshold: f64,
    pub unit: String,
}

/// Badge counts for a set of alerts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertDigest {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub by_category: BTreeMap<AlertCategory, usize>,
}

impl AlertDigest {
    pub fn from_alerts(alerts: &[PerformanceAlert]) -> Self {
        let mut digest = AlertDigest {
            total: alerts.len(),
            ..Default::default()
        };
        for alert in alerts {
            match alert.severity {
                Severity::Critical => digest.critical += 1,
                Severity::Warning => digest.warning += 1,
                Severity::Info => digest.info += 1,
            }
            *digest.by_category.entry(alert.category).or_insert(0) += 1;
        }
        digest
    }
}

/// Stable sort: critical first, then warning, then info. Relative order
/// within a severity is preserved.
pub fn prioritize(alerts: &mut [PerformanceAlert]) {
    alerts.sort_by_key(|a| a.severity);
}

// ---------------------------------------------------------------------------
// AlertEvaluator
// ---------------------------------------------------------------------------

const UNIT_PERCENT: &str = "%";
const UNIT_MULTIPLE: &str = "x";
const UNIT_CURRENCY: &str = "R$";

pub struct AlertEvaluator {
    thresholds: AlertThresholds,
    channels: ChannelThresholdTable,
}

impl AlertEvaluator {
    pub fn new(thresholds: AlertThresholds, channels: ChannelThresholdTable) -> Self {
        Self {
            thresholds,
            channels,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        info!(
            roas_critical = config.alerts.roas_critical,
            stale_days = config.alerts.stale_campaign_days,
            "Alert evaluator initialized"
        );
        Self::new(config.alerts.clone(), config.channels)
    }

    /// Evaluate every active or paused campaign. Output is ordered by
    /// campaign (input order), then by rule order.
    pub fn evaluate(
        &self,
        campaigns: &[CampaignSnapshot],
        summaries: &BTreeMap<Uuid, MetricsSummary>,
        as_of: NaiveDate,
    ) -> Vec<PerformanceAlert> {
        let mut alerts = Vec::new();
        let mut evaluated = 0usize;

        for campaign in campaigns.iter().filter(|c| c.status.is_evaluable()) {
            evaluated += 1;
            let found = self.evaluate_campaign(campaign, summaries.get(&campaign.id), as_of);
            debug!(
                campaign_id = %campaign.id,
                channel = %campaign.channel,
                alerts = found.len(),
                "campaign evaluated"
            );
            alerts.extend(found);
        }

        debug!(
            campaigns = campaigns.len(),
            evaluated,
            alerts = alerts.len(),
            "performance alerts evaluated"
        );
        alerts
    }

    /// Run all rules against one campaign, regardless of its status.
    pub fn evaluate_campaign(
        &self,
        campaign: &CampaignSnapshot,
        summary: Option<&MetricsSummary>,
        as_of: NaiveDate,
    ) -> Vec<PerformanceAlert> {
        let empty = MetricsSummary::default();
        let m = summary.unwrap_or(&empty);

        [
            self.budget_exhausted(campaign),
            self.budget_nearly_exhausted(campaign),
            self.roas_negative(campaign, m),
            self.roas_low(campaign, m),
            self.no_conversions(campaign, m),
            self.negative_roi(campaign, m),
            self.unfavorable_cac_ltv(campaign, m),
            self.spend_without_return(campaign, m),
            self.low_ctr(campaign, m),
            self.high_cpc(campaign, m),
            self.high_cpa(campaign, m),
            self.pacing_lag(campaign, as_of),
            self.stale_campaign(campaign, m, as_of),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    // -- budget rules -------------------------------------------------------

    fn budget_exhausted(&self, c: &CampaignSnapshot) -> Option<PerformanceAlert> {
        let ratio = c.budget_ratio()?;
        (ratio >= self.thresholds.budget_exhausted_ratio).then(|| {
            let pct = round_one(ratio * 100.0);
            alert(
                c,
                AlertRule::BudgetExhausted,
                pct,
                round_one(self.thresholds.budget_exhausted_ratio * 100.0),
                UNIT_PERCENT,
                format!(
                    "{pct:.1}% of the budget has been spent (R$ {:.2} of R$ {:.2})",
                    c.budget_spent, c.budget_total
                ),
            )
        })
    }

    fn budget_nearly_exhausted(&self, c: &CampaignSnapshot) -> Option<PerformanceAlert> {
        let ratio = c.budget_ratio()?;
        let t = &self.thresholds;
        (ratio >= t.budget_warning_ratio && ratio < t.budget_exhausted_ratio).then(|| {
            let pct = percent_below(ratio, t.budget_exhausted_ratio);
            alert(
                c,
                AlertRule::BudgetNearlyExhausted,
                pct,
                round_one(t.budget_warning_ratio * 100.0),
                UNIT_PERCENT,
                format!(
                    "{pct:.1}% of the budget has been spent; R$ {:.2} remaining",
                    c.budget_total - c.budget_spent
                ),
            )
        })
    }

    // -- return rules -------------------------------------------------------

    fn roas_negative(&self, c: &CampaignSnapshot, m: &MetricsSummary) -> Option<PerformanceAlert> {
        let roas = m.roas?;
        (roas < self.thresholds.roas_critical).then(|| {
            alert(
                c,
                AlertRule::RoasNegative,
                roas,
                self.thresholds.roas_critical,
                UNIT_MULTIPLE,
                format!("ROAS of {roas:.2}x: revenue does not cover ad spend"),
            )
        })
    }

    fn roas_low(&self, c: &CampaignSnapshot, m: &MetricsSummary) -> Option<PerformanceAlert> {
        let roas = m.roas?;
        let t = &self.thresholds;
        (roas >= t.roas_critical && roas < t.roas_warning).then(|| {
            alert(
                c,
                AlertRule::RoasLow,
                roas,
                t.roas_warning,
                UNIT_MULTIPLE,
                format!("ROAS of {roas:.2}x is below the {:.1}x target", t.roas_warning),
            )
        })
    }

    /// Needs clicks and at least one of conversions/leads; an unmeasured
    /// counter contributes nothing to the sum.
    fn no_conversions(&self, c: &CampaignSnapshot, m: &MetricsSummary) -> Option<PerformanceAlert> {
        let clicks = m.clicks?;
        if m.conversions.is_none() && m.leads.is_none() {
            return None;
        }
        let outcomes = m.conversions.unwrap_or(0.0) + m.leads.unwrap_or(0.0);
        (clicks >= self.thresholds.min_clicks_without_conversion && outcomes == 0.0).then(|| {
            alert(
                c,
                AlertRule::NoConversions,
                clicks,
                self.thresholds.min_clicks_without_conversion,
                "clicks",
                format!("{clicks:.0} clicks without a single conversion or lead"),
            )
        })
    }

    fn negative_roi(&self, c: &CampaignSnapshot, m: &MetricsSummary) -> Option<PerformanceAlert> {
        let roi = m.roi_accumulated?;
        (roi < 0.0).then(|| {
            alert(
                c,
                AlertRule::NegativeRoi,
                roi,
                0.0,
                UNIT_PERCENT,
                format!("Accumulated ROI is {roi:.1}%"),
            )
        })
    }

    fn unfavorable_cac_ltv(&self, c: &CampaignSnapshot, m: &MetricsSummary) -> Option<PerformanceAlert> {
        if c.channel != Channel::Google {
            return None;
        }
        let ratio = m.cac_ltv_ratio?;
        (ratio < 1.0).then(|| {
            alert(
                c,
                AlertRule::UnfavorableCacLtv,
                ratio,
                1.0,
                UNIT_MULTIPLE,
                format!("Customer lifetime value is only {ratio:.2}x the acquisition cost"),
            )
        })
    }

    fn spend_without_return(&self, c: &CampaignSnapshot, m: &MetricsSummary) -> Option<PerformanceAlert> {
        let cost = m.cost?;
        let conversions = m.conversions?;
        let revenue = m.revenue?;
        (cost >= self.thresholds.high_spend_cost && conversions == 0.0 && revenue == 0.0).then(|| {
            alert(
                c,
                AlertRule::SpendWithoutReturn,
                cost,
                self.thresholds.high_spend_cost,
                UNIT_CURRENCY,
                format!("R$ {cost:.2} spent with no conversions and no revenue"),
            )
        })
    }

    // -- efficiency rules ---------------------------------------------------

    fn low_ctr(&self, c: &CampaignSnapshot, m: &MetricsSummary) -> Option<PerformanceAlert> {
        let ctr = m.ctr?;
        let min = self.channels.for_channel(c.channel).min_ctr;
        (ctr < min).then(|| {
            alert(
                c,
                AlertRule::LowCtr,
                ctr,
                min,
                UNIT_PERCENT,
                format!("CTR of {ctr:.2}% is below the {} minimum of {min:.2}%", c.channel),
            )
        })
    }

    fn high_cpc(&self, c: &CampaignSnapshot, m: &MetricsSummary) -> Option<PerformanceAlert> {
        let cpc = m.cpc?;
        let max = self.channels.for_channel(c.channel).max_cpc;
        (cpc > max).then(|| {
            alert(
                c,
                AlertRule::HighCpc,
                cpc,
                max,
                UNIT_CURRENCY,
                format!("CPC of R$ {cpc:.2} exceeds the {} maximum of R$ {max:.2}", c.channel),
            )
        })
    }

    fn high_cpa(&self, c: &CampaignSnapshot, m: &MetricsSummary) -> Option<PerformanceAlert> {
        let cpa = m.cpa?;
        let max = self.channels.for_channel(c.channel).max_cpa;
        (cpa > max).then(|| {
            alert(
                c,
                AlertRule::HighCpa,
                cpa,
                max,
                UNIT_CURRENCY,
                format!("CPA of R$ {cpa:.2} exceeds the {} benchmark of R$ {max:.2}", c.channel),
            )
        })
    }

    // -- informational rules ------------------------------------------------

    fn pacing_lag(&self, c: &CampaignSnapshot, as_of: NaiveDate) -> Option<PerformanceAlert> {
        if c.budget_total <= 0.0 {
            return None;
        }
        let expected = expected_flight_pacing(c, as_of);
        if expected <= 0.0 {
            return None;
        }
        let actual = pacing_percent(c.budget_spent, c.budget_total);
        let limit = round_one(expected * self.thresholds.pacing_lag_ratio);
        (actual < limit).then(|| {
            alert(
                c,
                AlertRule::PacingLag,
                actual,
                limit,
                UNIT_PERCENT,
                format!("Spend pacing at {actual:.1}% while {expected:.1}% was expected by today"),
            )
        })
    }

    fn stale_campaign(
        &self,
        c: &CampaignSnapshot,
        m: &MetricsSummary,
        as_of: NaiveDate,
    ) -> Option<PerformanceAlert> {
        if c.status != CampaignStatus::Active || !m.is_empty() {
            return None;
        }
        let age_days = (as_of - c.start_date).num_days();
        (age_days >= self.thresholds.stale_campaign_days).then(|| {
            alert(
                c,
                AlertRule::StaleCampaign,
                age_days as f64,
                self.thresholds.stale_campaign_days as f64,
                "days",
                format!("Active for {age_days} days without any recorded metrics"),
            )
        })
    }
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new(AlertThresholds::default(), ChannelThresholdTable::default())
    }
}

/// `ratio` as a one-decimal percentage that stays below `ceiling`: a ratio
/// just under the ceiling is truncated instead of rounded up onto it.
fn percent_below(ratio: f64, ceiling: f64) -> f64 {
    let rounded = round_one(ratio * 100.0);
    if rounded >= round_one(ceiling * 100.0) {
        (ratio * 1_000.0).floor() / 10.0
    } else {
        rounded
    }
}

/// Expected pacing by `as_of`: the elapsed share of the campaign flight when
/// it has an end date, otherwise the elapsed share of the current month.
fn expected_flight_pacing(c: &CampaignSnapshot, as_of: NaiveDate) -> f64 {
    if as_of < c.start_date {
        return 0.0;
    }
    match c.end_date {
        Some(end) if end >= c.start_date => {
            let total_days = (end - c.start_date).num_days() + 1;
            let elapsed_days = ((as_of - c.start_date).num_days() + 1).min(total_days);
            round_one(elapsed_days as f64 / total_days as f64 * 100.0)
        }
        _ => expected_pacing(as_of),
    }
}

fn alert(
    campaign: &CampaignSnapshot,
    rule: AlertRule,
    current_value: f64,
    threshold: f64,
    unit: &str,
    description: String,
) -> PerformanceAlert {
    PerformanceAlert {
        id: format!("{}:{}", campaign.id, rule.key()),
        campaign_id: campaign.id,
        campaign_name: campaign.name.clone(),
        channel: campaign.channel,
        rule,
        severity: rule.severity(),
        category: rule.category(),
        title: rule.title().to_string(),
        description,
        current_value,
        threshold,
        unit: unit.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
