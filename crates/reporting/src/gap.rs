//! Tactical-plan vs. real-execution gap analysis and adherence scoring.

use crate::metrics::{self, round_one};
use campaign_core::config::{AdherenceWeights, AppConfig, GapBands};
use campaign_core::types::{
    CampaignSnapshot, CampaignStatus, Channel, MetricsSummary, TacticalChannelPlan,
    TacticalMetricTarget,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapStatus {
    OnTrack,
    Above,
    Below,
    Critical,
    NoData,
}

/// Which direction of deviation from plan is good news.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricPolarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl MetricPolarity {
    /// Cost-type metrics are better below plan; everything else above.
    pub fn for_metric(metric: &str) -> Self {
        match metric.trim().to_ascii_lowercase().as_str() {
            "cost" | "spend" | "investment" | "cpc" | "cpm" | "cpa" | "cpl" | "cac" => {
                MetricPolarity::LowerIsBetter
            }
            _ => MetricPolarity::HigherIsBetter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricGap {
    pub metric: String,
    pub planned: f64,
    pub actual: Option<f64>,
    /// `(actual - planned) / planned * 100`; `None` without data or plan.
    pub gap_percent: Option<f64>,
    pub status: GapStatus,
    pub unit: Option<String>,
}

/// Whether real campaigns follow each structural choice of the plan.
/// `None` means the plan leaves that dimension unspecified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureMatch {
    pub campaign_type: Option<bool>,
    pub funnel_stage: Option<bool>,
    pub bidding_strategy: Option<bool>,
}

impl StructureMatch {
    fn dimensions(&self) -> [Option<bool>; 3] {
        [self.campaign_type, self.funnel_stage, self.bidding_strategy]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelGapAnalysis {
    pub channel: Channel,
    pub plan: Option<TacticalChannelPlan>,
    pub campaign_count: usize,
    pub gaps: Vec<MetricGap>,
    pub structure_match: StructureMatch,
    pub adherence_score: f64,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectGapAnalysis {
    pub project_id: Uuid,
    pub channels: Vec<ChannelGapAnalysis>,
    /// Mean adherence over channels that have a plan.
    pub overall_adherence: f64,
    pub planned_channel_count: usize,
}

pub const SUMMARY_PLAN_WITHOUT_CAMPAIGNS: &str = "Plan defined, no campaigns in execution.";
pub const SUMMARY_CAMPAIGNS_WITHOUT_PLAN: &str = "Campaigns running without a tactical plan.";

// ---------------------------------------------------------------------------
// GapAnalyzer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct GapAnalyzer {
    bands: GapBands,
    weights: AdherenceWeights,
}

impl GapAnalyzer {
    pub fn new(bands: GapBands, weights: AdherenceWeights) -> Self {
        Self { bands, weights }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        info!(
            on_track_tolerance = config.gaps.on_track_tolerance,
            critical_deviation = config.gaps.critical_deviation,
            "Gap analyzer initialized"
        );
        Self::new(config.gaps, config.adherence)
    }

    /// Compare each planned target with its actual value. A target without
    /// an actual value, or planned at zero, is `no_data`.
    pub fn build_metric_gaps(
        &self,
        targets: &[TacticalMetricTarget],
        actuals: &BTreeMap<String, Option<f64>>,
    ) -> Vec<MetricGap> {
        targets
            .iter()
            .map(|target| {
                let actual = actuals.get(&target.metric).copied().flatten();
                let deviation = match actual {
                    Some(value) if target.planned != 0.0 => {
                        Some((value - target.planned) / target.planned * 100.0)
                    }
                    _ => None,
                };
                // Classified on the exact deviation; only the reported figure is rounded.
                let status = match deviation {
                    Some(gap) => self.gap_status(&target.metric, gap),
                    None => GapStatus::NoData,
                };
                let gap_percent = deviation.map(round_one);

                MetricGap {
                    metric: target.metric.clone(),
                    planned: target.planned,
                    actual,
                    gap_percent,
                    status,
                    unit: target.unit.clone(),
                }
            })
            .collect()
    }

    /// Classify a deviation, flipping its sign for lower-is-better metrics
    /// so that positive always means favorable.
    pub fn gap_status(&self, metric: &str, gap_percent: f64) -> GapStatus {
        let favorable = match MetricPolarity::for_metric(metric) {
            MetricPolarity::HigherIsBetter => gap_percent,
            MetricPolarity::LowerIsBetter => -gap_percent,
        };

        if favorable.abs() < self.bands.on_track_tolerance {
            GapStatus::OnTrack
        } else if favorable > 0.0 {
            GapStatus::Above
        } else if -favorable >= self.bands.critical_deviation {
            GapStatus::Critical
        } else {
            GapStatus::Below
        }
    }

    /// Composite 0–100 score: weighted structural share plus mean metric
    /// points. A component without any measurable input drops out and the
    /// other takes its full weight.
    pub fn compute_adherence_score(&self, gaps: &[MetricGap], structure: &StructureMatch) -> f64 {
        let specified: Vec<bool> = structure.dimensions().into_iter().flatten().collect();
        let structural = if specified.is_empty() {
            None
        } else {
            let matched = specified.iter().filter(|m| **m).count();
            Some(matched as f64 / specified.len() as f64 * 100.0)
        };

        let points: Vec<f64> = gaps.iter().filter_map(|g| self.points(g.status)).collect();
        let metric = if points.is_empty() {
            None
        } else {
            Some(points.iter().sum::<f64>() / points.len() as f64)
        };

        let score = match (structural, metric) {
            (Some(s), Some(m)) => self.weights.structural * s + self.weights.metric * m,
            (Some(s), None) => s,
            (None, Some(m)) => m,
            (None, None) => 0.0,
        };
        score.clamp(0.0, 100.0).round()
    }

    fn points(&self, status: GapStatus) -> Option<f64> {
        match status {
            GapStatus::OnTrack | GapStatus::Above => Some(100.0),
            GapStatus::Below => Some(self.weights.below_points),
            GapStatus::Critical => Some(0.0),
            GapStatus::NoData => None,
        }
    }

    /// Analyze one channel of a project. `campaigns` may contain other
    /// channels; only this channel's non-draft, non-archived campaigns count.
    pub fn analyze_channel(
        &self,
        channel: Channel,
        plan: Option<&TacticalChannelPlan>,
        campaigns: &[CampaignSnapshot],
        summaries: &BTreeMap<Uuid, MetricsSummary>,
    ) -> ChannelGapAnalysis {
        let executing: Vec<&CampaignSnapshot> = campaigns
            .iter()
            .filter(|c| c.channel == channel && in_execution(c.status))
            .collect();

        let analysis = match plan {
            None => ChannelGapAnalysis {
                channel,
                plan: None,
                campaign_count: executing.len(),
                gaps: Vec::new(),
                structure_match: StructureMatch::default(),
                adherence_score: 0.0,
                summary: SUMMARY_CAMPAIGNS_WITHOUT_PLAN.to_string(),
            },
            Some(plan) if executing.is_empty() => ChannelGapAnalysis {
                channel,
                plan: Some(plan.clone()),
                campaign_count: 0,
                gaps: self.build_metric_gaps(&plan.metrics, &BTreeMap::new()),
                structure_match: structure_match(plan, &executing),
                adherence_score: 0.0,
                summary: SUMMARY_PLAN_WITHOUT_CAMPAIGNS.to_string(),
            },
            Some(plan) => {
                let rollup =
                    metrics::merge(executing.iter().filter_map(|c| summaries.get(&c.id)));
                let actuals =
                    metrics::actuals_for(&rollup, plan.metrics.iter().map(|t| t.metric.as_str()));
                let gaps = self.build_metric_gaps(&plan.metrics, &actuals);
                let structure = structure_match(plan, &executing);
                let adherence_score = self.compute_adherence_score(&gaps, &structure);
                let summary = describe(adherence_score, &gaps);

                ChannelGapAnalysis {
                    channel,
                    plan: Some(plan.clone()),
                    campaign_count: executing.len(),
                    gaps,
                    structure_match: structure,
                    adherence_score,
                    summary,
                }
            }
        };

        debug!(
            channel = %channel,
            campaigns = analysis.campaign_count,
            adherence = analysis.adherence_score,
            "channel gap analyzed"
        );
        analysis
    }

    /// Analyze every channel of a project that has a plan or a campaign.
    /// Unplanned channels are reported but excluded from the overall mean.
    pub fn analyze_project(
        &self,
        project_id: Uuid,
        plans: &[TacticalChannelPlan],
        campaigns: &[CampaignSnapshot],
        summaries: &BTreeMap<Uuid, MetricsSummary>,
    ) -> ProjectGapAnalysis {
        let project_campaigns: Vec<CampaignSnapshot> = campaigns
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();

        let channels: Vec<ChannelGapAnalysis> = Channel::ALL
            .into_iter()
            .filter_map(|channel| {
                let plan = plans
                    .iter()
                    .find(|p| p.project_id == project_id && p.channel == channel);
                let has_campaigns = project_campaigns
                    .iter()
                    .any(|c| c.channel == channel && in_execution(c.status));
                if plan.is_none() && !has_campaigns {
                    return None;
                }
                Some(self.analyze_channel(channel, plan, &project_campaigns, summaries))
            })
            .collect();

        let planned: Vec<f64> = channels
            .iter()
            .filter(|c| c.plan.is_some())
            .map(|c| c.adherence_score)
            .collect();
        let overall_adherence = if planned.is_empty() {
            0.0
        } else {
            (planned.iter().sum::<f64>() / planned.len() as f64).round()
        };

        ProjectGapAnalysis {
            project_id,
            planned_channel_count: planned.len(),
            overall_adherence,
            channels,
        }
    }
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self::new(GapBands::default(), AdherenceWeights::default())
    }
}

fn in_execution(status: CampaignStatus) -> bool {
    !matches!(status, CampaignStatus::Draft | CampaignStatus::Archived)
}

fn same_value(planned: &str, actual: Option<&String>) -> bool {
    actual.is_some_and(|a| a.trim().eq_ignore_ascii_case(planned))
}

/// A dimension matches when any executing campaign carries the planned value.
fn structure_match(plan: &TacticalChannelPlan, campaigns: &[&CampaignSnapshot]) -> StructureMatch {
    StructureMatch {
        campaign_type: dimension_match(plan.campaign_type.as_ref(), campaigns, |c| {
            c.campaign_type.as_ref()
        }),
        funnel_stage: dimension_match(plan.funnel_stage.as_ref(), campaigns, |c| {
            c.funnel_stage.as_ref()
        }),
        bidding_strategy: dimension_match(plan.bidding_strategy.as_ref(), campaigns, |c| {
            c.bidding_strategy.as_ref()
        }),
    }
}

fn dimension_match(
    planned: Option<&String>,
    campaigns: &[&CampaignSnapshot],
    pick: fn(&CampaignSnapshot) -> Option<&String>,
) -> Option<bool> {
    let planned = planned.map(|p| p.trim()).filter(|p| !p.is_empty())?;
    Some(campaigns.iter().any(|c| same_value(planned, pick(c))))
}

fn describe(score: f64, gaps: &[MetricGap]) -> String {
    let measured = gaps.iter().filter(|g| g.status != GapStatus::NoData).count();
    if measured == 0 {
        return format!("Adherence {score:.0}/100: no metric data recorded yet.");
    }
    let healthy = gaps
        .iter()
        .filter(|g| matches!(g.status, GapStatus::OnTrack | GapStatus::Above))
        .count();
    let critical = gaps.iter().filter(|g| g.status == GapStatus::Critical).count();
    format!(
        "Adherence {score:.0}/100: {healthy} of {measured} measured metrics on track or above plan, {critical} critical."
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
