//! Dashboard snapshot files: the records the dashboard loads from its data
//! store, dumped as one JSON document.

use anyhow::Context;
use campaign_core::types::{
    BudgetAllocation, CampaignSnapshot, MetricRecord, MetricsSummary, TacticalChannelPlan,
};
use campaign_reporting::metrics;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub campaigns: Vec<CampaignSnapshot>,
    /// Raw periodic rows; summarized per campaign on load.
    #[serde(default)]
    pub metric_records: Vec<MetricRecord>,
    /// Pre-aggregated summaries. These take precedence over summaries
    /// derived from `metric_records` for the same campaign.
    #[serde(default)]
    pub summaries: BTreeMap<Uuid, MetricsSummary>,
    #[serde(default)]
    pub allocations: Vec<BudgetAllocation>,
    #[serde(default)]
    pub plans: Vec<TacticalChannelPlan>,
}

impl DashboardSnapshot {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing snapshot {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Per-campaign summaries from both sources.
    pub fn campaign_summaries(&self) -> BTreeMap<Uuid, MetricsSummary> {
        let mut summaries = metrics::summarize_by_campaign(&self.metric_records);
        summaries.extend(self.summaries.iter().map(|(id, s)| (*id, s.clone())));
        summaries
    }

    /// Every project referenced by a plan or a campaign, in id order.
    pub fn project_ids(&self) -> BTreeSet<Uuid> {
        self.plans
            .iter()
            .map(|p| p.project_id)
            .chain(self.campaigns.iter().map(|c| c.project_id))
            .collect()
    }
}
