use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Paid-media channel a campaign runs on. Drives which threshold and metric
/// set applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Google,
    Meta,
    Linkedin,
    Tiktok,
}

impl Channel {
    /// Canonical display order used by every per-channel breakdown.
    pub const ALL: [Channel; 4] = [
        Channel::Google,
        Channel::Meta,
        Channel::Linkedin,
        Channel::Tiktok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Google => "google",
            Channel::Meta => "meta",
            Channel::Linkedin => "linkedin",
            Channel::Tiktok => "tiktok",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Archived,
}

impl CampaignStatus {
    /// Only running (or temporarily paused) campaigns receive alerts.
    pub fn is_evaluable(&self) -> bool {
        matches!(self, CampaignStatus::Active | CampaignStatus::Paused)
    }
}

/// Read-only view of a campaign row as loaded by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub id: Uuid,
    pub project_id: Uuid,
    #[serde(default)]
    pub name: String,
    pub channel: Channel,
    pub status: CampaignStatus,
    pub budget_total: f64,
    pub budget_spent: f64,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Structural attributes compared against the tactical plan.
    #[serde(default)]
    pub campaign_type: Option<String>,
    #[serde(default)]
    pub funnel_stage: Option<String>,
    #[serde(default)]
    pub bidding_strategy: Option<String>,
}

impl CampaignSnapshot {
    /// `budget_spent / budget_total`, or `None` when no budget is set.
    pub fn budget_ratio(&self) -> Option<f64> {
        if self.budget_total > 0.0 {
            Some(self.budget_spent / self.budget_total)
        } else {
            None
        }
    }
}

/// One periodic row from the campaign metrics table. Missing fields were
/// never measured for that period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricRecord {
    pub campaign_id: Uuid,
    pub period_date: NaiveDate,
    #[serde(default)]
    pub impressions: Option<f64>,
    #[serde(default)]
    pub clicks: Option<f64>,
    #[serde(default)]
    pub conversions: Option<f64>,
    #[serde(default)]
    pub leads: Option<f64>,
    #[serde(default)]
    pub sessions: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub ltv: Option<f64>,
}

/// Aggregated counters and ratios for a campaign over its recorded periods.
///
/// `None` means "no data" and is never interpreted as zero. CTR and ROI are
/// percentages; ROAS and the CAC:LTV ratio are multiples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    #[serde(default)]
    pub periods_recorded: u32,
    #[serde(default)]
    pub impressions: Option<f64>,
    #[serde(default)]
    pub clicks: Option<f64>,
    #[serde(default)]
    pub conversions: Option<f64>,
    #[serde(default)]
    pub leads: Option<f64>,
    #[serde(default)]
    pub sessions: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub ctr: Option<f64>,
    #[serde(default)]
    pub cpc: Option<f64>,
    #[serde(default)]
    pub cpa: Option<f64>,
    #[serde(default)]
    pub cpl: Option<f64>,
    #[serde(default)]
    pub roas: Option<f64>,
    #[serde(default)]
    pub cac: Option<f64>,
    #[serde(default)]
    pub ltv: Option<f64>,
    #[serde(default)]
    pub cac_ltv_ratio: Option<f64>,
    #[serde(default)]
    pub roi_accumulated: Option<f64>,
}

impl MetricsSummary {
    /// Look up a metric by the name used in tactical plans. Unknown names
    /// have no data.
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name.trim().to_ascii_lowercase().as_str() {
            "impressions" => self.impressions,
            "clicks" => self.clicks,
            "conversions" => self.conversions,
            "leads" => self.leads,
            "sessions" => self.sessions,
            "cost" | "spend" | "investment" => self.cost,
            "revenue" => self.revenue,
            "ctr" => self.ctr,
            "cpc" => self.cpc,
            "cpa" => self.cpa,
            "cpl" => self.cpl,
            "roas" => self.roas,
            "cac" => self.cac,
            "ltv" => self.ltv,
            "cac_ltv_ratio" | "cac_ltv" | "ltv_cac" => self.cac_ltv_ratio,
            "roi" | "roi_accumulated" => self.roi_accumulated,
            _ => None,
        }
    }

    /// True when no period was recorded and every metric is absent.
    pub fn is_empty(&self) -> bool {
        self.periods_recorded == 0
            && [
                self.impressions,
                self.clicks,
                self.conversions,
                self.leads,
                self.sessions,
                self.cost,
                self.revenue,
                self.ctr,
                self.cpc,
                self.cpa,
                self.cpl,
                self.roas,
                self.cac,
                self.ltv,
                self.cac_ltv_ratio,
                self.roi_accumulated,
            ]
            .iter()
            .all(Option::is_none)
    }
}

/// Planned vs. actual spend for one channel in one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub project_id: Uuid,
    pub channel: Channel,
    pub month: u32,
    pub year: i32,
    pub planned_budget: f64,
    #[serde(default)]
    pub actual_spent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalMetricTarget {
    pub metric: String,
    pub planned: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

/// The tactical plan for one channel of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalChannelPlan {
    pub project_id: Uuid,
    pub channel: Channel,
    #[serde(default)]
    pub campaign_type: Option<String>,
    #[serde(default)]
    pub funnel_stage: Option<String>,
    #[serde(default)]
    pub bidding_strategy: Option<String>,
    #[serde(default)]
    pub metrics: Vec<TacticalMetricTarget>,
}
