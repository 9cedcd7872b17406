use crate::error::{CampaignError, CampaignResult};
use crate::types::Channel;
use serde::Deserialize;
use std::path::Path;

/// Root analytics configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `CAMPAIGN_INSIGHTS__`.
///
/// The alert-rule budget bands and the pacing status bands are independent
/// threshold sets.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub alerts: AlertThresholds,
    #[serde(default)]
    pub pacing: PacingBands,
    #[serde(default)]
    pub gaps: GapBands,
    #[serde(default)]
    pub adherence: AdherenceWeights,
    #[serde(default)]
    pub channels: ChannelThresholdTable,
}

/// Cut-offs used by the performance alert rules.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertThresholds {
    #[serde(default = "default_budget_exhausted_ratio")]
    pub budget_exhausted_ratio: f64,
    #[serde(default = "default_budget_warning_ratio")]
    pub budget_warning_ratio: f64,
    #[serde(default = "default_roas_critical")]
    pub roas_critical: f64,
    #[serde(default = "default_roas_warning")]
    pub roas_warning: f64,
    #[serde(default = "default_min_clicks_without_conversion")]
    pub min_clicks_without_conversion: f64,
    #[serde(default = "default_high_spend_cost")]
    pub high_spend_cost: f64,
    /// Actual pacing below `expected * ratio` raises the pacing-lag info alert.
    #[serde(default = "default_pacing_lag_ratio")]
    pub pacing_lag_ratio: f64,
    #[serde(default = "default_stale_campaign_days")]
    pub stale_campaign_days: i64,
}

/// Status-tier bands for budget pacing percentages.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PacingBands {
    #[serde(default = "default_pacing_attention")]
    pub attention: f64,
    #[serde(default = "default_pacing_danger")]
    pub danger: f64,
    #[serde(default = "default_pacing_overspent")]
    pub overspent: f64,
}

/// Deviation bands (in percent) for tactical-vs-real metric gaps.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GapBands {
    #[serde(default = "default_on_track_tolerance")]
    pub on_track_tolerance: f64,
    #[serde(default = "default_critical_deviation")]
    pub critical_deviation: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AdherenceWeights {
    #[serde(default = "default_structural_weight")]
    pub structural: f64,
    #[serde(default = "default_metric_weight")]
    pub metric: f64,
    /// Points awarded to a `below` gap; on-track/above earn 100, critical 0.
    #[serde(default = "default_below_points")]
    pub below_points: f64,
}

/// Efficiency limits for one channel. CTR is a percentage, CPC and CPA are
/// currency amounts (R$).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ChannelThresholds {
    pub min_ctr: f64,
    pub max_cpc: f64,
    pub max_cpa: f64,
}

impl ChannelThresholds {
    pub const GOOGLE: ChannelThresholds = ChannelThresholds {
        min_ctr: 1.5,
        max_cpc: 8.0,
        max_cpa: 150.0,
    };
    pub const META: ChannelThresholds = ChannelThresholds {
        min_ctr: 0.8,
        max_cpc: 5.0,
        max_cpa: 100.0,
    };
    pub const LINKEDIN: ChannelThresholds = ChannelThresholds {
        min_ctr: 0.4,
        max_cpc: 15.0,
        max_cpa: 250.0,
    };
    pub const TIKTOK: ChannelThresholds = ChannelThresholds {
        min_ctr: 0.5,
        max_cpc: 4.0,
        max_cpa: 80.0,
    };

    /// Built-in benchmark for a channel.
    pub const fn builtin(channel: Channel) -> ChannelThresholds {
        match channel {
            Channel::Google => Self::GOOGLE,
            Channel::Meta => Self::META,
            Channel::Linkedin => Self::LINKEDIN,
            Channel::Tiktok => Self::TIKTOK,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChannelThresholdTable {
    #[serde(default = "default_google")]
    pub google: ChannelThresholds,
    #[serde(default = "default_meta")]
    pub meta: ChannelThresholds,
    #[serde(default = "default_linkedin")]
    pub linkedin: ChannelThresholds,
    #[serde(default = "default_tiktok")]
    pub tiktok: ChannelThresholds,
}

impl ChannelThresholdTable {
    pub fn for_channel(&self, channel: Channel) -> &ChannelThresholds {
        match channel {
            Channel::Google => &self.google,
            Channel::Meta => &self.meta,
            Channel::Linkedin => &self.linkedin,
            Channel::Tiktok => &self.tiktok,
        }
    }
}

// Default functions
fn default_budget_exhausted_ratio() -> f64 {
    1.0
}
fn default_budget_warning_ratio() -> f64 {
    0.90
}
fn default_roas_critical() -> f64 {
    1.0
}
fn default_roas_warning() -> f64 {
    2.0
}
fn default_min_clicks_without_conversion() -> f64 {
    50.0
}
fn default_high_spend_cost() -> f64 {
    500.0
}
fn default_pacing_lag_ratio() -> f64 {
    0.5
}
fn default_stale_campaign_days() -> i64 {
    7
}
fn default_pacing_attention() -> f64 {
    80.0
}
fn default_pacing_danger() -> f64 {
    95.0
}
fn default_pacing_overspent() -> f64 {
    100.0
}
fn default_on_track_tolerance() -> f64 {
    10.0
}
fn default_critical_deviation() -> f64 {
    30.0
}
fn default_structural_weight() -> f64 {
    0.30
}
fn default_metric_weight() -> f64 {
    0.70
}
fn default_below_points() -> f64 {
    50.0
}
fn default_google() -> ChannelThresholds {
    ChannelThresholds::GOOGLE
}
fn default_meta() -> ChannelThresholds {
    ChannelThresholds::META
}
fn default_linkedin() -> ChannelThresholds {
    ChannelThresholds::LINKEDIN
}
fn default_tiktok() -> ChannelThresholds {
    ChannelThresholds::TIKTOK
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            budget_exhausted_ratio: default_budget_exhausted_ratio(),
            budget_warning_ratio: default_budget_warning_ratio(),
            roas_critical: default_roas_critical(),
            roas_warning: default_roas_warning(),
            min_clicks_without_conversion: default_min_clicks_without_conversion(),
            high_spend_cost: default_high_spend_cost(),
            pacing_lag_ratio: default_pacing_lag_ratio(),
            stale_campaign_days: default_stale_campaign_days(),
        }
    }
}

impl Default for PacingBands {
    fn default() -> Self {
        Self {
            attention: default_pacing_attention(),
            danger: default_pacing_danger(),
            overspent: default_pacing_overspent(),
        }
    }
}

impl Default for GapBands {
    fn default() -> Self {
        Self {
            on_track_tolerance: default_on_track_tolerance(),
            critical_deviation: default_critical_deviation(),
        }
    }
}

impl Default for AdherenceWeights {
    fn default() -> Self {
        Self {
            structural: default_structural_weight(),
            metric: default_metric_weight(),
            below_points: default_below_points(),
        }
    }
}

impl Default for ChannelThresholdTable {
    fn default() -> Self {
        Self {
            google: default_google(),
            meta: default_meta(),
            linkedin: default_linkedin(),
            tiktok: default_tiktok(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            alerts: AlertThresholds::default(),
            pacing: PacingBands::default(),
            gaps: GapBands::default(),
            adherence: AdherenceWeights::default(),
            channels: ChannelThresholdTable::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file overlaid with
    /// environment variables, then validate it.
    pub fn load(file: Option<&Path>) -> CampaignResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("CAMPAIGN_INSIGHTS")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject threshold sets that would make the calculators contradict
    /// themselves.
    pub fn validate(&self) -> CampaignResult<()> {
        let p = &self.pacing;
        if !(p.attention > 0.0 && p.attention < p.danger && p.danger <= p.overspent) {
            return Err(invalid(format!(
                "pacing bands must satisfy 0 < attention < danger <= overspent (got {}/{}/{})",
                p.attention, p.danger, p.overspent
            )));
        }

        let g = &self.gaps;
        if !(g.on_track_tolerance >= 0.0 && g.on_track_tolerance < g.critical_deviation) {
            return Err(invalid(format!(
                "gap bands must satisfy 0 <= on_track_tolerance < critical_deviation (got {}/{})",
                g.on_track_tolerance, g.critical_deviation
            )));
        }

        let a = &self.alerts;
        if !(a.budget_warning_ratio > 0.0 && a.budget_warning_ratio < a.budget_exhausted_ratio) {
            return Err(invalid(format!(
                "budget warning ratio {} must be positive and below exhausted ratio {}",
                a.budget_warning_ratio, a.budget_exhausted_ratio
            )));
        }
        if a.roas_critical >= a.roas_warning {
            return Err(invalid(format!(
                "roas_critical {} must be below roas_warning {}",
                a.roas_critical, a.roas_warning
            )));
        }
        if !(a.pacing_lag_ratio > 0.0 && a.pacing_lag_ratio <= 1.0) {
            return Err(invalid(format!(
                "pacing_lag_ratio {} must be in (0, 1]",
                a.pacing_lag_ratio
            )));
        }
        if a.stale_campaign_days <= 0 {
            return Err(invalid(format!(
                "stale_campaign_days {} must be positive",
                a.stale_campaign_days
            )));
        }

        let w = &self.adherence;
        if w.structural < 0.0 || w.metric < 0.0 || (w.structural + w.metric - 1.0).abs() > 1e-9 {
            return Err(invalid(format!(
                "adherence weights must be non-negative and sum to 1.0 (got {} + {})",
                w.structural, w.metric
            )));
        }
        if !(0.0..=100.0).contains(&w.below_points) {
            return Err(invalid(format!(
                "below_points {} must be within [0, 100]",
                w.below_points
            )));
        }

        for channel in Channel::ALL {
            let t = self.channels.for_channel(channel);
            let limits = [t.min_ctr, t.max_cpc, t.max_cpa];
            if limits.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(invalid(format!(
                    "{channel} thresholds must be positive and finite"
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> CampaignError {
    CampaignError::Validation(message)
}
