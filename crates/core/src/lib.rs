//! Shared data model, threshold configuration, and error type for the
//! campaign analytics engine.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ChannelThresholds};
pub use error::{CampaignError, CampaignResult};
pub use types::{
    BudgetAllocation, CampaignSnapshot, CampaignStatus, Channel, MetricRecord, MetricsSummary,
    TacticalChannelPlan, TacticalMetricTarget,
};
