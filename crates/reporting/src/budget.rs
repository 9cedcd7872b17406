//! Budget pacing, status tiers, and linear spend projection.

use crate::metrics::round_one;
use campaign_core::config::PacingBands;
use campaign_core::types::{BudgetAllocation, Channel};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Status tier of a pacing percentage, used for the dashboard colour band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStatus {
    /// Below the attention band.
    Healthy,
    /// `[attention, danger)`.
    Attention,
    /// `[danger, overspent]`, both ends inclusive.
    Danger,
    /// Strictly above the overspent mark.
    Overspent,
}

/// Linear end-of-period spend projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpendProjection {
    pub projected_spend: f64,
    /// `projected_spend / total_planned * 100`, 0.0 when nothing is planned.
    pub projected_pacing: f64,
    pub will_overspend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBudgetBreakdown {
    pub channel: Channel,
    pub planned: f64,
    pub spent: f64,
    /// Negative when the channel overspent.
    pub remaining: f64,
    pub pacing: f64,
    pub status: PacingStatus,
}

/// All allocations of one project for one month, rolled up across channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProjectSummary {
    pub project_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub total_planned: f64,
    pub total_spent: f64,
    /// Negative when the project overspent.
    pub total_remaining: f64,
    pub overall_pacing: f64,
    pub status: PacingStatus,
    pub channels: Vec<ChannelBudgetBreakdown>,
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// `spent / planned * 100` rounded to one decimal, or 0.0 when nothing is
/// planned.
pub fn pacing_percent(spent: f64, planned: f64) -> f64 {
    if planned > 0.0 {
        round_one(spent / planned * 100.0)
    } else {
        0.0
    }
}

/// Number of days in the given month, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// Share of the current month elapsed on `today`, as a percentage. This is a
/// visual reference marker, not an alert trigger.
pub fn expected_pacing(today: NaiveDate) -> f64 {
    match days_in_month(today.year(), today.month()) {
        Some(days) => round_one(today.day() as f64 / days as f64 * 100.0),
        None => 0.0,
    }
}

/// Fraction of `(year, month)` that has elapsed on `today`: 1.0 for past
/// months, 0.0 for future months.
pub fn elapsed_fraction_of_month(year: i32, month: u32, today: NaiveDate) -> f64 {
    let Some(days) = days_in_month(year, month) else {
        return 0.0;
    };
    match (year, month).cmp(&(today.year(), today.month())) {
        std::cmp::Ordering::Less => 1.0,
        std::cmp::Ordering::Greater => 0.0,
        std::cmp::Ordering::Equal => today.day() as f64 / days as f64,
    }
}

/// Linear extrapolation `spent / elapsed_fraction`. With no elapsed time
/// there is nothing to extrapolate and the projection is the spend so far.
pub fn projection(spent_so_far: f64, total_planned: f64, elapsed_fraction: f64) -> SpendProjection {
    let projected_spend = if elapsed_fraction > 0.0 {
        spent_so_far / elapsed_fraction.min(1.0)
    } else {
        spent_so_far
    };

    SpendProjection {
        projected_spend,
        projected_pacing: pacing_percent(projected_spend, total_planned),
        will_overspend: projected_spend > total_planned,
    }
}

/// Projection for a monthly summary as of `today`.
pub fn project_month(summary: &BudgetProjectSummary, today: NaiveDate) -> SpendProjection {
    let elapsed = elapsed_fraction_of_month(summary.year, summary.month, today);
    projection(summary.total_spent, summary.total_planned, elapsed)
}

// ---------------------------------------------------------------------------
// PacingCalculator
// ---------------------------------------------------------------------------

/// Classifies pacing percentages and rolls allocations up into monthly
/// project summaries.
#[derive(Debug, Clone, Copy)]
pub struct PacingCalculator {
    bands: PacingBands,
}

impl PacingCalculator {
    pub fn new(bands: PacingBands) -> Self {
        Self { bands }
    }

    /// Status tier for a pacing percentage: `<attention` healthy,
    /// `[attention, danger)` attention, `[danger, overspent]` danger,
    /// `>overspent` overspent.
    pub fn pacing_status(&self, pacing_percent: f64) -> PacingStatus {
        if pacing_percent > self.bands.overspent {
            PacingStatus::Overspent
        } else if pacing_percent >= self.bands.danger {
            PacingStatus::Danger
        } else if pacing_percent >= self.bands.attention {
            PacingStatus::Attention
        } else {
            PacingStatus::Healthy
        }
    }

    /// Status tier for spend against plan, classified on the exact ratio so
    /// that any overspend reads as overspent. Nothing planned is healthy.
    pub fn status_for(&self, spent: f64, planned: f64) -> PacingStatus {
        if planned > 0.0 {
            self.pacing_status(spent / planned * 100.0)
        } else {
            PacingStatus::Healthy
        }
    }

    /// Group allocations by (project, year, month), ordered ascending, and
    /// sum planned/spent across channels.
    pub fn build_project_summary(&self, allocations: &[BudgetAllocation]) -> Vec<BudgetProjectSummary> {
        let mut grouped: BTreeMap<(Uuid, i32, u32), BTreeMap<Channel, (f64, f64)>> = BTreeMap::new();
        for alloc in allocations {
            let totals = grouped
                .entry((alloc.project_id, alloc.year, alloc.month))
                .or_default()
                .entry(alloc.channel)
                .or_insert((0.0, 0.0));
            totals.0 += alloc.planned_budget;
            totals.1 += alloc.actual_spent;
        }

        let summaries: Vec<BudgetProjectSummary> = grouped
            .into_iter()
            .map(|((project_id, year, month), by_channel)| {
                let channels: Vec<ChannelBudgetBreakdown> = by_channel
                    .into_iter()
                    .map(|(channel, (planned, spent))| {
                        ChannelBudgetBreakdown {
                            channel,
                            planned,
                            spent,
                            remaining: planned - spent,
                            pacing: pacing_percent(spent, planned),
                            status: self.status_for(spent, planned),
                        }
                    })
                    .collect();

                let total_planned: f64 = channels.iter().map(|c| c.planned).sum();
                let total_spent: f64 = channels.iter().map(|c| c.spent).sum();

                BudgetProjectSummary {
                    project_id,
                    year,
                    month,
                    total_planned,
                    total_spent,
                    total_remaining: total_planned - total_spent,
                    overall_pacing: pacing_percent(total_spent, total_planned),
                    status: self.status_for(total_spent, total_planned),
                    channels,
                }
            })
            .collect();

        debug!(
            allocations = allocations.len(),
            summaries = summaries.len(),
            "budget summaries built"
        );
        summaries
    }
}

impl Default for PacingCalculator {
    fn default() -> Self {
        Self::new(PacingBands::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
