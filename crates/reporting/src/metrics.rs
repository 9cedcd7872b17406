//! Aggregation of periodic campaign metric rows into summaries.

use campaign_core::types::{MetricRecord, MetricsSummary};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Round a percentage to one decimal place.
pub fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Raw additive totals from which every ratio is derived.
#[derive(Debug, Default)]
struct Totals {
    periods: u32,
    impressions: Option<f64>,
    clicks: Option<f64>,
    conversions: Option<f64>,
    leads: Option<f64>,
    sessions: Option<f64>,
    cost: Option<f64>,
    revenue: Option<f64>,
    ltv: Option<f64>,
}

/// `None + x = x`: a field stays absent only if no period measured it.
fn add(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (Some(a), Some(v)) => Some(a + v),
        (None, v) => v,
        (a, None) => a,
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d),
        _ => None,
    }
}

impl Totals {
    fn into_summary(self) -> MetricsSummary {
        let cac = ratio(self.cost, self.conversions);
        let roi_accumulated = match (self.revenue, self.cost) {
            (Some(revenue), Some(cost)) if cost > 0.0 => Some((revenue - cost) / cost * 100.0),
            _ => None,
        };

        MetricsSummary {
            periods_recorded: self.periods,
            impressions: self.impressions,
            clicks: self.clicks,
            conversions: self.conversions,
            leads: self.leads,
            sessions: self.sessions,
            cost: self.cost,
            revenue: self.revenue,
            ctr: ratio(self.clicks, self.impressions).map(|r| r * 100.0),
            cpc: ratio(self.cost, self.clicks),
            cpa: ratio(self.cost, self.conversions),
            cpl: ratio(self.cost, self.leads),
            roas: ratio(self.revenue, self.cost),
            cac,
            ltv: self.ltv,
            cac_ltv_ratio: ratio(self.ltv, cac),
            roi_accumulated,
        }
    }
}

/// Summarize the recorded periods of a single campaign. LTV is taken from
/// the most recent period that reports it.
pub fn summarize(records: &[MetricRecord]) -> MetricsSummary {
    let mut totals = Totals::default();
    let mut latest_ltv: Option<(chrono::NaiveDate, f64)> = None;

    for record in records {
        totals.periods += 1;
        totals.impressions = add(totals.impressions, record.impressions);
        totals.clicks = add(totals.clicks, record.clicks);
        totals.conversions = add(totals.conversions, record.conversions);
        totals.leads = add(totals.leads, record.leads);
        totals.sessions = add(totals.sessions, record.sessions);
        totals.cost = add(totals.cost, record.cost);
        totals.revenue = add(totals.revenue, record.revenue);

        if let Some(ltv) = record.ltv {
            if latest_ltv.map_or(true, |(date, _)| record.period_date >= date) {
                latest_ltv = Some((record.period_date, ltv));
            }
        }
    }
    totals.ltv = latest_ltv.map(|(_, ltv)| ltv);

    totals.into_summary()
}

/// Group metric rows by campaign and summarize each group.
pub fn summarize_by_campaign(records: &[MetricRecord]) -> BTreeMap<Uuid, MetricsSummary> {
    let mut grouped: BTreeMap<Uuid, Vec<MetricRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.campaign_id)
            .or_default()
            .push(record.clone());
    }

    grouped
        .into_iter()
        .map(|(campaign_id, rows)| (campaign_id, summarize(&rows)))
        .collect()
}

/// Roll several campaign summaries up into one (e.g. per channel). Counters
/// are summed and ratios recomputed from the sums; LTV is averaged over the
/// summaries that report it.
pub fn merge<'a, I>(summaries: I) -> MetricsSummary
where
    I: IntoIterator<Item = &'a MetricsSummary>,
{
    let mut totals = Totals::default();
    let mut ltv_sum = 0.0;
    let mut ltv_count = 0usize;

    for summary in summaries {
        totals.periods += summary.periods_recorded;
        totals.impressions = add(totals.impressions, summary.impressions);
        totals.clicks = add(totals.clicks, summary.clicks);
        totals.conversions = add(totals.conversions, summary.conversions);
        totals.leads = add(totals.leads, summary.leads);
        totals.sessions = add(totals.sessions, summary.sessions);
        totals.cost = add(totals.cost, summary.cost);
        totals.revenue = add(totals.revenue, summary.revenue);
        if let Some(ltv) = summary.ltv {
            ltv_sum += ltv;
            ltv_count += 1;
        }
    }
    if ltv_count > 0 {
        totals.ltv = Some(ltv_sum / ltv_count as f64);
    }

    totals.into_summary()
}

/// Metric-name → value map for the given metric names, as consumed by the
/// gap analyzer.
pub fn actuals_for<'a, I>(summary: &MetricsSummary, names: I) -> BTreeMap<String, Option<f64>>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(|name| (name.to_string(), summary.metric(name)))
        .collect()
}
