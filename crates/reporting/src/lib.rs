//! Derived campaign analytics: performance alerts, budget pacing and
//! projection, and tactical-vs-real adherence.
//!
//! Every calculator is a pure function of its inputs: no I/O, no clocks,
//! no shared mutable state.

pub mod alerts;
pub mod budget;
pub mod gap;
pub mod metrics;

pub use alerts::{AlertDigest, AlertEvaluator, PerformanceAlert};
pub use budget::{BudgetProjectSummary, PacingCalculator, PacingStatus, SpendProjection};
pub use gap::{ChannelGapAnalysis, GapAnalyzer, MetricGap, ProjectGapAnalysis};
