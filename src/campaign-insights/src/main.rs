//! Campaign Insights: derived analytics for the marketing dashboard.
//!
//! Reads a dashboard snapshot, runs the alert, pacing and gap calculators,
//! and prints the results as JSON.

mod snapshot;

use anyhow::Context;
use campaign_core::config::AppConfig;
use campaign_reporting::alerts::{self, AlertDigest, AlertEvaluator, PerformanceAlert};
use campaign_reporting::budget::{self, BudgetProjectSummary, PacingCalculator, SpendProjection};
use campaign_reporting::gap::{GapAnalyzer, ProjectGapAnalysis};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use snapshot::DashboardSnapshot;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "campaign-insights")]
#[command(about = "Alerts, budget pacing and plan adherence for marketing campaigns")]
#[command(version)]
struct Cli {
    /// TOML file with threshold overrides
    #[arg(long, global = true, env = "CAMPAIGN_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate performance alerts for active and paused campaigns
    Alerts {
        #[command(flatten)]
        input: InputArgs,

        /// Order alerts by severity instead of by campaign
        #[arg(long, default_value_t = false)]
        prioritize: bool,
    },
    /// Monthly budget pacing and end-of-month projections
    Budget {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Plan-versus-actual gaps and adherence per project
    Gaps {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Alerts, budget and gaps in one document
    Report {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Dashboard snapshot JSON file
    #[arg(short, long)]
    input: PathBuf,

    /// Reference date (YYYY-MM-DD); defaults to today in UTC
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

impl InputArgs {
    fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Debug, Serialize)]
struct AlertsOutput {
    as_of: NaiveDate,
    digest: AlertDigest,
    alerts: Vec<PerformanceAlert>,
}

#[derive(Debug, Serialize)]
struct MonthOutput {
    #[serde(flatten)]
    summary: BudgetProjectSummary,
    projection: SpendProjection,
}

#[derive(Debug, Serialize)]
struct BudgetOutput {
    as_of: NaiveDate,
    expected_pacing: f64,
    months: Vec<MonthOutput>,
}

#[derive(Debug, Serialize)]
struct GapsOutput {
    projects: Vec<ProjectGapAnalysis>,
}

#[derive(Debug, Serialize)]
struct ReportOutput {
    alerts: AlertsOutput,
    budget: BudgetOutput,
    gaps: GapsOutput,
}

fn run_alerts(
    config: &AppConfig,
    snapshot: &DashboardSnapshot,
    as_of: NaiveDate,
    prioritize: bool,
) -> AlertsOutput {
    let evaluator = AlertEvaluator::from_config(config);
    let mut alerts = evaluator.evaluate(&snapshot.campaigns, &snapshot.campaign_summaries(), as_of);
    if prioritize {
        alerts::prioritize(&mut alerts);
    }
    let digest = AlertDigest::from_alerts(&alerts);
    info!(
        total = digest.total,
        critical = digest.critical,
        warning = digest.warning,
        "alerts evaluated"
    );
    AlertsOutput {
        as_of,
        digest,
        alerts,
    }
}

fn run_budget(config: &AppConfig, snapshot: &DashboardSnapshot, as_of: NaiveDate) -> BudgetOutput {
    let calculator = PacingCalculator::new(config.pacing);
    let months: Vec<MonthOutput> = calculator
        .build_project_summary(&snapshot.allocations)
        .into_iter()
        .map(|summary| {
            let projection = budget::project_month(&summary, as_of);
            MonthOutput {
                summary,
                projection,
            }
        })
        .collect();
    info!(months = months.len(), "budget pacing computed");
    BudgetOutput {
        as_of,
        expected_pacing: budget::expected_pacing(as_of),
        months,
    }
}

fn run_gaps(config: &AppConfig, snapshot: &DashboardSnapshot) -> GapsOutput {
    let analyzer = GapAnalyzer::from_config(config);
    let summaries = snapshot.campaign_summaries();
    let projects: Vec<ProjectGapAnalysis> = snapshot
        .project_ids()
        .into_iter()
        .map(|project_id| {
            analyzer.analyze_project(project_id, &snapshot.plans, &snapshot.campaigns, &summaries)
        })
        .collect();
    info!(projects = projects.len(), "gap analysis computed");
    GapsOutput { projects }
}

/// An explicitly requested file must load; the environment-only layer falls
/// back to defaults.
fn resolve_config(file: Option<&Path>) -> anyhow::Result<AppConfig> {
    match file {
        Some(path) => AppConfig::load(Some(path))
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(AppConfig::load(None).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        })),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{rendered}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_insights=info,campaign_reporting=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Alerts { input, prioritize } => {
            let snapshot = DashboardSnapshot::from_path(&input.input)?;
            print_json(&run_alerts(&config, &snapshot, input.as_of(), prioritize))
        }
        Commands::Budget { input } => {
            let snapshot = DashboardSnapshot::from_path(&input.input)?;
            print_json(&run_budget(&config, &snapshot, input.as_of()))
        }
        Commands::Gaps { input } => {
            let snapshot = DashboardSnapshot::from_path(&input.input)?;
            print_json(&run_gaps(&config, &snapshot))
        }
        Commands::Report { input } => {
            let snapshot = DashboardSnapshot::from_path(&input.input)?;
            let as_of = input.as_of();
            print_json(&ReportOutput {
                alerts: run_alerts(&config, &snapshot, as_of, true),
                budget: run_budget(&config, &snapshot, as_of),
                gaps: run_gaps(&config, &snapshot),
            })
        }
    }
}
