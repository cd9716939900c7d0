use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use stridewise::error::ErrorSeverity;
use stridewise::logging::init_logging;
use stridewise::pmc::{AcwrInterpretation, TsbInterpretation};
use stridewise::{
    CoachConfig, Decision, DecisionEngine, DecisionRequest, DistributionAnalyzer, LogConfig,
    LogFormat, LogLevel, PlannedEvent, ReadinessResult, ReadinessScorer, ReadinessStatus,
    RunVerdict, ZoneCalculator,
};

/// stridewise - next-day polarized training decisions
///
/// Reads an athlete's wellness and activity history and decides whether to
/// run tomorrow, which session to do, and how hard.
#[derive(Parser)]
#[command(name = "stridewise")]
#[command(version)]
#[command(about = "Next-day polarized running decisions", long_about = None)]
struct Cli {
    /// TOML file overriding the built-in configuration
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, default_value = "pretty", global = true)]
    log_format: LogFormat,

    /// Also write JSON logs to this file, rolled daily
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide tomorrow's session
    Decide {
        /// Input bundle (JSON: today, profile, wellness, activities, forecast)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short = 'f', long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Print the calendar event payload instead of the decision
        #[arg(long)]
        event: bool,
    },

    /// Show the easy/hard distribution and weekly volume
    Distribution {
        #[arg(short, long)]
        input: PathBuf,

        /// Analysis window in days (defaults to the configured window)
        #[arg(short, long)]
        days: Option<u32>,

        /// Number of trailing weeks to summarize
        #[arg(short, long, default_value = "4")]
        weeks: u32,
    },

    /// Show today's readiness breakdown
    Readiness {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short = 'f', long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show heart-rate zones derived from the profile and history
    Zones {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Inspect configuration
    Config {
        /// Print the effective configuration as TOML
        #[arg(short, long)]
        show: bool,

        /// Print the default configuration file location
        #[arg(short, long)]
        path: bool,
    },
}

#[derive(Tabled)]
struct TrailRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Reason")]
    message: String,
}

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Modifier")]
    modifier: String,
    #[tabled(rename = "Note")]
    note: String,
}

#[derive(Tabled)]
struct WeekRow {
    #[tabled(rename = "Week")]
    week: String,
    #[tabled(rename = "Runs")]
    runs: u32,
    #[tabled(rename = "Distance (km)")]
    distance: String,
    #[tabled(rename = "Time (min)")]
    duration: String,
    #[tabled(rename = "Load")]
    load: String,
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Range (bpm)")]
    range: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogConfig {
        level: LogLevel::from_verbosity(cli.verbose),
        format: cli.log_format,
        file_path: cli.log_file.clone(),
        ..LogConfig::default()
    })?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Decide {
            input,
            format,
            event,
        } => {
            let request = load_request(&input)?;
            let engine = DecisionEngine::new(config);
            let decision = engine.decide(&request).map_err(|e| {
                match e.severity() {
                    ErrorSeverity::Error => tracing::error!("{}", e),
                    ErrorSeverity::Warning => tracing::warn!("{}", e),
                }
                anyhow::anyhow!(e.user_message())
            })?;

            if event {
                let start_hour = engine.config().plan.session_start_hour;
                match PlannedEvent::from_plan(&decision.plan, start_hour) {
                    Some(payload) => println!("{}", serde_json::to_string_pretty(&payload)?),
                    None => println!("{}", "Rest day: nothing to publish".yellow()),
                }
            } else {
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&decision)?),
                    OutputFormat::Table => print_decision(&decision),
                }
            }
        }

        Commands::Distribution { input, days, weeks } => {
            let request = load_request(&input)?;
            let max_hr = ZoneCalculator::effective_max_hr(&request.profile, &request.activities);
            let analyzer = DistributionAnalyzer::new(&request.activities, max_hr);
            let window = days.unwrap_or(config.polarization.analysis_window_days);
            let distribution = analyzer.distribution(request.today, window).with_targets(
                config.polarization.easy_target_percent,
                config.polarization.hard_target_percent,
            );

            println!("{}", format!("Training distribution ({} days)", window).blue().bold());
            println!(
                "  Runs: {} | Easy: {} ({:.1}%) | Hard: {} ({:.1}%)",
                distribution.total_runs,
                distribution.easy_count,
                distribution.easy_percent,
                distribution.hard_count,
                distribution.hard_percent
            );
            println!(
                "  Target: {}/{} | Average easy pace: {:.2} min/km",
                distribution.target_easy,
                distribution.target_hard,
                analyzer.average_easy_pace()
            );

            let rows: Vec<WeekRow> = analyzer
                .weekly_stats(request.today, weeks)
                .into_iter()
                .map(|w| WeekRow {
                    week: if w.week == 0 {
                        "current".to_string()
                    } else {
                        format!("-{}", w.week)
                    },
                    runs: w.runs,
                    distance: w.distance_km.to_string(),
                    duration: w.duration_minutes.to_string(),
                    load: w.load.to_string(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Readiness { input, format } => {
            let request = load_request(&input)?;
            let readiness = ReadinessScorer::score(request.wellness_until_today());
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&readiness)?),
                OutputFormat::Table => print_readiness(&readiness),
            }

            if let Some(today) = request.current_wellness() {
                let tsb = TsbInterpretation::from_tsb(today.tsb());
                let ratio = stridewise::acwr(today.ctl, today.atl);
                println!(
                    "  TSB {:.1}: {} ({})",
                    today.tsb(),
                    tsb.description(),
                    tsb.recommendation()
                );
                println!(
                    "  ACWR {:.2}: {}",
                    ratio,
                    AcwrInterpretation::from_acwr(ratio).description()
                );
            }
        }

        Commands::Zones { input } => {
            let request = load_request(&input)?;
            let zones = ZoneCalculator::zones_for_athlete(&request.profile, &request.activities);

            println!(
                "{}",
                format!("Heart-rate zones (LTHR {}, max {})", zones.lthr, zones.max_hr)
                    .blue()
                    .bold()
            );
            let rows: Vec<ZoneRow> = zones
                .zones
                .iter()
                .map(|z| ZoneRow {
                    zone: format!("Z{}", z.zone),
                    name: z.name.clone(),
                    range: format!("{}-{}", z.min_bpm, z.max_bpm),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Config { show, path } => {
            if path {
                println!("{}", CoachConfig::default_config_path().display());
            }
            if show || !path {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<CoachConfig> {
    let config = match path {
        Some(path) => CoachConfig::from_overrides_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => CoachConfig::load_or_default().context("Failed to load default configuration")?,
    };
    Ok(config)
}

fn load_request(path: &Path) -> Result<DecisionRequest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input bundle {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid input bundle {}", path.display()))
}

fn print_decision(decision: &Decision) {
    let headline = match decision.verdict {
        RunVerdict::Rest => format!("{}: rest day", decision.date).yellow().bold(),
        RunVerdict::Run => format!("{}: {}", decision.date, decision.plan.title)
            .green()
            .bold(),
    };
    println!("{}", headline);

    println!(
        "  Readiness: {:.2} ({})",
        decision.readiness.score,
        status_label(decision.readiness.status)
    );
    println!(
        "  TSB {:.1} | ACWR {:.2} | last run {} day(s) ago",
        decision.inputs.tsb, decision.inputs.acwr, decision.inputs.days_since_run
    );
    if let Some(heat) = &decision.heat {
        println!("  Heat index {:.1} °C: {}", heat.heat_index, heat.advice);
    }
    if !decision.plan.is_rest() {
        println!(
            "  {} | {} min | {} km",
            decision.plan.workout_type, decision.plan.duration_minutes, decision.plan.distance_km
        );
    }

    let rows: Vec<TrailRow> = decision
        .trail
        .entries
        .iter()
        .map(|e| TrailRow {
            stage: e.stage.clone(),
            message: e.message.clone(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    if !decision.plan.is_rest() {
        println!("{}", decision.plan.description.dimmed());
    }
}

fn print_readiness(readiness: &ReadinessResult) {
    println!(
        "{} {:.2} ({})",
        "Readiness".blue().bold(),
        readiness.score,
        status_label(readiness.status)
    );

    let rows: Vec<ComponentRow> = readiness
        .components
        .iter()
        .map(|(name, c)| ComponentRow {
            name: name.clone(),
            value: c
                .value
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_string()),
            modifier: c.modifier.to_string(),
            note: c.note.clone(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    for recommendation in &readiness.recommendations {
        println!("  • {}", recommendation);
    }
}

fn status_label(status: ReadinessStatus) -> ColoredString {
    match status {
        ReadinessStatus::Ready => status.label().green(),
        ReadinessStatus::Moderate => status.label().cyan(),
        ReadinessStatus::Caution => status.label().yellow(),
        ReadinessStatus::RestAdvised => status.label().red(),
    }
}
