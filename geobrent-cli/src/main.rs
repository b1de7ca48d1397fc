//! GeoBrent CLI: load prices and events, then query the analysis engine.
//!
//! Commands:
//! - `summary`: dashboard snapshot of the loaded data
//! - `prices`: price rows with rolling statistics
//! - `events`: the event catalog, optionally filtered
//! - `change-points`: detected structural breaks
//! - `impact`: before/after statistics around an event, change point, or date
//! - `correlations`: event-type, period, and yearly correlation tables
//! - `health`: load status
//!
//! Every command prints JSON to stdout. Logs go to stderr; set `RUST_LOG` to
//! change the level.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use geobrent_core::data::{load_context, parse_date};
use geobrent_core::domain::{AnchorId, EventType, ImpactLevel};
use geobrent_core::{AnalysisConfig, EventFilter, QueryFacade};

#[derive(Parser)]
#[command(
    name = "geobrent",
    about = "GeoBrent: change-point detection and event impact analysis for Brent crude"
)]
struct Cli {
    /// TOML analysis config. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// `Date,Price` CSV file. Overrides `data.prices_csv`.
    #[arg(long, global = true)]
    prices: Option<PathBuf>,

    /// Event file (CSV, or JSON by extension). Overrides `data.events_file`.
    #[arg(long, global = true)]
    events: Option<PathBuf>,

    /// Fall back to a generated series when no price file is given.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// Sort out-of-order price rows instead of rejecting them.
    #[arg(long, global = true, default_value_t = false)]
    sort_prices: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dashboard snapshot: latest price, coverage, recent events.
    Summary,
    /// Price rows with 30-day rolling statistics.
    Prices {
        /// First date (inclusive).
        #[arg(long)]
        start: Option<String>,

        /// Last date (inclusive).
        #[arg(long)]
        end: Option<String>,
    },
    /// List catalogued events.
    Events {
        /// Event type, e.g. `OPEC_Decision` or `Military_Conflict`.
        #[arg(long = "type")]
        event_type: Option<String>,

        /// Expected impact level, e.g. `High`.
        #[arg(long)]
        impact: Option<String>,

        /// Restrict to events on or after this date. Requires --end.
        #[arg(long)]
        start: Option<String>,

        /// Restrict to events on or before this date. Requires --start.
        #[arg(long)]
        end: Option<String>,
    },
    /// Detected change points, optionally filtered by confidence.
    ChangePoints {
        /// Minimum confidence in [0, 1].
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Before/after window statistics around one anchor.
    Impact {
        /// Event id.
        #[arg(long)]
        event: Option<u32>,

        /// Change point id.
        #[arg(long)]
        change_point: Option<usize>,

        /// Bare date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,

        /// Window length in days. Defaults to `window.default_window_days`.
        #[arg(long)]
        window: Option<u32>,
    },
    /// Event-type, period, and yearly correlation tables.
    Correlations,
    /// Load status.
    Health,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let facade = build_facade(&cli)?;

    match cli.command {
        Commands::Summary => print_json(&facade.dashboard_summary()?),
        Commands::Prices { start, end } => {
            let start = parse_opt_date(start.as_deref())?;
            let end = parse_opt_date(end.as_deref())?;
            print_json(&facade.prices(start, end)?)
        }
        Commands::Events {
            event_type,
            impact,
            start,
            end,
        } => run_events(&facade, event_type, impact, start, end),
        Commands::ChangePoints { threshold } => print_json(&facade.change_points(threshold)?),
        Commands::Impact {
            event,
            change_point,
            date,
            window,
        } => run_impact(&facade, event, change_point, date, window),
        Commands::Correlations => print_json(&facade.correlation_summary()?),
        Commands::Health => print_json(&facade.health()),
    }
}

fn build_facade(cli: &Cli) -> Result<QueryFacade> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(path) = &cli.prices {
        config.data.prices_csv = Some(path.clone());
    }
    if let Some(path) = &cli.events {
        config.data.events_file = Some(path.clone());
    }
    config.data.synthetic_fallback |= cli.synthetic;
    config.data.sort_prices |= cli.sort_prices;

    let context = load_context(&config.data)?;
    info!(
        "loaded {} price points and {} events",
        context.series().len(),
        context.catalog().len()
    );
    Ok(QueryFacade::new(context, config)?)
}

fn run_events(
    facade: &QueryFacade,
    event_type: Option<String>,
    impact: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let filter = EventFilter {
        event_type: event_type.as_deref().map(str::parse::<EventType>).transpose()?,
        impact: impact.as_deref().map(str::parse::<ImpactLevel>).transpose()?,
    };
    match (start, end) {
        (None, None) => print_json(&facade.events(filter)),
        (Some(start), Some(end)) => {
            let events: Vec<_> = facade
                .events_in_range(parse_date(&start)?, parse_date(&end)?)?
                .into_iter()
                .filter(|e| filter.matches(e))
                .collect();
            print_json(&events)
        }
        _ => bail!("--start and --end must be given together"),
    }
}

fn run_impact(
    facade: &QueryFacade,
    event: Option<u32>,
    change_point: Option<usize>,
    date: Option<String>,
    window: Option<u32>,
) -> Result<()> {
    let analysis = match (event, change_point, date) {
        (Some(id), None, None) => facade.impact_for(AnchorId::Event(id), window)?,
        (None, Some(id), None) => facade.impact_for(AnchorId::ChangePoint(id), window)?,
        (None, None, Some(date)) => facade.impact_at(parse_date(&date)?, window)?,
        (None, None, None) => bail!("one of --event, --change-point, or --date is required"),
        _ => bail!("--event, --change-point, and --date are mutually exclusive"),
    };
    print_json(&analysis)
}

fn parse_opt_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
    Ok(s.map(parse_date).transpose()?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
