//! Tally - share-of-total reports for numeric sequences
//!
//! A CLI tool that aggregates numbers into total, mean and per-value
//! percentage contributions, runs calculator sessions with an explicit
//! history, and replays calculation scenarios.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, unreadable input, aggregation error, etc.)
//!   2 - Completed, but some calculations or strict scenarios failed

mod analysis;
mod calculator;
mod cli;
mod config;
mod input;
mod models;
mod observer;
mod report;
mod scenario;

use analysis::AggregateOptions;
use anyhow::{bail, Context, Result};
use calculator::{Calculator, Expression, History};
use chrono::Utc;
use cli::{AggregateArgs, Args, CalcArgs, Command, OutputFormat, ScenarioArgs};
use config::{Config, CONFIG_FILE_NAME};
use models::{AggregationSection, Report, ReportMetadata};
use observer::TracingObserver;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides the log level, so it is loaded first
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    if let Err(e) = init_logging(&args, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    info!("Tally v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .tally.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize precision, zero-total policy and report title.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// With a log file configured, events go to both stderr and the file.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let Some(ref path) = config.general.log_file else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Warning: failed to set tracing subscriber: {}", e);
        }
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false);

    if let Err(e) = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Returns the configuration and the file it came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        None => Ok((Config::default(), None)),
    }
}

/// Run the selected command and emit its report. Returns exit code (0 or 2).
fn run(args: &Args, config: &Config) -> Result<i32> {
    let metadata = ReportMetadata {
        title: config.report.title.clone(),
        generated_at: Utc::now(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        precision: config.aggregate.precision,
        zero_total: config.aggregate.zero_total,
    };
    let mut report = Report::new(metadata);
    let options = AggregateOptions::from(&config.aggregate);

    let exit_code = match args.command {
        Some(Command::Aggregate(ref agg)) => run_aggregate(args, agg, &options, &mut report)?,
        Some(Command::Calc(ref calc)) => run_calc(args, calc, &options, &mut report)?,
        Some(Command::Scenarios(ref scen)) => run_scenarios(args, scen, &mut report)?,
        None => bail!("No command given"),
    };

    if !config.report.include_history {
        report.history.clear();
    }

    emit_report(args, &report)?;
    Ok(exit_code)
}

/// `tally aggregate`: gather values, aggregate, attach to the report.
fn run_aggregate(
    args: &Args,
    agg: &AggregateArgs,
    options: &AggregateOptions,
    report: &mut Report,
) -> Result<i32> {
    let mut values = input::parse_args(&agg.values).context("Invalid value argument")?;

    if let Some(ref file) = agg.file {
        values.extend(input::read_values(file)?);
    }

    let result = analysis::analyze(&values, options, &TracingObserver)?;
    match result.summary() {
        Some(summary) => progress(
            args,
            &format!(
                "📊 {} values, total {}, mean {}",
                summary.count, summary.total, summary.mean
            ),
        ),
        None if result.is_empty() => progress(args, "📊 No values to aggregate"),
        None => {}
    }
    report.aggregation = Some(AggregationSection { values, result });

    Ok(0)
}

/// `tally calc`: evaluate expressions against one session history.
fn run_calc(
    args: &Args,
    calc: &CalcArgs,
    options: &AggregateOptions,
    report: &mut Report,
) -> Result<i32> {
    let mut history = History::new();
    let mut failures = 0usize;

    for raw in &calc.expressions {
        let outcome = Expression::parse(raw).and_then(|expr| {
            let result = Calculator.evaluate(&expr, &mut history)?;
            Ok((expr, result))
        });

        match outcome {
            Ok((expr, result)) => progress(args, &format!("🔢 {} = {}", expr, result)),
            Err(e) => {
                failures += 1;
                warn!("Expression '{}' failed: {}", raw.trim(), e);
                if calc.fail_fast {
                    bail!("Expression '{}' failed: {}", raw.trim(), e);
                }
            }
        }
    }

    if history.is_empty() {
        warn!("No expression succeeded; nothing to aggregate");
    }
    let results = history.results();
    if let (Some(mean), Some(std_dev)) = (
        analysis::mean(&results),
        analysis::population_std_dev(&results),
    ) {
        progress(
            args,
            &format!("📈 Results mean: {:.2}, std dev: {:.2}", mean, std_dev),
        );
    }

    // A zero total among results is logged, not fatal.
    match analysis::aggregate(&results, options) {
        Ok(result) => {
            report.aggregation = Some(AggregationSection {
                values: results,
                result,
            })
        }
        Err(e) => warn!("Skipping aggregation of results: {}", e),
    }
    report.history = history.into_entries();

    Ok(if failures > 0 { 2 } else { 0 })
}

/// `tally scenarios`: run the scenario table and attach outcomes.
fn run_scenarios(args: &Args, scen: &ScenarioArgs, report: &mut Report) -> Result<i32> {
    let scenarios = match scen.file {
        Some(ref path) => scenario::load_scenarios(path)?,
        None => scenario::default_scenarios(),
    };
    info!("Running {} scenarios", scenarios.len());

    let mut history = History::new();
    let outcomes = scenario::run_scenarios(&scenarios, &mut history, &TracingObserver);
    debug!("{} operations recorded", history.len());

    for outcome in &outcomes {
        let mark = if outcome.is_success() { "✅" } else { "❌" };
        progress(args, &format!("{} {}", mark, outcome.description()));
    }

    report.scenarios = outcomes;
    report.history = history.into_entries();

    let failed = report.failed_scenarios();
    if scen.strict && failed > 0 {
        eprintln!(
            "\n⛔ {} of {} scenarios failed. Failing (exit code 2).",
            failed,
            report.scenarios.len()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Render the report and write it to the output file or stdout.
fn emit_report(args: &Args, report: &Report) -> Result<()> {
    let Some(ref path) = args.output else {
        println!("{}", render_report(args.format, report)?);
        return Ok(());
    };

    let written = match args.format {
        OutputFormat::Json => report::write_json_report(report, path),
        OutputFormat::Markdown => report::write_report(report, path),
    };
    written.with_context(|| format!("Failed to write report to {}", path.display()))?;

    progress(args, &format!("\n✅ Report saved to: {}", path.display()));
    Ok(())
}

/// Render the report in the requested format.
fn render_report(format: OutputFormat, report: &Report) -> Result<String> {
    match format {
        OutputFormat::Json => report::generate_json_report(report),
        OutputFormat::Markdown => Ok(report::generate_markdown_report(report)),
    }
}

/// Print a progress line unless it would mix with a report on stdout.
fn progress(args: &Args, message: &str) {
    if args.quiet {
        return;
    }
    if args.output.is_some() {
        println!("{}", message);
    } else {
        eprintln!("{}", message);
    }
}
