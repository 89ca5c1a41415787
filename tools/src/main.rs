//! pipeline-runner: headless runner for the casedesk data pipeline.
//!
//! Usage:
//!   pipeline-runner --seed 42 --clients 1000 --cases 5000 --notes 10000
//!   pipeline-runner --config data/pipeline.json --as-of 2024-06-30 --db run.db
//!   pipeline-runner --feature-index features.json --scaler scaler.json --insights

use anyhow::{Context, Result};
use casedesk_core::{
    config::PipelineConfig,
    pipeline::{CasePipeline, PipelineOutput},
    store::CaseStore,
    types::DATE_FORMAT,
};
use chrono::NaiveDate;
use std::env;

#[derive(serde::Serialize)]
struct RunSummary<'a> {
    run_id: &'a str,
    seed: u64,
    as_of: String,
    clients: usize,
    cases: usize,
    notes: usize,
    engineered_shape: (usize, usize),
    strategy: casedesk_core::pipeline::SplitStrategy,
    split_instant: String,
    train_shape: (usize, usize),
    test_shape: (usize, usize),
    train_positive_rate: Option<f64>,
    warnings: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config_path = flag_value(&args, "--config");
    let mut config = match config_path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    config.seed = parse_arg(&args, "--seed", config.seed);
    let clients = parse_arg(&args, "--clients", config.generator.num_clients);
    let cases = parse_arg(&args, "--cases", config.generator.num_cases);
    let notes = parse_arg(&args, "--notes", config.generator.num_notes);
    config.generator = config.generator.with_counts(clients, cases, notes);
    config.as_of = match flag_value(&args, "--as-of") {
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .with_context(|| format!("--as-of expects YYYY-MM-DD, got {raw}"))?,
        None if config_path.is_some() => config.as_of,
        None => chrono::Local::now().date_naive(),
    };
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let show_insights = args.iter().any(|a| a == "--insights");

    println!("casedesk: pipeline-runner");
    println!("  seed:      {}", config.seed);
    println!("  as_of:     {}", config.as_of);
    println!("  counts:    {clients} clients / {cases} cases / {notes} notes");
    println!("  db:        {db}");
    println!();

    let output = CasePipeline::new(config.clone()).run()?;

    let store = CaseStore::open(db)?;
    store.migrate()?;
    let run_id = CaseStore::new_run_id();
    store.insert_run(&run_id, &config, env!("CARGO_PKG_VERSION"))?;
    store.insert_raw_tables(&run_id, &output.raw)?;

    if let Some(path) = flag_value(&args, "--feature-index") {
        std::fs::write(path, output.feature_index.to_json()?)
            .with_context(|| format!("Cannot write {path}"))?;
        log::info!("runner: feature index written to {path}");
    }
    if let Some(path) = flag_value(&args, "--scaler") {
        match &output.scaler {
            Some(params) => {
                std::fs::write(path, serde_json::to_string_pretty(params)?)
                    .with_context(|| format!("Cannot write {path}"))?;
                log::info!("runner: scaler parameters written to {path}");
            }
            None => log::warn!("runner: standardisation disabled, {path} not written"),
        }
    }

    print_summary(&store, &run_id, &config, &output)?;

    if show_insights {
        println!();
        println!("=== INSIGHTS ===");
        println!("{}", serde_json::to_string_pretty(&output.insights()?)?);
    }
    Ok(())
}

fn print_summary(
    store: &CaseStore,
    run_id: &str,
    config: &PipelineConfig,
    output: &PipelineOutput,
) -> Result<()> {
    let counts = store.counts(run_id)?;
    let summary = RunSummary {
        run_id,
        seed: config.seed,
        as_of: config.as_of.format(DATE_FORMAT).to_string(),
        clients: counts.clients,
        cases: counts.cases,
        notes: counts.notes,
        engineered_shape: output.engineered.table.shape(),
        strategy: output.strategy,
        split_instant: output.temporal.split_instant.to_string(),
        train_shape: output.train.shape(),
        test_shape: output.test.shape(),
        train_positive_rate: output.train.positive_rate(),
        warnings: output.split_report().warnings.len(),
    };

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", summary.run_id);
    println!("  clients:        {}", summary.clients);
    println!("  cases:          {}", summary.cases);
    println!("  notes:          {}", summary.notes);
    println!("  engineered:     {:?}", summary.engineered_shape);
    println!("  split:          {:?} at {}", summary.strategy, summary.split_instant);
    println!("  train matrix:   {:?}", summary.train_shape);
    println!("  test matrix:    {:?}", summary.test_shape);
    if let Some(rate) = summary.train_positive_rate {
        println!("  train resolved: {:.1}%", rate * 100.0);
    }
    println!("  split warnings: {}", summary.warnings);

    println!();
    println!("=== STATUS MIX ===");
    for (status, n) in store.status_counts(run_id)? {
        println!("  {status:<10} {n}");
    }
    log::debug!("runner: summary {}", serde_json::to_string(&summary)?);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
