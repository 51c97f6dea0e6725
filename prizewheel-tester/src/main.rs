mod common;
mod logic;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use prizewheel_core::WheelConfig;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::scenario::{get_scenario, list_scenarios};
use common::split_csv;
use logic::{LogicTester, ScenarioResult, resolve_seed_inputs};

#[derive(Debug, Parser)]
#[command(name = "prizewheel-tester", version = "0.1.0")]
#[command(about = "Seeded scenario runner for the prize wheel draw logic")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers, 0x hex, phrases or `random`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Optional wheel configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let config = load_config(args.config.as_deref())?;
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    for info in &seed_infos {
        log::info!("using seed {}", info.display());
    }
    let seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();

    let results = run_logic_scenarios(&args, &config, &scenarios, &seeds);
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut out = open_output(args.output.as_deref())?;
    writeln!(out, "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(out, "  {key:25} - {description}")?;
    }
    out.flush()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎡 Prize Wheel Logic Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn load_config(path: Option<&Path>) -> Result<WheelConfig> {
    let Some(path) = path else {
        return Ok(WheelConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = WheelConfig::from_json(&raw)
        .with_context(|| format!("invalid wheel config in {}", path.display()))?;
    log::info!("loaded wheel config from {}", path.display());
    Ok(config)
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    config: &WheelConfig,
    scenarios: &[String],
    seeds: &[u64],
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(config.clone(), args.verbose);
    let mut results = Vec::new();

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut out = open_output(args.output.as_deref())?;

    match (args.report.as_str(), results.is_empty()) {
        ("json", true) => writeln!(out, "[]")?,
        ("json", false) => logic::reports::generate_json_report(&mut out, results)?,
        ("markdown", true) => writeln!(
            out,
            "# Prize Wheel Logic Test Results\n\n_No scenarios executed._"
        )?,
        ("markdown", false) => {
            logic::reports::generate_markdown_report(&mut out, results, Utc::now())?;
        }
        (_, true) => writeln!(out, "No logic scenarios executed.")?,
        (_, false) => {
            logic::reports::generate_console_report(&mut out, results, start_time.elapsed())?;
        }
    }

    if args.report != "json" {
        writeln!(out)?;
        writeln!(out, "🏁 Total time: {:?}", start_time.elapsed())?;
    }
    out.flush()?;
    Ok(())
}

/// Buffered report sink: the `--output` file, or stdout.
fn open_output(path: Option<&Path>) -> Result<BufWriter<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(stdout()),
    };
    Ok(BufWriter::new(sink))
}
