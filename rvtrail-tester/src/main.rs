mod common;
mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use rvtrail_game::{CityCatalog, CityKey, RulesConfig};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use common::split_csv;
use logic::{
    BalanceTester, DEFAULT_MAX_DAYS, GameplayStrategy, NarratorKind, NarratorSource, RunRecord,
    StrategyAggregate, aggregate_records, build_plan, resolve_seed_inputs,
};

#[derive(Debug, Parser)]
#[command(name = "rvtrail-tester", version = "0.1.0")]
#[command(about = "Automated playthroughs and balance sweeps for RV Trail")]
struct Args {
    /// Starting cities (comma-separated names or codes, or "all")
    #[arg(long, default_value = "all")]
    cities: String,

    /// Seeds to run (comma-separated numbers or run codes like CD-DIESEL42)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Player strategies (cautious, sprinter, balanced, random, or "all")
    #[arg(long, default_value = "all")]
    strategies: String,

    /// Runs per city, seed and strategy
    #[arg(long, default_value_t = 5)]
    iterations: usize,

    /// Give up on a run after this many turns
    #[arg(long, default_value_t = DEFAULT_MAX_DAYS)]
    max_days: u32,

    /// Narrator consulted on narrative turns
    #[arg(long, value_enum, default_value_t = NarratorKind::Scripted)]
    narrator: NarratorKind,

    /// Rules JSON to balance-test instead of the bundled rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json", "markdown"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let cities = expand_cities(&args.cities)?;
    let strategies = expand_strategies(&args.strategies)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let rules = load_rules(args.rules.as_deref())?;
    let narrators = NarratorSource::from_kind(args.narrator)?;

    let plan = build_plan(&cities, &seeds, &strategies, args.iterations, args.max_days);
    println!(
        "🚐 Playing {} runs with the {:?} narrator",
        plan.len(),
        args.narrator
    );

    let tester = BalanceTester::new(rules, CityCatalog::load_from_static(), narrators, args.verbose);
    let records = tester.run_plan(&plan).await?;
    let aggregates = aggregate_records(&records);

    write_report(&args, &records, &aggregates, start_time.elapsed())?;
    println!("⏱️ Finished in {:?}", start_time.elapsed());

    if records.iter().any(|r| !r.violations.is_empty()) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🚐 RV Trail Balance Tester".bright_cyan().bold());
    println!("{}", "==========================".cyan());
}

fn expand_cities(arg: &str) -> Result<Vec<CityKey>> {
    let tokens = split_csv(arg);
    if tokens.is_empty() || tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(CityKey::ALL.to_vec());
    }
    let mut cities = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let Ok(city) = token.parse::<CityKey>() else {
            bail!("unknown city '{token}'");
        };
        if !cities.contains(&city) {
            cities.push(city);
        }
    }
    Ok(cities)
}

fn expand_strategies(arg: &str) -> Result<Vec<GameplayStrategy>> {
    let tokens = split_csv(arg);
    if tokens.is_empty() || tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(GameplayStrategy::ALL.to_vec());
    }
    let mut strategies = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let strategy = token
            .parse::<GameplayStrategy>()
            .map_err(anyhow::Error::msg)?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    Ok(strategies)
}

fn load_rules(path: Option<&Path>) -> Result<RulesConfig> {
    let Some(path) = path else {
        return Ok(RulesConfig::load_from_static());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    RulesConfig::from_json(&json).with_context(|| format!("invalid rules in {}", path.display()))
}

fn write_report(
    args: &Args,
    records: &[RunRecord],
    aggregates: &[StrategyAggregate],
    duration: Duration,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(output_target.writer(), records, aggregates)?;
        }
        "markdown" => {
            logic::reports::generate_markdown_report(output_target.writer(), records, aggregates)?;
        }
        _ => {
            if records.is_empty() {
                writeln!(output_target.writer(), "No runs played.")?;
            } else {
                logic::reports::generate_console_report(
                    output_target.writer(),
                    records,
                    aggregates,
                    duration,
                )?;
            }
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
