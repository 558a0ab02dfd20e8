//! Flow Simulator CLI
//!
//! Generate collision events on parallel producers and run the
//! directed-flow analysis over them.
//!
//! # Example
//!
//! ```bash
//! # Default populations, one million events on four producers
//! flow-sim
//!
//! # Smaller run with a fixed seed, results written as JSON
//! flow-sim --events 50000 --producers 8 --seed 42 --output flow.json
//!
//! # Start from a config file and print the effective config
//! flow-sim --config run.json --events 1000 --dump-config
//! ```

use clap::Parser;
use flow_simulator_core_rs::{Orchestrator, SimulationConfig, SimulationReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Directed-flow event simulator
#[derive(Parser, Debug)]
#[command(name = "flow-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON configuration file; built-in defaults when omitted
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of events to analyze
    #[arg(short = 'n', long)]
    events: Option<usize>,

    /// Number of producer threads
    #[arg(short = 'p', long)]
    producers: Option<usize>,

    /// Master random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the flow results as JSON to this path
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,flow_simulator_core_rs=info")),
        )
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!(%message, "Simulation failed");
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let config = effective_config(args)?;

    if args.dump_config {
        let json = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
        println!("{}", json);
        return Ok(());
    }

    info!(
        events = config.target_events,
        producers = config.producer_count,
        seed = config.rng_seed,
        "Starting simulation"
    );

    let report = Orchestrator::new(config)
        .and_then(Orchestrator::run)
        .map_err(|e| e.to_string())?;
    print_report(&report);
    Ok(())
}

fn effective_config(args: &Args) -> Result<SimulationConfig, String> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_path(path).map_err(|e| e.to_string())?,
        None => SimulationConfig::default(),
    };

    if let Some(events) = args.events {
        config = config.with_target_events(events);
    }
    if let Some(producers) = args.producers {
        config = config.with_producer_count(producers);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(output) = &args.output {
        config = config.with_output_path(output.clone());
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.5}", v))
}

fn print_report(report: &SimulationReport) {
    let summary = &report.summary;
    let results = &report.results;

    println!("Run {}", results.run_id);
    println!(
        "  events:      {} analyzed / {} generated ({} left in queue)",
        summary.analyzed, summary.generated, summary.leftover
    );
    println!("  per producer: {:?}", summary.per_producer);
    println!("  elapsed:     {:.3} s", summary.elapsed.as_secs_f64());
    println!("  R1{{SP}}:      {}", format_optional(results.resolution_sp));
    println!("  R1{{half}}:    {}", format_optional(results.resolution_half));
    println!("  ratio:       {}", format_optional(results.resolution_ratio));
}
