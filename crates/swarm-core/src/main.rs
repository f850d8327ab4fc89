//! Trust-aware swarm transport simulation
//!
//! Runs one seeded mission from a TOML configuration and prints what happened.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use swarm_core::swarm::{apply_trust_history, read_trust_history};
use swarm_core::{CoordinationStatus, RunSummary, Swarm, SwarmConfig};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "swarm_sim")]
#[command(about = "Trust-aware swarm object transport simulation")]
struct Args {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured tick limit
    #[arg(long)]
    ticks: Option<u64>,

    /// Write every agent's trust history here after the run
    #[arg(long)]
    export_trust: Option<PathBuf>,

    /// Seed agents with a trust history exported by an earlier run
    #[arg(long)]
    seed_trust: Option<PathBuf>,

    /// Write the run summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match SwarmConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: could not load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => SwarmConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        config.simulation.max_ticks = ticks;
    }
    if let Some(path) = &args.seed_trust {
        match read_trust_history(path) {
            Ok(export) => {
                let seeded = apply_trust_history(&mut config, &export);
                println!("Seeded trust history for {} robots", seeded);
            }
            Err(e) => {
                eprintln!("Error: could not read {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    println!("Swarm Transport Simulation");
    println!("==========================");
    println!("Seed: {}", config.simulation.seed);
    println!("Max ticks: {}", config.simulation.max_ticks);
    println!("Robots: {}", config.robots.len());
    println!(
        "Trust: {}",
        if config.simulation.trust_enabled { "enabled" } else { "disabled" }
    );
    println!();

    let max_ticks = config.simulation.max_ticks;
    let mut swarm = match Swarm::new(config) {
        Ok(swarm) => swarm,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let summary = swarm.run(max_ticks);
    print_summary(&summary);

    if let Some(path) = &args.export_trust {
        if let Err(e) = swarm.write_trust_history(path) {
            eprintln!("Warning: Could not write trust history: {}", e);
        } else {
            println!("Wrote {}", path.display());
        }
    }
    if let Some(path) = &args.summary_json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    eprintln!("Warning: Could not write summary: {}", e);
                } else {
                    println!("Wrote {}", path.display());
                }
            }
            Err(e) => eprintln!("Warning: Could not serialize summary: {}", e),
        }
    }

    ExitCode::SUCCESS
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Run {} finished after {} ticks", summary.run_id, summary.ticks);
    if summary.delivered {
        println!("  Object delivered to base");
    } else {
        println!(
            "  Object not delivered; last seen at ({:.1}, {:.1})",
            summary.object_position.x, summary.object_position.y
        );
        if let CoordinationStatus::InsufficientRobots { available, needed } = summary.status {
            println!("  Insufficient robots: {} available, {} needed", available, needed);
        }
    }
    println!(
        "  Messages: {} ({} rejected, {} of them from malicious senders)",
        summary.messages, summary.rejected, summary.rejected_from_malicious
    );
    println!("  Planning failures: {}", summary.plan_failures);
    println!("  Authority reputations:");
    for (label, reputation) in &summary.reputations {
        let flag = if summary.suspected.contains(label) { " (suspected)" } else { "" };
        println!("    {}: {:.3}{}", label, reputation, flag);
    }
}
