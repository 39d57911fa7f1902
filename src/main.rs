mod cli;

use sessionwatch::replay::{self, Replay};
use sw_core::config::Config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(cli.config.as_deref());

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use the configured filters
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            config.logging.verbose_filter.clone()
        } else {
            config.logging.filter.clone()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay { file, json } => replay_file(&file, &config, json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

fn replay_file(file: &Path, config: &Config, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Event log does not exist: {:?}", file);
    }

    let replay = replay::replay_file(file, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&replay)?);
    } else {
        print_replay(&replay);
    }

    Ok(())
}

fn print_replay(replay: &Replay) {
    println!("Transitions: {}", replay.transitions.len());
    for (i, change) in replay.transitions.iter().enumerate() {
        println!(
            "  {}. {} -> {} ({})",
            i + 1,
            change.old_state,
            change.new_state,
            change.reason
        );
    }
    if replay.ignored_events > 0 {
        println!("Ignored after end: {}", replay.ignored_events);
    }

    let report = &replay.report;
    println!("\nFinal state: {}", report.final_state);
    match report.end_reason {
        Some(reason) => println!("End reason: {}", reason),
        None => println!("End reason: none (session still open)"),
    }
    if report.discard {
        println!("Discard: yes (no meaningful activity)");
    } else {
        println!("Discard: no");
    }

    println!("\n{}", report.summary);
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        println!("Configuration has {} warning(s):", warnings.len());
        for warning in &warnings {
            println!("  - {}", warning);
        }
    }
    println!(
        "  Background idle timeout: {} ms",
        config.session.background_idle_timeout_ms
    );
    println!("  Summary schema version: {}", config.summary.schema_version);

    Ok(())
}
