mod commands;
mod logging;
mod progress;

use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use pricewatch_core::notify;
use pricewatch_core::source::ListingPageSource;
use pricewatch_core::status::StatusStore;
use pricewatch_core::store;
use pricewatch_core::{run_pipeline, AppConfig, ExtractStage, TransformOutcome, TransformStage};
use progress::CliReporter;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match pricewatch_core::config::load_configuration() {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Run) => run_full(&config)?,
        Some(Commands::Extract) => run_extract(&config)?,
        Some(Commands::Transform) => run_transform(&config)?,
        Some(Commands::Status) => print_status(&config)?,
        Some(Commands::CompactStatus { keep }) => compact_status(&config, keep)?,
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_full(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = store::from_config(&config.storage)?;
    let source = ListingPageSource::new(&config.source)?;
    let notifier = notify::from_config(&config.notify)?;
    let reporter = CliReporter::new();

    let result = run_pipeline(config, store.as_ref(), &source, notifier.as_ref(), &reporter)?;

    println!();
    info!("Raw artifact: {}", result.raw_key.green());
    match result.outcome {
        TransformOutcome::Completed(artifacts) => {
            info!(
                "{} clean rows, {} brands, {} products",
                format!("{}", artifacts.clean_rows).green(),
                format!("{}", artifacts.brands).cyan(),
                format!("{}", artifacts.products).cyan(),
            );
            info!(
                "Derived tables: {}, {}, {}, {}",
                artifacts.clean, artifacts.dim_brand, artifacts.dim_product, artifacts.fact,
            );
        }
        TransformOutcome::Skipped { reason } => {
            info!("Transform skipped: {}", reason.yellow());
        }
    }

    Ok(())
}

fn run_extract(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = store::from_config(&config.storage)?;
    let source = ListingPageSource::new(&config.source)?;
    let notifier = notify::from_config(&config.notify)?;
    let reporter = CliReporter::new();

    let key = ExtractStage::new(config, store.as_ref(), &source, notifier.as_ref())
        .run(&reporter)?;
    info!("Raw artifact: {}", key.green());

    Ok(())
}

fn run_transform(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = store::from_config(&config.storage)?;
    let notifier = notify::from_config(&config.notify)?;
    let reporter = CliReporter::new();

    let outcome = TransformStage::new(config, store.as_ref(), notifier.as_ref()).run(&reporter)?;
    match outcome {
        TransformOutcome::Completed(artifacts) => {
            info!(
                "Transform complete: {} clean rows into {}",
                format!("{}", artifacts.clean_rows).green(),
                artifacts.fact,
            );
        }
        TransformOutcome::Skipped { reason } => {
            info!("Transform skipped: {}", reason.yellow());
        }
    }

    Ok(())
}

fn print_status(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = store::from_config(&config.storage)?;
    let status = StatusStore::new(store.as_ref());

    let files = status.load_file_statuses()?;
    println!("{}", "File status".bold());
    if files.is_empty() {
        println!("  (empty)");
    }
    for record in files {
        println!(
            "  {:<28} {:<4} {}",
            record.file_name,
            format!("{:?}", record.status),
            record.last_update
        );
    }

    let processes = status.load_process_statuses()?;
    println!("{}", "Process status".bold());
    if processes.is_empty() {
        println!("  (empty)");
    }
    for record in processes {
        println!(
            "  {:<20} {:<8} {:<4} {}",
            record.process_name,
            record.pid,
            format!("{:?}", record.status),
            record.last_update
        );
    }

    Ok(())
}

fn compact_status(config: &AppConfig, keep: usize) -> Result<(), Box<dyn std::error::Error>> {
    let store = store::from_config(&config.storage)?;
    let status = StatusStore::new(store.as_ref());
    let dropped = status.compact_process_status(keep)?;
    println!(
        "Dropped {} process status records (keeping {} per process)",
        format!("{}", dropped).red(),
        keep
    );
    Ok(())
}
