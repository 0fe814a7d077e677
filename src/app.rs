//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - runs the verify/aggregate pipeline
//! - prints reports
//! - writes the rates file and the optional profile preset
//! - downloads exports from the CZSO

use std::fs;

use chrono::Utc;
use clap::Parser;
use log::info;

use crate::catalog::CategoryCatalog;
use crate::cli::{Command, FetchArgs, ProcessArgs, VerifyArgs};
use crate::data::CzsoClient;
use crate::domain::{OutputFormat, ProcessConfig};
use crate::error::{AppError, EXIT_INPUT};
use crate::io::export::{RatesFile, RatesMetadata, rates_entries, write_preset_json, write_rates};

pub mod pipeline;

/// Entry point for the `inflacka` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    pretty_env_logger::formatted_builder()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match cli.command {
        Command::Process(args) => handle_process(args),
        Command::Verify(args) => handle_verify(args),
        Command::Fetch(args) => handle_fetch(args),
    }
}

fn handle_process(args: ProcessArgs) -> Result<(), AppError> {
    let config = process_config_from_args(&args);
    let output = pipeline::run_process(&config)?;

    if config.print_mapping {
        print!(
            "{}",
            crate::report::format_category_mapping(output.verified.catalog(), output.verified.observations())
        );
    }
    println!("{}", crate::report::format_run_summary(&output));

    // Only reached once verification and aggregation both succeeded.
    let file = RatesFile {
        metadata: RatesMetadata {
            fetched_at: Utc::now(),
        },
        rates: rates_entries(output.verified.catalog(), &output.results),
    };
    write_rates(&config.output, config.format, &file)?;
    info!("rates written to {}", config.output.display());

    if let (Some(path), Some(preset)) = (&config.profile_file, &output.preset) {
        write_preset_json(path, preset)?;
        info!("profile preset written to {}", path.display());
    }

    Ok(())
}

fn handle_verify(args: VerifyArgs) -> Result<(), AppError> {
    let catalog = CategoryCatalog::builtin()?;
    let (verified, _) = pipeline::load_verified(&args.inputs, &catalog)?;

    print!(
        "{}",
        crate::report::format_category_mapping(&catalog, verified.observations())
    );
    print!("{}", crate::report::format_coverage(verified.report()));
    Ok(())
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let client = CzsoClient::from_env()?;
    let text = client.download_price_data(args.year, &args.dataset_version)?;
    fs::write(&args.output, text).map_err(|e| {
        AppError::new(
            EXIT_INPUT,
            format!("Failed to write '{}': {e}", args.output.display()),
        )
    })?;
    info!("data saved to {}", args.output.display());
    Ok(())
}

pub fn process_config_from_args(args: &ProcessArgs) -> ProcessConfig {
    ProcessConfig {
        inputs: args.inputs.clone(),
        basket_csv: args.basket_csv.clone(),
        output: args.output_file.clone(),
        format: args
            .format
            .unwrap_or_else(|| OutputFormat::from_path(&args.output_file)),
        profile_file: args.profile_file.clone(),
        print_mapping: args.print_mapping,
    }
}
