//! Command-line parsing for the category price-index tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and I/O code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::data::DEFAULT_DATASET_VERSION;
use crate::domain::OutputFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "inflacka",
    version,
    about = "Spending-category price indices from the CZSO consumer price export"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify category coverage, aggregate per category and month, and write the rates file.
    Process(ProcessArgs),
    /// Only check that the categories partition the codes of the given exports.
    Verify(VerifyArgs),
    /// Download one year of the price export from the CZSO public database.
    Fetch(FetchArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ProcessArgs {
    /// VDB XML export(s) to process.
    #[arg(required = true, value_name = "XML")]
    pub inputs: Vec<PathBuf>,

    /// Consumer basket weights (CSV, per-mille weights).
    #[arg(short = 'b', long, default_value = "spot_kos2024.csv")]
    pub basket_csv: PathBuf,

    /// Rates file to write.
    #[arg(short = 'o', long, default_value = "inflationRates.ts")]
    pub output_file: PathBuf,

    /// Rates file format (default: from the output extension, `.json` → json, else ts).
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Also write the default consumer-basket profile preset (JSON).
    #[arg(short = 'p', long)]
    pub profile_file: Option<PathBuf>,

    /// Print the category → code mapping.
    #[arg(long)]
    pub print_mapping: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct VerifyArgs {
    /// VDB XML export(s) to check.
    #[arg(required = true, value_name = "XML")]
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct FetchArgs {
    /// Year to download (1990..=current).
    #[arg(short = 'y', long)]
    pub year: i32,

    /// Where to save the XML.
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Dataset version code of the export.
    #[arg(long, default_value = DEFAULT_DATASET_VERSION)]
    pub dataset_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_defaults() {
        let cli = Cli::parse_from(["inflacka", "process", "a.xml", "b.xml"]);
        let Command::Process(args) = cli.command else {
            panic!("expected process");
        };
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.basket_csv, PathBuf::from("spot_kos2024.csv"));
        assert_eq!(args.output_file, PathBuf::from("inflationRates.ts"));
        assert!(args.format.is_none());
        assert!(!args.print_mapping);
    }

    #[test]
    fn fetch_requires_year() {
        assert!(Cli::try_parse_from(["inflacka", "fetch", "-o", "x.xml"]).is_err());
        let cli = Cli::parse_from(["inflacka", "-v", "fetch", "-y", "2024", "-o", "x.xml"]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.year, 2024);
        assert_eq!(args.dataset_version, DEFAULT_DATASET_VERSION);
    }
}
