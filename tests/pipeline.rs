use std::fs;
use std::path::{Path, PathBuf};

use inflacka::app::pipeline::{load_verified, run_process};
use inflacka::catalog::CategoryCatalog;
use inflacka::domain::{MonthPeriod, OutputFormat, ProcessConfig};
use inflacka::error::EXIT_DATA;
use inflacka::io::export::{RatesFile, RatesMetadata, rates_entries, write_rates};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Every prefix of the built-in catalog, plus a few aggregate codes that are
/// only covered through their children.
const LEAVES: &[&str] = &[
    "011", "012", "111", "02", "041", "042", "03", "043", "044", "045", "05", "06", "071", "072",
    "073", "081", "083", "082", "091", "092", "093", "094", "095", "096", "10", "112", "12",
];
const AGGREGATES: &[&str] = &["01", "04", "07", "08", "09", "11"];

fn init() {
    let _ = pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// Build a VDB export with one value per code for January and February 2023,
/// plus a quarterly value that must be ignored.
fn export_xml(codes: &[&str]) -> String {
    let mut elements = String::new();
    let mut data = String::new();
    for (i, code) in codes.iter().enumerate() {
        elements.push_str(&format!(
            "<element ID=\"e{i}\"><dim>ECOICOP</dim><kod>{code}</kod><text>Položka {code}</text></element>\n"
        ));
        let base = 100.0 + i as f64;
        data.push_str(&format!(
            "<udaj><hod>{base}</hod><cas>jan</cas><vec>ukaz</vec><vec>e{i}</vec></udaj>\n\
             <udaj><hod>{}</hod><cas>feb</cas><vec>ukaz</vec><vec>e{i}</vec></udaj>\n\
             <udaj><hod>999</hod><cas>q1</cas><vec>ukaz</vec><vec>e{i}</vec></udaj>\n",
            base + 1.0
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<vystup xmlns="http://vdb.czso.cz/xml/export">
<metaSlovnik>
<vecneUpresneni>
<element ID="ukaz"><dim>UKAZATEL</dim><kod>IS</kod><text>Index</text></element>
{elements}</vecneUpresneni>
<obdobi>
<cas ID="jan"><casOd>2023-01-01</casOd><casDo>2023-01-31</casDo><bazOd>2015-01-01</bazOd><bazDo>2015-12-31</bazDo></cas>
<cas ID="feb"><casOd>2023-02-01</casOd><casDo>2023-02-28</casDo><bazOd>2015-01-01</bazOd><bazDo>2015-12-31</bazDo></cas>
<cas ID="q1"><casOd>2023-01-01</casOd><casDo>2023-03-31</casDo><bazOd>2015-01-01</bazOd><bazDo>2015-12-31</bazDo></cas>
</obdobi>
</metaSlovnik>
<data>
{data}</data>
</vystup>
"#
    )
}

/// Basket in the CZSO layout (`E01.1` codes, per-mille weights summing to 1000).
fn basket_csv() -> String {
    let mut out = String::from("ECOICOP,NAZEV,MĚRNÁ JEDNOTKA,,VÁHA v ‰\nE00,ÚHRN, , ,1000.0\n");
    for (i, code) in LEAVES.iter().enumerate() {
        let weight = if i + 1 == LEAVES.len() { 38.0 } else { 37.0 };
        let dotted = if code.len() > 2 {
            format!("E{}.{}", &code[..2], &code[2..])
        } else {
            format!("E{code}")
        };
        out.push_str(&format!("{dotted},Položka {code}, , ,{weight}\n"));
    }
    out
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn all_codes() -> Vec<&'static str> {
    LEAVES.iter().chain(AGGREGATES).copied().collect()
}

fn config(dir: &TempDir, inputs: Vec<PathBuf>) -> ProcessConfig {
    ProcessConfig {
        inputs,
        basket_csv: write(dir.path(), "basket.csv", &basket_csv()),
        output: dir.path().join("rates.json"),
        format: OutputFormat::Json,
        profile_file: Some(dir.path().join("profile.json")),
        print_mapping: true,
    }
}

#[test]
fn full_pipeline_produces_every_category() {
    init();
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "2023.xml", &export_xml(&all_codes()));
    let config = config(&dir, vec![input]);

    let output = run_process(&config).unwrap();
    assert_eq!(output.results.len(), 17);
    assert_eq!(output.inputs[0].skipped_non_monthly, all_codes().len());
    assert_eq!(
        output.verified.report().delegated.len(),
        AGGREGATES.len(),
        "aggregate codes are covered through their children"
    );

    // food = 011 (100.0 in Jan) and 012 (101.0 in Jan), equal weights.
    let food = &output.results[0];
    assert_eq!(food.category_id, "food");
    let jan = MonthPeriod::new(2023, 1).unwrap();
    let feb = MonthPeriod::new(2023, 2).unwrap();
    assert!((food.rates_by_period[&jan] - 100.5).abs() < 1e-9);
    assert!((food.rates_by_period[&feb] - 101.5).abs() < 1e-9);
    assert_eq!(food.rates_by_period.len(), 2);

    let preset = output.preset.as_ref().unwrap();
    let total: i64 = preset.iter().map(|e| e.amount).sum();
    assert!((total - 50_000).abs() < 100, "preset total {total}");

    let file = RatesFile {
        metadata: RatesMetadata {
            fetched_at: chrono::Utc::now(),
        },
        rates: rates_entries(output.verified.catalog(), &output.results),
    };
    write_rates(&config.output, config.format, &file).unwrap();
    let back: RatesFile = serde_json::from_str(&fs::read_to_string(&config.output).unwrap()).unwrap();
    assert_eq!(back.rates, file.rates);
    assert_eq!(back.rates[0].name, "Jídlo");
}

#[test]
fn split_inputs_merge_like_one_file() {
    init();
    let dir = TempDir::new().unwrap();
    let whole = write(dir.path(), "whole.xml", &export_xml(&all_codes()));
    let copy = write(dir.path(), "copy.xml", &export_xml(&all_codes()));

    let single = run_process(&config(&dir, vec![whole.clone()])).unwrap();
    let merged = run_process(&config(&dir, vec![copy, whole])).unwrap();
    assert_eq!(single.results, merged.results);
    assert_eq!(
        single.verified.observations().len(),
        merged.verified.observations().len()
    );
}

#[test]
fn missing_category_code_fails_before_output() {
    init();
    let dir = TempDir::new().unwrap();
    let codes: Vec<&str> = all_codes().into_iter().filter(|c| *c != "12").collect();
    let input = write(dir.path(), "2023.xml", &export_xml(&codes));
    let config = config(&dir, vec![input]);

    let err = run_process(&config).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_DATA);
    assert!(err.message().contains("12"), "got: {err}");
    assert!(!config.output.exists());
}

#[test]
fn unclaimed_code_is_reported() {
    init();
    let dir = TempDir::new().unwrap();
    let mut codes = all_codes();
    codes.push("13");
    let input = write(dir.path(), "2023.xml", &export_xml(&codes));

    let catalog = CategoryCatalog::builtin().unwrap();
    let err = load_verified(&[input], &catalog).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_DATA);
    assert!(err.message().contains("13 is not covered"), "got: {err}");
}
