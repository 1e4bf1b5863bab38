//! Reconcile the three raw datasets into the training corpus (offline step).
//!
//! Reads the rainfall/soil-chemistry, regional yield and soil-type CSVs,
//! joins them on the shared crop key, and writes the reconciled corpus out
//! as one CSV for classifier training.
//!
//! Usage:
//!   cargo run --bin build_corpus -- \
//!     [rainfall.csv] [region.csv] [soil.csv] [output.csv]

use crop_advisor_rust::data::reconcile_files;
use polars::prelude::*;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let rainfall_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("datasets/crop_yield_by_rainfall.csv");
    let region_path = args
        .get(2)
        .map(String::as_str)
        .unwrap_or("datasets/crop_yield_by_region.csv");
    let soil_path = args
        .get(3)
        .map(String::as_str)
        .unwrap_or("datasets/crop_yield_by_soil.csv");
    let output_path = args
        .get(4)
        .map(String::as_str)
        .unwrap_or("super_dataset_detailed.csv");

    println!("\n{}", "=".repeat(70));
    println!("Dataset Reconciliation");
    println!("{}", "=".repeat(70));
    println!();
    println!("  Rainfall: {}", rainfall_path);
    println!("  Region:   {}", region_path);
    println!("  Soil:     {}", soil_path);
    println!();

    let start = Instant::now();
    let corpus = reconcile_files(rainfall_path, region_path, soil_path)?;
    let elapsed = start.elapsed();

    println!(
        "Reconciled {} records in {:.3} ms",
        corpus.len(),
        elapsed.as_secs_f64() * 1000.0
    );
    if corpus.skipped_soil_rows > 0 {
        println!(
            "Skipped {} soil rows with unparsable dates",
            corpus.skipped_soil_rows
        );
    }

    let mut frame = corpus.frame;
    let file = std::fs::File::create(output_path)?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut frame)?;

    println!("Corpus written to '{}'", output_path);
    println!("{}", "=".repeat(70));

    Ok(())
}
