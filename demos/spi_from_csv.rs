//! Reads daily precipitation from a CSV file (or a directory of per-year folders),
//! computes SPI tables and writes them as `spi_<months>.csv`.
//!
//! Usage: `cargo run --example spi_from_csv -- <input> <output_dir> [config.json]`
//!
//! Set `RUST_LOG=info` to follow the run.

use spi_engine::{
    read_observations_csv, read_observations_dir, PipelineConfig, ReadOptions, SpiPipeline,
};
use std::env;
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    configure_polars_display();

    let mut args = env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: spi_from_csv <input.csv|dir> <output_dir> [config.json]");
        std::process::exit(2);
    };
    let config = match args.next() {
        Some(path) => PipelineConfig::from_json_file(&PathBuf::from(path))?,
        None => PipelineConfig::default(),
    };

    let options = ReadOptions::builder().layout(config.input_layout).build();
    let input = PathBuf::from(input);
    let rows = if input.is_dir() {
        read_observations_dir(&input, i32::MIN..=i32::MAX, &options)?
    } else {
        read_observations_csv(&input, &options)?
    };

    let report = SpiPipeline::from_config(&config)?.run(rows)?;
    for path in report.write_csv_dir(&PathBuf::from(output))? {
        println!("wrote {}", path.display());
    }

    let skipped = report.diagnostics().iter().filter(|d| d.omits_station()).count();
    if skipped > 0 {
        println!("{} station/window combinations were left out, see the log", skipped);
    }

    if let Some(table) = report.tables().last() {
        let driest = table.lazy()?.at_or_below(-2.0).frame.collect()?;
        println!("Extremely dry months, window {}:\n{}", table.window(), driest);
    }

    Ok(())
}

fn configure_polars_display() {
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
