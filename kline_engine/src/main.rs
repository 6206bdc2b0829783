// @file: kline_engine/src/main.rs
// @description: Benchmark runner. Loads config, builds the corpus and reports every decoder side by side.
// @author: LAS.

use kline_engine::bench::alloc::{counting_enabled, CountingAllocator};
use kline_engine::bench::{corpus, render_table, BenchError, BenchReport, Harness};
use kline_engine::core::schema::RecordKind;
use kline_engine::utils::config::AppConfig;
use log::{error, info, warn};
use std::path::Path;
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

fn run(config: &AppConfig) -> Result<Vec<BenchReport>, BenchError> {
    // #1. Corpus
    let payload: Vec<u8> = match &config.corpus_path {
        Some(path) => corpus::load(Path::new(path))?,
        None => corpus::synthetic(config.corpus_records),
    };

    // #2. Decoders
    let kind: RecordKind = config.record_kind()?;
    let mut harness: Harness = Harness::from_names(&config.decoder_names(), kind)?;
    info!("Registered decoders: {:?}", harness.names());

    // #3. Measure
    Ok(harness.run(&payload, config.budget()))
}

fn main() -> ExitCode {
    let config: AppConfig = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 1. Initialize Logger with the configured default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str())).init();

    info!(">>> Kline decoder benchmark starting... <<<");
    if !counting_enabled() {
        warn!("Counting allocator inactive; allocation columns will read zero");
    }

    match run(&config) {
        Ok(reports) => {
            println!("\n{}", render_table(&reports));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Benchmark aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}
