// @file: kline_engine/src/bench/harness.rs
// @description: Runs every registered decoder over one corpus and reports throughput and allocations.
// @author: LAS.

use log::{debug, info, warn};
use serde::Serialize;
use std::fmt::Write;
use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};
use crate::bench::alloc::AllocSnapshot;
use crate::bench::BenchError;
use crate::core::decoder::KlineDecoder;
use crate::core::models::Kline;
use crate::core::schema::{RecordKind, RecordSchema};
use crate::decoders;


//
// TYPE DEFINITIONS
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Iterations(u64),
    // Keep decoding until this much wall time has passed (at least one pass)
    Duration(Duration),
}

struct BenchCase {
    name: String,
    decoder: Box<dyn KlineDecoder>,
    schema: Arc<RecordSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub name: String,
    pub schema: RecordKind,
    pub iterations: u64,
    pub elapsed: Duration,
    pub records_per_iteration: usize,
    pub payload_bytes: usize,
    pub allocations: u64,
    pub allocated_bytes: u64,
    // Set when the warm-up or a timed pass failed; the numbers are then partial
    pub error: Option<String>,
}

impl BenchReport {
    fn failed(case: &BenchCase, payload_bytes: usize, error: String) -> Self {
        BenchReport {
            name: case.name.clone(),
            schema: case.schema.kind(),
            iterations: 0,
            elapsed: Duration::ZERO,
            records_per_iteration: 0,
            payload_bytes,
            allocations: 0,
            allocated_bytes: 0,
            error: Some(error),
        }
    }

    fn per_second(&self, amount: f64) -> f64 {
        let seconds: f64 = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            amount / seconds
        } else {
            0.0
        }
    }

    pub fn records_per_sec(&self) -> f64 {
        self.per_second(self.records_per_iteration as f64 * self.iterations as f64)
    }

    pub fn bytes_per_sec(&self) -> f64 {
        self.per_second(self.payload_bytes as f64 * self.iterations as f64)
    }

    pub fn nanos_per_iteration(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.elapsed.as_nanos() as f64 / self.iterations as f64
    }

    pub fn allocations_per_iteration(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.allocations as f64 / self.iterations as f64
    }
}


//
// HARNESS
//

/// Registry of named decoder/schema pairs. Adding a backend is one
/// `register` call; the timing loop never changes.
#[derive(Default)]
pub struct Harness {
    cases: Vec<BenchCase>,
}

impl Harness {
    pub fn new() -> Self {
        Harness::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        decoder: Box<dyn KlineDecoder>,
        schema: Arc<RecordSchema>,
    ) -> &mut Self {
        self.cases.push(BenchCase { name: name.into(), decoder, schema });
        self
    }

    // Every backend compiled into this build, all sharing one schema
    pub fn with_default_decoders(kind: RecordKind) -> Self {
        let schema: Arc<RecordSchema> = Arc::new(RecordSchema::for_kind(kind));
        let mut harness: Harness = Harness::new();
        for name in decoders::available() {
            if let Some(decoder) = decoders::by_name(name) {
                harness.register(name, decoder, schema.clone());
            }
        }
        harness
    }

    // Empty `names` selects every available backend
    pub fn from_names(names: &[String], kind: RecordKind) -> Result<Self, BenchError> {
        if names.is_empty() {
            return Ok(Self::with_default_decoders(kind));
        }

        let schema: Arc<RecordSchema> = Arc::new(RecordSchema::for_kind(kind));
        let mut harness: Harness = Harness::new();
        for name in names {
            let decoder = decoders::by_name(name).ok_or_else(|| BenchError::UnknownDecoder(name.clone()))?;
            harness.register(name.trim(), decoder, schema.clone());
        }
        Ok(harness)
    }

    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    //
    // EXECUTION
    //

    pub fn run(&mut self, corpus: &[u8], budget: Budget) -> Vec<BenchReport> {
        info!("Benchmarking {} decoders over {} bytes ({:?})", self.cases.len(), corpus.len(), budget);

        self.cases
            .iter_mut()
            .map(|case| {
                let report: BenchReport = run_case(case, corpus, budget);
                info!(
                    "{:<8} {:>12.0} records/s {:>8.1} allocs/iter",
                    report.name,
                    report.records_per_sec(),
                    report.allocations_per_iteration()
                );
                report
            })
            .collect()
    }
}

fn run_case(case: &mut BenchCase, corpus: &[u8], budget: Budget) -> BenchReport {
    // #1. Warm-up pass, which also sizes the capacity hint
    let mut last: Vec<Kline> = match case.decoder.decode(corpus, &case.schema, None) {
        Ok(records) => records,
        Err(err) => {
            warn!("Decoder {} rejected the corpus: {}", case.name, err);
            return BenchReport::failed(case, corpus.len(), err.to_string());
        }
    };
    let hint: Option<usize> = Some(last.len());
    debug!("Decoder {} warmed up with {} records", case.name, last.len());

    // #2. Timed loop
    let before: AllocSnapshot = AllocSnapshot::take();
    let start: Instant = Instant::now();
    let mut iterations: u64 = 0;

    loop {
        let done: bool = match budget {
            Budget::Iterations(limit) => iterations >= limit,
            Budget::Duration(limit) => iterations > 0 && start.elapsed() >= limit,
        };
        if done {
            break;
        }

        match case.decoder.decode(black_box(corpus), &case.schema, hint) {
            Ok(records) => last = records,
            Err(err) => {
                warn!("Decoder {} failed on iteration {}: {}", case.name, iterations, err);
                return BenchReport::failed(case, corpus.len(), err.to_string());
            }
        }
        iterations += 1;
    }

    let elapsed: Duration = start.elapsed();
    let allocs: AllocSnapshot = AllocSnapshot::take().since(before);

    // #3. Keep the last result observable so the loop cannot be elided
    let records_per_iteration: usize = black_box(&last).len();

    BenchReport {
        name: case.name.clone(),
        schema: case.schema.kind(),
        iterations,
        elapsed,
        records_per_iteration,
        payload_bytes: corpus.len(),
        allocations: allocs.allocations,
        allocated_bytes: allocs.bytes,
        error: None,
    }
}


//
// REPORTING
//

pub fn render_table(reports: &[BenchReport]) -> String {
    let mut out: String = String::new();
    let rule: String = "=".repeat(92);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "{:<10} {:<8} {:>10} {:>12} {:>15} {:>12} {:>10} {:>8}",
        "DECODER", "SCHEMA", "ITERS", "NS/ITER", "RECORDS/S", "MB/S", "ALLOCS/IT", "RECORDS"
    );
    let _ = writeln!(out, "{}", "-".repeat(92));

    for report in reports {
        if let Some(err) = &report.error {
            let _ = writeln!(out, "{:<10} {:<8} FAILED: {}", report.name, report.schema, err);
            continue;
        }
        let _ = writeln!(
            out,
            "{:<10} {:<8} {:>10} {:>12.0} {:>15.0} {:>12.2} {:>10.1} {:>8}",
            report.name,
            report.schema,
            report.iterations,
            report.nanos_per_iteration(),
            report.records_per_sec(),
            report.bytes_per_sec() / 1_000_000.0,
            report.allocations_per_iteration(),
            report.records_per_iteration
        );
    }
    let _ = write!(out, "{}", rule);

    out
}
