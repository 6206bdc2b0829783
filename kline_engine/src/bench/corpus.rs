// @file: kline_engine/src/bench/corpus.rs
// @description: Benchmark inputs. Deterministic synthetic kline payloads and on-disk corpora.
// @author: LAS.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write;
use std::path::Path;

//
// CONSTANTS
//

const FIRST_OPEN_TIME_MS: i64 = 1_499_040_000_000;
const INTERVAL_MS: i64 = 60_000;
const SCALE: u64 = 100_000_000; // 8 decimal places
const SEED: u64 = 0x9E37_79B9_7F4A_7C15;

//
// SYNTHETIC PAYLOAD
//

fn push_decimal(out: &mut String, scaled: u64) {
    let _ = write!(out, "\"{}.{:08}\"", scaled / SCALE, scaled % SCALE);
}

/// Builds a `/api/v3/klines`-shaped payload with `records` one-minute candles.
/// The RNG is seeded with a constant, so output depends only on `records`.
pub fn synthetic(records: usize) -> Vec<u8> {
    let mut rng: StdRng = StdRng::seed_from_u64(SEED);
    let mut out: String = String::with_capacity(records * 192 + 2);
    let mut price: u64 = 9_300 * SCALE;

    out.push('[');
    for i in 0..records {
        if i > 0 {
            out.push(',');
        }

        // #1. Price path
        let open: u64 = price;
        let drift: u64 = rng.gen_range(0..SCALE * 20);
        let close: u64 = if rng.gen_bool(0.5) { open + drift } else { open.saturating_sub(drift).max(SCALE) };
        let high: u64 = open.max(close) + rng.gen_range(0..SCALE * 5);
        let low: u64 = open.min(close).saturating_sub(rng.gen_range(0..SCALE * 5)).max(1);
        price = close;

        // #2. Volumes and counts
        let volume: u64 = rng.gen_range(1..=SCALE * 400);
        let quote_volume: u64 = volume / SCALE * (close / SCALE) * SCALE + rng.gen_range(0..SCALE);
        let trades: u64 = rng.gen_range(1..=5_000);
        let taker_base: u64 = volume / 2;
        let taker_quote: u64 = quote_volume / 2;

        let open_time: i64 = FIRST_OPEN_TIME_MS + INTERVAL_MS * i as i64;
        let close_time: i64 = open_time + INTERVAL_MS - 1;

        // #3. Columns in wire order
        let _ = write!(out, "[{},", open_time);
        for value in [open, high, low, close, volume] {
            push_decimal(&mut out, value);
            out.push(',');
        }
        let _ = write!(out, "{},", close_time);
        push_decimal(&mut out, quote_volume);
        let _ = write!(out, ",{},", trades);
        push_decimal(&mut out, taker_base);
        out.push(',');
        push_decimal(&mut out, taker_quote);
        out.push_str(",\"0\"]");
    }
    out.push(']');

    out.into_bytes()
}

pub fn load(path: &Path) -> std::io::Result<Vec<u8>> {
    let bytes: Vec<u8> = std::fs::read(path)?;
    info!("Loaded corpus {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}
