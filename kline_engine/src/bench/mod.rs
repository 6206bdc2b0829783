// @file: kline_engine/src/bench/mod.rs
// @description: Benchmark harness, allocation counting and corpus helpers.
// @author: LAS.

pub mod alloc;
pub mod corpus;
pub mod harness;

use thiserror::Error;
use crate::core::error::SchemaError;

pub use harness::{render_table, BenchReport, Budget, Harness};

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("unknown decoder: {0}")]
    UnknownDecoder(String),

    #[error("corpus unavailable: {0}")]
    Corpus(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
