// @file: kline_engine/src/lib.rs
// @description: Positional kline decoding core, interchangeable backends and the benchmark harness.
// @author: LAS.

pub mod bench;
pub mod connectors;
pub mod core;
pub mod decoders;
pub mod utils;

#[cfg(test)]
mod tests;

// Unit tests measure allocations the same way the runner binary does
#[cfg(test)]
#[global_allocator]
static TEST_ALLOCATOR: bench::alloc::CountingAllocator = bench::alloc::CountingAllocator;

pub use crate::core::decoder::KlineDecoder;
pub use crate::core::error::{DecodeError, SchemaError};
pub use crate::core::models::Kline;
pub use crate::core::schema::{FieldKind, FieldSpec, KlineField, RecordKind, RecordSchema};
