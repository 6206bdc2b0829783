// @file: kline_engine/src/core/mod.rs
// @description: Exports the schema, record model, error taxonomy and decoder contract.
// @author: LAS.

pub mod decoder;
pub mod error;
pub mod models;
pub mod schema;
