// @file: kline_engine/src/utils/mod.rs
// @description: Shared utilities (configuration).
// @author: LAS.

pub mod config;
