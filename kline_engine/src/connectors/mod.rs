// @file: kline_engine/src/connectors/mod.rs
// @description: Exchange connectors feeding raw kline payloads into the decoder.
// @author: LAS.

pub mod binance_rest;

pub use binance_rest::{BinanceRestClient, FetchError, KlineEndpoint, KlineSource, KlinesRequest};
