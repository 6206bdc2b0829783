// @file: kline_engine/src/utils/config.rs
// @description: Layered configuration for the benchmark runner and the REST client.
// @author: LAS.

use serde::Deserialize;
use config::{Config, ConfigError, File, Environment};
use std::time::Duration;
use crate::bench::Budget;
use crate::core::error::SchemaError;
use crate::core::schema::RecordKind;

//
// TYPE DEFINITIONS
//

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,

    // Benchmark Inputs
    pub corpus_path: Option<String>,
    pub corpus_records: usize,
    pub schema: String,
    // Comma separated backend names; empty means every compiled-in backend
    pub decoders: String,

    // Benchmark Budget
    pub iterations: u64,
    pub duration_ms: Option<u64>,

    // Binance REST Endpoints
    pub binance_spot_rest_url: String,
    pub binance_futures_rest_url: String,
    pub binance_delivery_rest_url: String,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    //
    // PUBLIC INTERFACE
    //

    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("log_level", "info")?
            .set_default("corpus_records", 1000)?
            .set_default("schema", "full")?
            .set_default("decoders", "")?
            .set_default("iterations", 2000)?

            // Binance Endpoints
            .set_default("binance_spot_rest_url", "https://api.binance.com")?
            .set_default("binance_futures_rest_url", "https://fapi.binance.com")?
            .set_default("binance_delivery_rest_url", "https://dapi.binance.com")?
            .set_default("request_timeout_secs", 10)?

            // File & Env Overrides
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("KLINE"));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn record_kind(&self) -> Result<RecordKind, SchemaError> {
        self.schema.parse()
    }

    pub fn decoder_names(&self) -> Vec<String> {
        self.decoders
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    // A duration budget wins over an iteration count
    pub fn budget(&self) -> Budget {
        match self.duration_ms {
            Some(ms) => Budget::Duration(Duration::from_millis(ms)),
            None => Budget::Iterations(self.iterations),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
