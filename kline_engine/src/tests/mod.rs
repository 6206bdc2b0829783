// @file: kline_engine/src/tests/mod.rs
// @description: Test suites for the decoding core, backends, harness and REST mapping.
// @author: LAS.

mod decoder_scenarios;
mod schema_validation;

use crate::core::decoder::KlineDecoder;
use crate::decoders;

// Scenario A from the Binance docs: one full eleven-column kline.
pub(crate) const SCENARIO_A: &str = r#"[[1499040000000,"0.01634790","0.80000000","0.01575800","0.01577100","148976.11427815",1499644799999,"2434.19055334",308,"1756.87402397","28.46694368"]]"#;

// Every backend compiled into this build, baseline ("tree") first.
pub(crate) fn all_decoders() -> Vec<Box<dyn KlineDecoder>> {
    decoders::available()
        .into_iter()
        .filter_map(decoders::by_name)
        .collect()
}
