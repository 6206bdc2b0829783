// @file: kline_engine/src/core/models.rs
// @description: Decoded record types produced by the positional decoder.
// @author: LAS.

use serde::{Deserialize, Serialize};
use crate::core::schema::KlineField;


//
// KLINE
//

// Decimal columns keep the exact source text; nothing here is ever parsed to f64.
// Columns a schema does not map stay at their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kline {
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    pub close_time: i64,
    pub quote_asset_volume: String,
    #[serde(rename = "tradeNum")]
    pub trade_count: i64,
    #[serde(rename = "takerBuyBaseAssetVolume")]
    pub taker_buy_base_volume: String,
    #[serde(rename = "takerBuyQuoteAssetVolume")]
    pub taker_buy_quote_volume: String,
}

impl Kline {
    // Integer columns. Decimal targets are rejected at schema construction,
    // so a decimal field here is ignored.
    pub fn set_int(&mut self, field: KlineField, value: i64) {
        match field {
            KlineField::OpenTime => self.open_time = value,
            KlineField::CloseTime => self.close_time = value,
            KlineField::TradeCount => self.trade_count = value,
            _ => {}
        }
    }

    pub fn set_decimal(&mut self, field: KlineField, value: String) {
        let slot: &mut String = match field {
            KlineField::Open => &mut self.open,
            KlineField::High => &mut self.high,
            KlineField::Low => &mut self.low,
            KlineField::Close => &mut self.close,
            KlineField::Volume => &mut self.volume,
            KlineField::QuoteAssetVolume => &mut self.quote_asset_volume,
            KlineField::TakerBuyBaseVolume => &mut self.taker_buy_base_volume,
            KlineField::TakerBuyQuoteVolume => &mut self.taker_buy_quote_volume,
            KlineField::OpenTime | KlineField::CloseTime | KlineField::TradeCount => return,
        };
        *slot = value;
    }
}
