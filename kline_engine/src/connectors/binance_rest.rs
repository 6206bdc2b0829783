// @file: kline_engine/src/connectors/binance_rest.rs
// @description: HTTP client for Binance kline endpoints. Maps responses through the positional decoder.
// @author: LAS.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use url::Url;
use crate::core::decoder::KlineDecoder;
use crate::core::error::DecodeError;
use crate::core::models::Kline;
use crate::core::schema::{RecordKind, RecordSchema};
use crate::decoders::ScanDecoder;
use crate::utils::config::AppConfig;


//
// ERRORS
//

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    // The response arrived but could not be mapped to klines
    #[error("response decode failed: {0}")]
    Decode(#[from] DecodeError),
}


//
// ENDPOINTS
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KlineEndpoint {
    Spot,
    UsdMFutures,
    CoinMFutures,
    PremiumIndex,
}

impl KlineEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            KlineEndpoint::Spot => "/api/v3/klines",
            KlineEndpoint::UsdMFutures => "/fapi/v1/klines",
            KlineEndpoint::CoinMFutures => "/dapi/v1/klines",
            KlineEndpoint::PremiumIndex => "/fapi/v1/premiumIndexKlines",
        }
    }

    // Premium index rows carry no volume columns worth reading
    pub fn record_kind(self) -> RecordKind {
        match self {
            KlineEndpoint::PremiumIndex => RecordKind::Reduced,
            _ => RecordKind::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestEndpoints {
    pub spot: String,
    pub futures: String,
    pub delivery: String,
}

impl RestEndpoints {
    pub fn from_config(config: &AppConfig) -> Self {
        RestEndpoints {
            spot: config.binance_spot_rest_url.clone(),
            futures: config.binance_futures_rest_url.clone(),
            delivery: config.binance_delivery_rest_url.clone(),
        }
    }

    pub fn base_url(&self, endpoint: KlineEndpoint) -> &str {
        match endpoint {
            KlineEndpoint::Spot => &self.spot,
            KlineEndpoint::UsdMFutures | KlineEndpoint::PremiumIndex => &self.futures,
            KlineEndpoint::CoinMFutures => &self.delivery,
        }
    }
}


//
// REQUEST
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlinesRequest {
    pub symbol: String,
    pub interval: String,
    pub limit: Option<u32>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl KlinesRequest {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        KlinesRequest {
            symbol: symbol.into(),
            interval: interval.into(),
            limit: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_time(mut self, start_time: i64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn end_time(mut self, end_time: i64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    // Query parameters in the order Binance documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = vec![
            ("symbol", self.symbol.to_uppercase()),
            ("interval", self.interval.clone()),
        ];
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(start) = self.start_time {
            pairs.push(("startTime", start.to_string()));
        }
        if let Some(end) = self.end_time {
            pairs.push(("endTime", end.to_string()));
        }
        pairs
    }
}

pub fn build_url(base_url: &str, endpoint: KlineEndpoint, request: &KlinesRequest) -> Result<Url, FetchError> {
    let mut url: Url = Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), endpoint.path()))?;
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in request.query_pairs() {
            query.append_pair(key, &value);
        }
    }
    Ok(url)
}


//
// RESPONSE MAPPING
//

// Any decode failure becomes a FetchError; callers never see partial batches.
// A fresh ScanDecoder per call keeps concurrent fetches from sharing scratch state.
pub fn decode_response(status: u16, body: &[u8], schema: &RecordSchema) -> Result<Vec<Kline>, FetchError> {
    if !(200..300).contains(&status) {
        let text: String = String::from_utf8_lossy(body).chars().take(256).collect();
        return Err(FetchError::Status { status, body: text });
    }

    let mut decoder: ScanDecoder = ScanDecoder::new();
    let klines: Vec<Kline> = decoder.decode(body, schema, None)?;
    Ok(klines)
}


//
// CLIENT
//

#[async_trait]
pub trait KlineSource: Send + Sync {
    async fn fetch_klines(&self, endpoint: KlineEndpoint, request: &KlinesRequest) -> Result<Vec<Kline>, FetchError>;
}

pub struct BinanceRestClient {
    client: Client,
    endpoints: RestEndpoints,
    full: Arc<RecordSchema>,
    reduced: Arc<RecordSchema>,
}

impl BinanceRestClient {
    pub fn new(config: &AppConfig) -> Result<Self, FetchError> {
        let client: Client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(BinanceRestClient {
            client,
            endpoints: RestEndpoints::from_config(config),
            full: Arc::new(RecordSchema::full()),
            reduced: Arc::new(RecordSchema::reduced()),
        })
    }

    fn schema_for(&self, endpoint: KlineEndpoint) -> &RecordSchema {
        match endpoint.record_kind() {
            RecordKind::Full => self.full.as_ref(),
            RecordKind::Reduced => self.reduced.as_ref(),
        }
    }
}

#[async_trait]
impl KlineSource for BinanceRestClient {
    async fn fetch_klines(&self, endpoint: KlineEndpoint, request: &KlinesRequest) -> Result<Vec<Kline>, FetchError> {
        // #1. Construct URL
        let url: Url = build_url(self.endpoints.base_url(endpoint), endpoint, request)?;
        debug!("GET {}", url);

        // #2. Execute Request
        let response = self.client.get(url).send().await?;
        let status: u16 = response.status().as_u16();
        let body = response.bytes().await?;

        // #3. Parse Response
        decode_response(status, &body, self.schema_for(endpoint))
    }
}
