use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::trading::upbit::upbit_client::UpbitClient;

/// 目录接口超时
pub const MARKET_ALL_TIMEOUT: Duration = Duration::from_secs(10);
/// 批量行情接口超时
pub const TICKER_TIMEOUT: Duration = Duration::from_secs(15);
/// 单币种查询的固定尝试次数
pub const SINGLE_PRICE_ATTEMPTS: usize = 3;
const SINGLE_PRICE_RETRY_INTERVAL_MS: u64 = 500;

/// 市场目录条目（/v1/market/all）
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MarketInfo {
    /// 形如 KRW-BTC
    pub market: String,
    #[serde(default)]
    pub korean_name: String,
    #[serde(default)]
    pub english_name: String,
}

impl MarketInfo {
    /// 去掉计价币前缀后的币种代码，KRW-BTC → BTC
    pub fn symbol(&self) -> &str {
        match self.market.split_once('-') {
            Some((_, base)) => base,
            None => &self.market,
        }
    }
}

/// 行情（/v1/ticker），只保留用到的字段
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TickerData {
    pub market: String,
    #[serde(default)]
    pub trade_price: Option<f64>,
    #[serde(default)]
    pub prev_closing_price: Option<f64>,
}

/// market_code → 最新成交价（整数）
pub type PriceSnapshot = HashMap<String, i64>;

/// 交易所行情数据接口
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 获取全部市场目录
    async fn fetch_market_all(&self) -> AppResult<Vec<MarketInfo>>;

    /// 批量获取行情，markets 以逗号拼接成一次请求
    async fn fetch_tickers(&self, markets: &[String]) -> AppResult<Vec<TickerData>>;
}

#[async_trait]
impl MarketDataSource for UpbitClient {
    async fn fetch_market_all(&self) -> AppResult<Vec<MarketInfo>> {
        self.send_request("/v1/market/all", &[("isDetails", "true")], MARKET_ALL_TIMEOUT)
            .await
    }

    async fn fetch_tickers(&self, markets: &[String]) -> AppResult<Vec<TickerData>> {
        let joined = markets.join(",");
        self.send_request("/v1/ticker", &[("markets", joined.as_str())], TICKER_TIMEOUT)
            .await
    }
}

/// 一次批量请求拿到所有市场的现价，没有成交价的条目直接丢弃
pub async fn fetch_price_snapshot(
    source: &dyn MarketDataSource,
    markets: &[String],
) -> AppResult<PriceSnapshot> {
    if markets.is_empty() {
        return Ok(PriceSnapshot::new());
    }
    let tickers = source.fetch_tickers(markets).await?;
    Ok(to_price_snapshot(&tickers))
}

pub fn to_price_snapshot(tickers: &[TickerData]) -> PriceSnapshot {
    tickers
        .iter()
        .filter_map(|t| t.trade_price.map(|p| (t.market.clone(), p as i64)))
        .collect()
}

/// 单币种现价查询，失败时以固定间隔重试
pub async fn fetch_single_price(source: &dyn MarketDataSource, market: &str) -> AppResult<i64> {
    let markets = vec![market.to_string()];
    let markets = &markets;
    let strategy =
        FixedInterval::from_millis(SINGLE_PRICE_RETRY_INTERVAL_MS).take(SINGLE_PRICE_ATTEMPTS - 1);

    Retry::spawn(strategy, || async move {
        let tickers = source.fetch_tickers(markets).await.map_err(|e| {
            warn!("单币种行情查询失败: {} - {}", market, e);
            e
        })?;
        to_price_snapshot(&tickers)
            .get(market)
            .copied()
            .ok_or_else(|| AppError::invalid_ticker(market, "trade_price 缺失"))
    })
    .await
}
