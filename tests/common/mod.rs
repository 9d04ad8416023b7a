#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use upbit_watch::app_config::AppConfig;
use upbit_watch::error::{AppError, AppResult};
use upbit_watch::trading::notification::Notifier;
use upbit_watch::trading::upbit::market::{MarketDataSource, MarketInfo, TickerData};

/// 内存行情源
pub struct FakeSource {
    pub markets: Vec<MarketInfo>,
    pub tickers: Mutex<Vec<TickerData>>,
    pub fail_tickers: AtomicBool,
    pub fail_market_all: AtomicBool,
    pub market_all_calls: AtomicUsize,
    pub ticker_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(markets: &[(&str, &str, &str)]) -> Self {
        Self {
            markets: markets
                .iter()
                .map(|(market, korean, english)| MarketInfo {
                    market: market.to_string(),
                    korean_name: korean.to_string(),
                    english_name: english.to_string(),
                })
                .collect(),
            tickers: Mutex::new(Vec::new()),
            fail_tickers: AtomicBool::new(false),
            fail_market_all: AtomicBool::new(false),
            market_all_calls: AtomicUsize::new(0),
            ticker_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_ticker(&self, market: &str, trade: f64, prev_close: f64) {
        let mut tickers = self.tickers.lock().unwrap();
        tickers.retain(|t| t.market != market);
        tickers.push(ticker(market, trade, prev_close));
    }
}

pub fn ticker(market: &str, trade: f64, prev_close: f64) -> TickerData {
    TickerData {
        market: market.to_string(),
        trade_price: Some(trade),
        prev_closing_price: Some(prev_close),
    }
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn fetch_market_all(&self) -> AppResult<Vec<MarketInfo>> {
        self.market_all_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_market_all.load(Ordering::SeqCst) {
            return Err(AppError::Exchange {
                status: 503,
                message: "maintenance".to_string(),
            });
        }
        Ok(self.markets.clone())
    }

    async fn fetch_tickers(&self, markets: &[String]) -> AppResult<Vec<TickerData>> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_tickers.load(Ordering::SeqCst) {
            return Err(AppError::Exchange {
                status: 500,
                message: "unavailable".to_string(),
            });
        }
        let tickers = self.tickers.lock().unwrap();
        Ok(tickers
            .iter()
            .filter(|t| markets.contains(&t.market))
            .cloned()
            .collect())
    }
}

/// 记录所有消息的通知器
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_message(&self, text: &str) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("telegram down");
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub fn config(report_dir: &Path, list_file: Option<&Path>) -> AppConfig {
    let mut env: HashMap<String, String> = HashMap::new();
    env.insert("REPORT_DIR".into(), report_dir.display().to_string());
    env.insert("FALL_ALERT_THRESHOLD".into(), "2".into());
    if let Some(path) = list_file {
        env.insert("LIST_FILE".into(), path.display().to_string());
    }
    AppConfig::from_lookup(|key| env.get(key).cloned()).unwrap()
}

pub const RULE_HEADER: &str = "감시중,종목명,감시사유,감시가격,감시조건,기준가격,비율";

pub fn write_rules(path: &Path, rows: &[&str]) {
    let mut content = String::from(RULE_HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    std::fs::write(path, content).unwrap();
}
