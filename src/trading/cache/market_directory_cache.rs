use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::error::AppResult;
use crate::trading::upbit::market::{MarketDataSource, MarketInfo};

/// 默认计价币
pub const DEFAULT_QUOTE_CURRENCY: &str = "KRW";

/// 名称 → market_code 映射
///
/// 键包括韩文名、英文名、币种代码、market_code 以及 `币种/计价币`。
/// 保持插入顺序，大小写不敏感的回退扫描按插入顺序取第一个命中。
#[derive(Debug, Clone, Default)]
pub struct NameLookupTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl NameLookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同名键覆盖旧值，但保留原位置
    pub fn insert(&mut self, key: &str, market: &str) {
        if key.is_empty() {
            return;
        }
        match self.index.get(key) {
            Some(&pos) => self.entries[pos].1 = market.to_string(),
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), market.to_string()));
            }
        }
    }

    /// 精确匹配
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    /// 先精确匹配，失败后做大小写不敏感扫描
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some(market) = self.get(name) {
            return Some(market);
        }
        let upper = name.to_uppercase();
        self.entries
            .iter()
            .find(|(key, _)| key.to_uppercase() == upper)
            .map(|(_, market)| market.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 一次目录拉取的结果
#[derive(Debug, Clone, Default)]
pub struct MarketDirectory {
    pub lookup: NameLookupTable,
    /// 按交易所返回顺序的计价币市场列表
    pub markets: Vec<String>,
}

impl MarketDirectory {
    /// 过滤出指定计价币的市场并构建名称映射
    pub fn build(raw: &[MarketInfo], quote: &str) -> Self {
        let prefix = format!("{}-", quote);
        let mut lookup = NameLookupTable::new();
        let mut markets = Vec::new();

        for info in raw.iter().filter(|m| m.market.starts_with(&prefix)) {
            let market = info.market.as_str();
            let symbol = info.symbol();
            markets.push(market.to_string());
            lookup.insert(&info.korean_name, market);
            lookup.insert(&info.english_name, market);
            lookup.insert(symbol, market);
            lookup.insert(market, market);
            lookup.insert(&format!("{}/{}", symbol, quote), market);
        }

        Self { lookup, markets }
    }
}

/// 带 TTL 的市场目录缓存
///
/// 缓存未过期时直接返回；过期后整体重建。拉取失败时错误直接返回给调用方，不回退到旧缓存。
pub struct MarketDirectoryCache {
    ttl: Duration,
    quote: String,
    cached: Option<(Instant, Arc<MarketDirectory>)>,
}

impl MarketDirectoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_quote(ttl, DEFAULT_QUOTE_CURRENCY)
    }

    pub fn with_quote(ttl: Duration, quote: &str) -> Self {
        Self {
            ttl,
            quote: quote.to_string(),
            cached: None,
        }
    }

    pub async fn get_directory(
        &mut self,
        source: &dyn MarketDataSource,
    ) -> AppResult<Arc<MarketDirectory>> {
        if let Some((fetched_at, directory)) = &self.cached {
            if fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(directory));
            }
        }

        let raw = source.fetch_market_all().await?;
        let directory = Arc::new(MarketDirectory::build(&raw, &self.quote));
        info!(
            "市场目录已刷新: {} 个{}市场, {} 个名称键",
            directory.markets.len(),
            self.quote,
            directory.lookup.len()
        );
        self.cached = Some((Instant::now(), Arc::clone(&directory)));
        Ok(directory)
    }
}
