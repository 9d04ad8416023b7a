use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use tracing::{info, warn};

use crate::app_config::AppConfig;
use crate::job::task_scheduler::PeriodicJob;
use crate::time_util::{format_minute, format_second, is_at_or_after, next_run_label, now_local};
use crate::trading::analysis::{analyze, compute_change_rates, ChangeSummary, MarketReport};
use crate::trading::cache::MarketDirectoryCache;
use crate::trading::notification::{messages, Notifier};
use crate::trading::upbit::market::MarketDataSource;

pub const MARKET_JOB_LABEL: &str = "upbit_watch:market";
pub const MARKET_JOB_TITLE: &str = "업비트 시장 분석";

/// 全市场涨跌统计任务
pub struct MarketJob {
    source: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn Notifier>,
    cache: MarketDirectoryCache,
    report: MarketReport,
    fall_alert_threshold: usize,
    daily_report_time: NaiveTime,
    last_daily_report: Option<NaiveDate>,
}

impl MarketJob {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
    ) -> Self {
        Self {
            source,
            notifier,
            cache: MarketDirectoryCache::new(config.market_cache_ttl),
            report: MarketReport::new(&config.report_dir),
            fall_alert_threshold: config.fall_alert_threshold,
            daily_report_time: config.daily_report_time,
            last_daily_report: None,
        }
    }

    /// 执行一轮：目录 → 行情 → 涨跌幅 → 统计 → 报告 → 推送
    ///
    /// 任何一步失败整轮作废，报告和推送都不会发生。
    pub async fn run_at(&mut self, now: DateTime<Local>) -> anyhow::Result<ChangeSummary> {
        let directory = self.cache.get_directory(self.source.as_ref()).await?;
        let tickers = if directory.markets.is_empty() {
            warn!("KRW 市场列表为空");
            Vec::new()
        } else {
            self.source.fetch_tickers(&directory.markets).await?
        };

        let change_rates = compute_change_rates(&tickers)?;
        let summary = analyze(&change_rates);
        let path = self.report.append(&summary, &now)?;
        let report_file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        if summary.fall_below_15.len() >= self.fall_alert_threshold {
            warn!(
                "📉 -15% 이하 하락 {}개 (기준 {}개)",
                summary.fall_below_15.len(),
                self.fall_alert_threshold
            );
            self.notifier
                .notify(&messages::fall_alert(&summary, &now, &report_file))
                .await;
        }

        let today = now.date_naive();
        if is_at_or_after(&now, self.daily_report_time) && self.last_daily_report != Some(today) {
            self.notifier
                .notify(&messages::daily_summary(&summary, &now, &report_file))
                .await;
            self.last_daily_report = Some(today);
            info!("[로그] 일일 정리 리포트 전송 완료 ({})", format_minute(&now));
        }

        Ok(summary)
    }
}

#[async_trait]
impl PeriodicJob for MarketJob {
    fn name(&self) -> &str {
        MARKET_JOB_LABEL
    }

    async fn run_cycle(&mut self) -> anyhow::Result<()> {
        self.run_at(now_local()).await.map(|_| ())
    }

    fn after_cycle(&self, interval: Duration) {
        let now = now_local();
        info!(
            "[{}] ⏳ {}초 대기 중... 다음 {}",
            format_second(&now),
            interval.as_secs(),
            next_run_label(&now, interval)
        );
    }
}
