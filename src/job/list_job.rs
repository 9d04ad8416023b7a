use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::app_config::AppConfig;
use crate::error::AppResult;
use crate::job::task_scheduler::PeriodicJob;
use crate::time_util::{format_second, next_run_label, now_local};
use crate::trading::cache::MarketDirectoryCache;
use crate::trading::notification::{messages, Notifier};
use crate::trading::upbit::market::{fetch_price_snapshot, MarketDataSource};
use crate::trading::watch::evaluator::resolve_rule;
use crate::trading::watch::{load_active_rules, AlertEvent, RuleEvaluator, WatchRule};

pub const LIST_JOB_LABEL: &str = "upbit_watch:list";
pub const LIST_JOB_TITLE: &str = "리스트 감시";

/// 规则监控现状
#[derive(Debug, Clone, PartialEq)]
pub enum ListStatus {
    /// 每条可评估规则一行
    Active(Vec<String>),
    /// 未启用及原因
    Disabled(String),
}

impl ListStatus {
    pub fn message(&self) -> String {
        match self {
            ListStatus::Active(lines) => messages::rule_status(lines),
            ListStatus::Disabled(reason) => messages::rule_status_disabled(reason),
        }
    }
}

/// 生成规则监控现状，不发送任何消息
pub async fn watch_list_status(
    list_file: Option<&Path>,
    cache: &mut MarketDirectoryCache,
    source: &dyn MarketDataSource,
) -> AppResult<ListStatus> {
    let Some(path) = list_file else {
        return Ok(ListStatus::Disabled("LIST_FILE 미설정".to_string()));
    };
    if !path.exists() {
        return Ok(ListStatus::Disabled(format!("파일 없음: {}", path.display())));
    }
    let rows = load_active_rules(path);
    if rows.is_empty() {
        return Ok(ListStatus::Disabled("감시중(O) 행 없음".to_string()));
    }

    let directory = cache.get_directory(source).await?;
    let lines = rows
        .iter()
        .map(WatchRule::from_row)
        .filter_map(|rule| {
            resolve_rule(&rule, &directory.lookup).map(|resolved| {
                messages::rule_status_line(
                    &rule.stock_name,
                    &rule.reason,
                    resolved.target_price,
                    resolved.condition.label(),
                )
            })
        })
        .collect();
    Ok(ListStatus::Active(lines))
}

/// 逐条规则监控任务
///
/// 已触发集合与市场目录缓存都由任务自身持有，进程重启即清空。
pub struct ListJob {
    source: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn Notifier>,
    list_file: Option<PathBuf>,
    cache: MarketDirectoryCache,
    evaluator: RuleEvaluator,
    status_sent: bool,
    last_active_count: usize,
}

impl ListJob {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
    ) -> Self {
        Self {
            source,
            notifier,
            list_file: config.list_file.clone(),
            cache: MarketDirectoryCache::new(config.market_cache_ttl),
            evaluator: RuleEvaluator::new(),
            status_sent: false,
            last_active_count: 0,
        }
    }

    pub async fn list_status(&mut self) -> AppResult<ListStatus> {
        watch_list_status(
            self.list_file.as_deref(),
            &mut self.cache,
            self.source.as_ref(),
        )
        .await
    }

    /// 现状消息只需成功发出一次，生成失败则下一轮重试
    async fn send_status_once(&mut self) {
        if self.status_sent {
            return;
        }
        match self.list_status().await {
            Ok(status) => {
                self.notifier
                    .notify(&format!("📋 [{}] {}", LIST_JOB_LABEL, status.message()))
                    .await;
                self.status_sent = true;
            }
            Err(e) => error!("[리스트 감시 현황 오류] {}", e),
        }
    }

    /// 执行一轮规则评估，返回本轮触发的事件
    pub async fn run_at(&mut self, now: DateTime<Local>) -> anyhow::Result<Vec<AlertEvent>> {
        self.send_status_once().await;

        let Some(path) = self.list_file.clone() else {
            return Ok(Vec::new());
        };
        if !path.exists() {
            return Ok(Vec::new());
        }
        let rows = load_active_rules(&path);
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        self.last_active_count = rows.len();

        let directory = self.cache.get_directory(self.source.as_ref()).await?;
        let snapshot = match fetch_price_snapshot(self.source.as_ref(), &directory.markets).await {
            Ok(snapshot) if !snapshot.is_empty() => snapshot,
            Ok(_) => {
                warn!("[리스트 감시] 전종목 시세 없음, 이번 주기 스킵");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!("[리스트 감시] 전종목 시세 조회 실패, 이번 주기 스킵: {}", e);
                return Ok(Vec::new());
            }
        };

        let rules: Vec<WatchRule> = rows.iter().map(WatchRule::from_row).collect();
        let events = self
            .evaluator
            .evaluate_all(&rules, &snapshot, &directory.lookup, now);
        for event in &events {
            self.notifier.notify(&messages::rule_alert(event)).await;
            info!("[리스트 감시] 알림 전송: {} ({})", event.stock_name, event.reason);
        }
        Ok(events)
    }

    /// 最近一次读取的有效行数减去已触发数
    pub fn remaining_count(&self) -> usize {
        self.last_active_count
            .saturating_sub(self.evaluator.fired_count())
    }

    pub fn fired_count(&self) -> usize {
        self.evaluator.fired_count()
    }

    pub fn status_sent(&self) -> bool {
        self.status_sent
    }
}

#[async_trait]
impl PeriodicJob for ListJob {
    fn name(&self) -> &str {
        LIST_JOB_LABEL
    }

    async fn run_cycle(&mut self) -> anyhow::Result<()> {
        self.run_at(now_local()).await.map(|_| ())
    }

    fn after_cycle(&self, interval: Duration) {
        let now = now_local();
        info!(
            "[{}] ⏳ {}초 대기 중... 다음 {} | 리스트 {}건 | 제외 {}건",
            format_second(&now),
            interval.as_secs(),
            next_run_label(&now, interval),
            self.remaining_count(),
            self.fired_count()
        );
    }
}
