//! 规则评估
//!
//! 每条规则要么触发一次 `AlertEvent`，要么返回带原因的 `Skipped`。
//! 已触发集合是 at-most-once 的唯一保证。

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::trading::cache::NameLookupTable;
use crate::trading::upbit::market::PriceSnapshot;
use crate::trading::watch::alert_set::FiredSet;
use crate::trading::watch::rule::{AlertKey, Condition, WatchRule};

/// 规则触发事件
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub stock_name: String,
    pub reason: String,
    pub market: String,
    pub condition: Condition,
    pub target_price: i64,
    pub current_price: i64,
    pub timestamp: DateTime<Local>,
}

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyFired,
    UnresolvedMarket,
    UnparseablePrice,
    InvalidCondition,
    NoCurrentPrice,
    ConditionNotMet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    Fired(AlertEvent),
    Skipped(SkipReason),
}

impl EvalOutcome {
    pub fn fired(self) -> Option<AlertEvent> {
        match self {
            EvalOutcome::Fired(event) => Some(event),
            EvalOutcome::Skipped(_) => None,
        }
    }
}

/// 规则的静态校验结果（不依赖现价）
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRule {
    pub market: String,
    pub condition: Condition,
    pub target_price: i64,
}

/// 校验规则能否被评估：市场可解析、条件合法、目标价可解析
pub fn resolve_rule(rule: &WatchRule, lookup: &NameLookupTable) -> Option<ResolvedRule> {
    let market = lookup.resolve(&rule.stock_name)?;
    let condition = rule.parsed_condition()?;
    let target_price = rule.target_price()?;
    Some(ResolvedRule {
        market: market.to_string(),
        condition,
        target_price,
    })
}

/// 评估一条规则，满足条件时写入 fired 并返回事件
pub fn evaluate(
    rule: &WatchRule,
    snapshot: &PriceSnapshot,
    lookup: &NameLookupTable,
    fired: &mut FiredSet,
    now: DateTime<Local>,
) -> EvalOutcome {
    let key: AlertKey = rule.alert_key();
    if fired.contains(&key) {
        return EvalOutcome::Skipped(SkipReason::AlreadyFired);
    }

    let Some(market) = lookup.resolve(&rule.stock_name) else {
        warn!("[리스트 감시] 마켓 매핑 실패: {} ({})", rule.stock_name, rule.reason);
        return EvalOutcome::Skipped(SkipReason::UnresolvedMarket);
    };

    let Some(target_price) = rule.target_price() else {
        debug!("目标价无法解析: {} ({})", rule.stock_name, rule.reason);
        return EvalOutcome::Skipped(SkipReason::UnparseablePrice);
    };

    let Some(condition) = rule.parsed_condition() else {
        debug!("监控条件无效: {} ({}) - {}", rule.stock_name, rule.reason, rule.condition);
        return EvalOutcome::Skipped(SkipReason::InvalidCondition);
    };

    let Some(&current_price) = snapshot.get(market) else {
        return EvalOutcome::Skipped(SkipReason::NoCurrentPrice);
    };

    if !condition.is_met(current_price, target_price) {
        return EvalOutcome::Skipped(SkipReason::ConditionNotMet);
    }

    fired.insert(key);
    EvalOutcome::Fired(AlertEvent {
        stock_name: rule.stock_name.clone(),
        reason: rule.reason.clone(),
        market: market.to_string(),
        condition,
        target_price,
        current_price,
        timestamp: now,
    })
}

/// 持有已触发集合的评估器，随监控进程存活
#[derive(Debug, Default)]
pub struct RuleEvaluator {
    fired: FiredSet,
}

impl RuleEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(
        &mut self,
        rule: &WatchRule,
        snapshot: &PriceSnapshot,
        lookup: &NameLookupTable,
        now: DateTime<Local>,
    ) -> EvalOutcome {
        evaluate(rule, snapshot, lookup, &mut self.fired, now)
    }

    /// 按顺序评估一批规则，返回本轮触发的事件
    pub fn evaluate_all(
        &mut self,
        rules: &[WatchRule],
        snapshot: &PriceSnapshot,
        lookup: &NameLookupTable,
        now: DateTime<Local>,
    ) -> Vec<AlertEvent> {
        rules
            .iter()
            .filter_map(|rule| self.evaluate(rule, snapshot, lookup, now).fired())
            .collect()
    }

    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }
}
