use std::fmt;
use std::str::FromStr;

use crate::trading::watch::rule_source::{
    RuleRow, COL_CONDITION, COL_NAME, COL_OFFSET_PERCENT, COL_REASON, COL_REFERENCE_PRICE,
    COL_WATCH_PRICE,
};

/// 比较条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// 이상：现价 ≥ 目标价
    AtOrAbove,
    /// 이하：现价 ≤ 目标价
    AtOrBelow,
}

impl Condition {
    pub fn is_met(&self, current: i64, target: i64) -> bool {
        match self {
            Condition::AtOrAbove => current >= target,
            Condition::AtOrBelow => current <= target,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Condition::AtOrAbove => "이상",
            Condition::AtOrBelow => "이하",
        }
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "이상" | "at_or_above" => Ok(Condition::AtOrAbove),
            "이하" | "at_or_below" => Ok(Condition::AtOrBelow),
            other => Err(format!("未知的监控条件: {}", other)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 去重单位：(종목명, 감시사유)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKey {
    pub stock_name: String,
    pub reason: String,
}

impl AlertKey {
    pub fn new(stock_name: &str, reason: &str) -> Self {
        Self {
            stock_name: stock_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// 一条监控规则，保留原始文本，评估时再解析
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WatchRule {
    pub stock_name: String,
    pub reason: String,
    pub condition: String,
    pub watch_price: Option<String>,
    pub reference_price: Option<String>,
    pub offset_percent: Option<String>,
}

impl WatchRule {
    pub fn from_row(row: &RuleRow) -> Self {
        Self {
            stock_name: row.field(COL_NAME).to_string(),
            reason: row.field(COL_REASON).to_string(),
            condition: row.field(COL_CONDITION).to_string(),
            watch_price: row.optional(COL_WATCH_PRICE).map(str::to_string),
            reference_price: row.optional(COL_REFERENCE_PRICE).map(str::to_string),
            offset_percent: row.optional(COL_OFFSET_PERCENT).map(str::to_string),
        }
    }

    pub fn alert_key(&self) -> AlertKey {
        AlertKey::new(&self.stock_name, &self.reason)
    }

    pub fn parsed_condition(&self) -> Option<Condition> {
        self.condition.parse().ok()
    }

    pub fn target_price(&self) -> Option<i64> {
        parse_target_price(
            self.watch_price.as_deref(),
            self.reference_price.as_deref(),
            self.offset_percent.as_deref(),
        )
    }
}

/// 从规则行计算目标价
pub fn resolve_target_price(row: &RuleRow) -> Option<i64> {
    WatchRule::from_row(row).target_price()
}

/// 目标价解析
///
/// 1. 감시가격 去掉 ₩、逗号、원 后是数字 → 直接使用（截断为整数）
/// 2. 否则 기준가격 为数字且有 비율 → floor(기준가격 × (1 + 비율/100))
/// 3. 其余（如 기준가격 写成 "20일선"）→ None
pub fn parse_target_price(
    watch_price: Option<&str>,
    reference_price: Option<&str>,
    offset_percent: Option<&str>,
) -> Option<i64> {
    if let Some(price) = watch_price.and_then(parse_amount) {
        return Some(price.trunc() as i64);
    }

    let reference = parse_amount(reference_price?)?;
    let offset = parse_percent(offset_percent?)?;
    let target = (reference * (1.0 + offset / 100.0)).floor();
    target.is_finite().then_some(target as i64)
}

fn is_blank(raw: &str) -> bool {
    matches!(raw.trim(), "" | "None" | "NaT")
}

/// 金额文本 → 数值，只接受数字、至多一个小数点和一个负号
fn parse_amount(raw: &str) -> Option<f64> {
    if is_blank(raw) {
        return None;
    }
    let cleaned: String = raw
        .replace(['₩', ',', '원'], "")
        .trim()
        .to_string();
    if !is_plain_number(&cleaned) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_plain_number(s: &str) -> bool {
    let stripped = s.replacen('.', "", 1).replacen('-', "", 1);
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

/// 비율 文本，如 "-5%"、"3.5"
fn parse_percent(raw: &str) -> Option<f64> {
    raw.replace('%', "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
