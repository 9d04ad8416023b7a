use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;

use crate::error::{AppError, AppResult};

pub const DEFAULT_MARKET_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_LIST_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_MARKET_CACHE_TTL_SECS: u64 = 600;
pub const DEFAULT_FALL_ALERT_THRESHOLD: usize = 15;
pub const DEFAULT_DAILY_REPORT_TIME: &str = "08:30";
/// 周期类配置的上限（一年），超出按无效处理
pub const MAX_INTERVAL_SECS: u64 = 365 * 24 * 3600;

/// 读取字符串环境变量，若不存在则返回默认值
pub fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) => v,
        Err(_) => default.to_string(),
    }
}

/// 解析正整数，缺失、解析失败、为0或超过 max 时返回默认值
fn parse_bounded(raw: Option<&str>, default: u64, max: u64) -> u64 {
    match raw.map(str::trim).and_then(|v| v.parse::<u64>().ok()) {
        Some(v) if v > 0 && v <= max => v,
        _ => default,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Telegram 凭据，只有常驻进程（market / list）需要
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 缺失或空白都视为未配置，启动即失败
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> AppResult<String> {
            non_blank(lookup(key)).ok_or_else(|| AppError::Config(format!("{} not set", key)))
        };
        Ok(Self {
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            chat_id: required("TELEGRAM_CHAT_ID")?,
        })
    }
}

/// 运行配置，启动时从环境变量（.env）加载一次
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub market_interval: Duration,
    pub list_interval: Duration,
    /// 未设置时关闭规则监控
    pub list_file: Option<PathBuf>,
    pub report_dir: PathBuf,
    pub market_cache_ttl: Duration,
    pub fall_alert_threshold: usize,
    pub daily_report_time: NaiveTime,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意 key→value 来源构建配置，便于测试
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |key: &str, default: u64| {
            Duration::from_secs(parse_bounded(
                lookup(key).as_deref(),
                default,
                MAX_INTERVAL_SECS,
            ))
        };

        let list_file = non_blank(lookup("LIST_FILE")).map(|v| resolve_path(Path::new(&v)));

        let report_dir = non_blank(lookup("REPORT_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let fall_alert_threshold = parse_bounded(
            lookup("FALL_ALERT_THRESHOLD").as_deref(),
            DEFAULT_FALL_ALERT_THRESHOLD as u64,
            u32::MAX as u64,
        ) as usize;

        let daily_report_time = lookup("DAILY_REPORT_TIME")
            .and_then(|v| NaiveTime::parse_from_str(v.trim(), "%H:%M").ok())
            .or_else(|| NaiveTime::parse_from_str(DEFAULT_DAILY_REPORT_TIME, "%H:%M").ok())
            .ok_or_else(|| AppError::Config("DAILY_REPORT_TIME invalid".to_string()))?;

        Ok(Self {
            market_interval: secs("ALL_MA_INTERVAL", DEFAULT_MARKET_INTERVAL_SECS),
            list_interval: secs("LIST_MA_INTERVAL", DEFAULT_LIST_INTERVAL_SECS),
            list_file,
            report_dir,
            market_cache_ttl: secs("MARKET_CACHE_TTL_SECS", DEFAULT_MARKET_CACHE_TTL_SECS),
            fall_alert_threshold,
            daily_report_time,
        })
    }
}

/// 相对路径以当前工作目录为基准
fn resolve_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
