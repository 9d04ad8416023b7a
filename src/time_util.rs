use std::time::Duration;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeZone};

/// 通知正文里的时间，精确到分钟
pub fn format_minute<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// 日志/报告标题里的时间，精确到秒
pub fn format_second<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 报告文件按月切分的后缀，如 202510
pub fn month_tag(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

/// 当前本地时间
pub fn now_local() -> DateTime<Local> {
    Local::now()
}

/// 等待日志里的下一次执行时间（HH:MM:SS），超出时间范围时为 "-"
pub fn next_run_label(now: &DateTime<Local>, interval: Duration) -> String {
    chrono::Duration::from_std(interval)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .map(|next| next.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// 是否已到达（或超过）当日的某个时刻
pub fn is_at_or_after(now: &DateTime<Local>, time: NaiveTime) -> bool {
    now.time() >= time
}
