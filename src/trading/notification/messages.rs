//! 推送文案

use chrono::{DateTime, Local};
use num_format::{Locale, ToFormattedString};

use crate::time_util::{format_minute, format_second};
use crate::trading::analysis::ChangeSummary;
use crate::trading::watch::AlertEvent;

/// 规则现状消息最多列出的条数
pub const STATUS_MAX_LINES: usize = 30;

/// 千分位金额，如 1,234,500
pub fn format_won(amount: i64) -> String {
    amount.to_formatted_string(&Locale::en)
}

pub fn started(label: &str, title: &str, now: &DateTime<Local>) -> String {
    format!("🟢 [{}] {} 시작\n({})", label, title, format_second(now))
}

pub fn stopped(label: &str, now: &DateTime<Local>) -> String {
    format!("🔴 [{}] 종료\n({})", label, format_second(now))
}

pub fn rule_alert(event: &AlertEvent) -> String {
    format!(
        "🔔 [리스트 감시] {} - {}\n   감시가격 {} {}원 | 현재가 {}원\n   ({})",
        event.stock_name,
        event.reason,
        event.condition,
        format_won(event.target_price),
        format_won(event.current_price),
        format_minute(&event.timestamp)
    )
}

/// 规则现状正文，lines 为每条有效规则的一行描述
pub fn rule_status(lines: &[String]) -> String {
    if lines.is_empty() {
        return "리스트 감시: 등록 0건 (규칙 파일 있음)".to_string();
    }
    let mut body = lines
        .iter()
        .take(STATUS_MAX_LINES)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    if lines.len() > STATUS_MAX_LINES {
        body.push_str(&format!("\n  … 외 {}건", lines.len() - STATUS_MAX_LINES));
    }
    format!("리스트 감시 현황 ({}건)\n{}", lines.len(), body)
}

pub fn rule_status_line(name: &str, reason: &str, target: i64, condition: &str) -> String {
    format!("  · {} | {} | {}원 {}", name, reason, format_won(target), condition)
}

pub fn rule_status_disabled(reason: &str) -> String {
    format!("리스트 감시: 미사용 ({})", reason)
}

fn tier_lines(summary: &ChangeSummary) -> String {
    format!(
        "전체 종목: {}개\n\
         상승: +5%↑ {}개 (+10%↑ {}개 | +15%↑ {}개)\n\
         보합(-5%~+5%): {}개\n\
         하락: -5%↓ {}개 (-10%↓ {}개 | -15%↓ {}개)",
        summary.total,
        summary.rise_5,
        summary.rise_10,
        summary.rise_15,
        summary.neutral,
        summary.fall_5,
        summary.fall_10,
        summary.fall_15
    )
}

pub fn fall_alert(summary: &ChangeSummary, now: &DateTime<Local>, report_file: &str) -> String {
    format!(
        "📉 경고: -15% 이하 하락 종목이 {}개 이상 발생!\n({})\n{}\n파일: {}",
        summary.fall_below_15.len(),
        format_minute(now),
        tier_lines(summary),
        report_file
    )
}

pub fn daily_summary(summary: &ChangeSummary, now: &DateTime<Local>, report_file: &str) -> String {
    format!(
        "📊 업비트 원화시장 요약 리포트 ({})\n{}\n파일: {}",
        format_minute(now),
        tier_lines(summary),
        report_file
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::watch::Condition;
    use chrono::TimeZone;

    #[test]
    fn test_format_won() {
        assert_eq!(format_won(1234500), "1,234,500");
        assert_eq!(format_won(999), "999");
        assert_eq!(format_won(-1000), "-1,000");
    }

    #[test]
    fn test_rule_alert() {
        let event = AlertEvent {
            stock_name: "BTC".to_string(),
            reason: "지지선".to_string(),
            market: "KRW-BTC".to_string(),
            condition: Condition::AtOrAbove,
            target_price: 50000000,
            current_price: 50000001,
            timestamp: Local.with_ymd_and_hms(2025, 10, 27, 9, 15, 0).unwrap(),
        };
        assert_eq!(
            rule_alert(&event),
            "🔔 [리스트 감시] BTC - 지지선\n   감시가격 이상 50,000,000원 | 현재가 50,000,001원\n   (2025-10-27 09:15)"
        );
    }

    #[test]
    fn test_rule_status_truncates() {
        let lines: Vec<String> = (0..32)
            .map(|i| rule_status_line(&format!("C{}", i), "r", 1000, "이상"))
            .collect();
        let text = rule_status(&lines);
        assert!(text.starts_with("리스트 감시 현황 (32건)\n  · C0 | r | 1,000원 이상"));
        assert!(text.contains("C29"));
        assert!(!text.contains("C30 "));
        assert!(text.ends_with("  … 외 2건"));
        assert_eq!(rule_status(&[]), "리스트 감시: 등록 0건 (규칙 파일 있음)");
    }

    #[test]
    fn test_summary_messages() {
        let summary = ChangeSummary {
            total: 10,
            rise_5: 3,
            ..Default::default()
        };
        let now = Local.with_ymd_and_hms(2025, 10, 27, 8, 30, 0).unwrap();
        let text = daily_summary(&summary, &now, "report.md");
        assert!(text.starts_with("📊 업비트 원화시장 요약 리포트 (2025-10-27 08:30)\n전체 종목: 10개"));
        assert!(text.contains("+5%↑ 3개"));
        assert!(text.ends_with("파일: report.md"));
        assert!(fall_alert(&summary, &now, "r.md").starts_with("📉 경고: -15% 이하 하락 종목이 0개"));
    }
}
