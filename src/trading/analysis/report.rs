use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::error::AppResult;
use crate::time_util::{format_second, month_tag};
use crate::trading::analysis::change_summary::{ChangeRate, ChangeSummary};

pub const REPORT_PREFIX: &str = "upbit_watch_market";

/// 按月切分、只追加的 Markdown 统计报告
#[derive(Debug, Clone)]
pub struct MarketReport {
    dir: PathBuf,
    prefix: String,
}

impl MarketReport {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: REPORT_PREFIX.to_string(),
        }
    }

    /// 每次写入都重新计算路径，跨月自动切到新文件
    pub fn path_for(&self, now: &DateTime<Local>) -> PathBuf {
        self.dir
            .join(format!("{}_{}.md", self.prefix, month_tag(now.date_naive())))
    }

    pub fn append(&self, summary: &ChangeSummary, now: &DateTime<Local>) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(now);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(render(summary, now).as_bytes())?;
        info!("[{}] Markdown 报告已写入 → {}", format_second(now), path.display());
        Ok(path)
    }
}

/// 渲染一轮统计，结尾带分隔线
pub fn render(summary: &ChangeSummary, now: &DateTime<Local>) -> String {
    let mut lines = vec![
        format!("\n# 📈 업비트 원화시장 상승/하락 통계 ({})\n", format_second(now)),
        "| 구분 | 종목 수 |".to_string(),
        "|------|----------|".to_string(),
        format!("| 전체 종목 | {} |", summary.total),
        format!("| (+15% 이상) | {} |", summary.rise_15),
        format!("| (+10% 이상) | {} |", summary.rise_10),
        format!("| +5% 이상 | {} |", summary.rise_5),
        format!("| -5% ~ +5% | {} |", summary.neutral),
        format!("| -5% 이하 | {} |", summary.fall_5),
        format!("| (-10% 이하) | {} |", summary.fall_10),
        format!("| (-15% 이하) | {} |", summary.fall_15),
    ];

    lines.push("\n## 🚀 +15% 이상 상승 종목".to_string());
    push_movers(&mut lines, &summary.rise_over_15, "상승률(%)");

    lines.push("\n## 📉 -15% 이하 하락 종목".to_string());
    push_movers(&mut lines, &summary.fall_below_15, "하락률(%)");

    let mut out = lines.join("\n");
    out.push_str("\n\n---\n\n");
    out
}

fn push_movers(lines: &mut Vec<String>, movers: &[ChangeRate], rate_header: &str) {
    if movers.is_empty() {
        lines.push("- 없음".to_string());
        return;
    }
    lines.push(format!("| 종목명 | {} |", rate_header));
    lines.push("|--------|------------|".to_string());
    for d in movers {
        lines.push(format!("| {} | {:.2}% |", d.market, d.change_rate));
    }
}
