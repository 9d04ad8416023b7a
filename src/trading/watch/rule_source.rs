use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use encoding_rs::EUC_KR;
use tracing::warn;

use crate::error::AppResult;

/// 规则表列名
pub const COL_ACTIVE: &str = "감시중";
pub const COL_NAME: &str = "종목명";
pub const COL_REASON: &str = "감시사유";
pub const COL_WATCH_PRICE: &str = "감시가격";
pub const COL_CONDITION: &str = "감시조건";
pub const COL_REFERENCE_PRICE: &str = "기준가격";
pub const COL_OFFSET_PERCENT: &str = "비율";

const ACTIVE_FLAG: &str = "O";

/// 规则表的一行：列名 → 单元格文本
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRow {
    fields: HashMap<String, String>,
}

impl RuleRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// 去掉首尾空白后的单元格内容，缺列时为空串
    pub fn field(&self, column: &str) -> &str {
        self.fields.get(column).map(|v| v.trim()).unwrap_or("")
    }

    /// 缺列或空白时为 None
    pub fn optional(&self, column: &str) -> Option<&str> {
        Some(self.field(column)).filter(|v| !v.is_empty())
    }

    pub fn is_active(&self) -> bool {
        self.field(COL_ACTIVE).eq_ignore_ascii_case(ACTIVE_FLAG) && !self.field(COL_NAME).is_empty()
    }
}

/// 读取规则表并只保留 감시중=O 且 종목명 非空的行
///
/// 文件打不开时返回空列表，相当于关闭规则监控。
pub fn load_active_rules(path: &Path) -> Vec<RuleRow> {
    match read_rows(path) {
        Ok(rows) => rows.into_iter().filter(RuleRow::is_active).collect(),
        Err(e) => {
            warn!("[리스트 감시] 规则表读取失败: {} - {}", path.display(), e);
            Vec::new()
        }
    }
}

/// 表格软件导出的 CSV 可能是 UTF-8（带或不带 BOM），也可能是 CP949
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    if let Some(rest) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return String::from_utf8_lossy(rest);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, had_errors) = EUC_KR.decode_without_bom_handling(bytes);
            if had_errors {
                warn!("[리스트 감시] 규칙 파일 인코딩 판별 실패, 일부 문자 대체");
            }
            text
        }
    }
}

fn read_rows(path: &Path) -> AppResult<Vec<RuleRow>> {
    let bytes = fs::read(path)?;
    let text = decode_text(&bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("规则表第 {} 行解析失败，已跳过: {}", line + 2, e);
                continue;
            }
        };
        let row = RuleRow::from_pairs(
            header
                .iter()
                .zip(record.iter())
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| (name.clone(), value.to_string())),
        );
        rows.push(row);
    }
    Ok(rows)
}
