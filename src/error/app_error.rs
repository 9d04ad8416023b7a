use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// 应用错误
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置错误（启动阶段致命）
    #[error("配置错误: {0}")]
    Config(String),

    #[error("HTTP请求错误: {0}")]
    Http(#[from] reqwest::Error),

    /// 交易所返回非成功状态
    #[error("Upbit API错误: {status} - {message}")]
    Exchange { status: u16, message: String },

    #[error("JSON解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("规则表读取错误: {0}")]
    Csv(#[from] csv::Error),

    /// 行情数据缺失或昨收为0，无法计算涨跌幅
    #[error("行情数据无效: {market} - {reason}")]
    InvalidTicker { market: String, reason: String },
}

impl AppError {
    pub fn invalid_ticker(market: &str, reason: &str) -> Self {
        AppError::InvalidTicker {
            market: market.to_string(),
            reason: reason.to_string(),
        }
    }
}
