use crate::error::{AppError, AppResult};
use crate::trading::upbit::market::TickerData;

/// 单个市场的涨跌幅（%）
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRate {
    pub market: String,
    pub change_rate: f64,
}

impl ChangeRate {
    pub fn new(market: &str, change_rate: f64) -> Self {
        Self {
            market: market.to_string(),
            change_rate,
        }
    }
}

/// 全市场涨跌分档统计
///
/// 各档位互相重叠：+20% 同时计入 rise_5、rise_10、rise_15。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSummary {
    pub total: usize,
    pub rise_5: usize,
    pub rise_10: usize,
    pub rise_15: usize,
    /// -5 < rate < 5
    pub neutral: usize,
    pub fall_5: usize,
    pub fall_10: usize,
    pub fall_15: usize,
    pub rise_over_15: Vec<ChangeRate>,
    pub fall_below_15: Vec<ChangeRate>,
}

pub fn analyze(change_rates: &[ChangeRate]) -> ChangeSummary {
    let mut summary = ChangeSummary {
        total: change_rates.len(),
        ..Default::default()
    };

    for d in change_rates {
        let rate = d.change_rate;
        if rate >= 15.0 {
            summary.rise_15 += 1;
            summary.rise_over_15.push(d.clone());
        }
        if rate >= 10.0 {
            summary.rise_10 += 1;
        }
        if rate >= 5.0 {
            summary.rise_5 += 1;
        }
        if -5.0 < rate && rate < 5.0 {
            summary.neutral += 1;
        }
        if rate <= -5.0 {
            summary.fall_5 += 1;
        }
        if rate <= -10.0 {
            summary.fall_10 += 1;
        }
        if rate <= -15.0 {
            summary.fall_15 += 1;
            summary.fall_below_15.push(d.clone());
        }
    }

    summary
}

/// 以昨收计算涨跌幅
///
/// 成交价或昨收缺失、昨收为0时返回错误，整轮统计放弃。
pub fn compute_change_rates(tickers: &[TickerData]) -> AppResult<Vec<ChangeRate>> {
    tickers
        .iter()
        .map(|t| {
            let trade = t
                .trade_price
                .ok_or_else(|| AppError::invalid_ticker(&t.market, "trade_price 缺失"))?;
            let prev = t
                .prev_closing_price
                .ok_or_else(|| AppError::invalid_ticker(&t.market, "prev_closing_price 缺失"))?;
            if prev == 0.0 {
                return Err(AppError::invalid_ticker(&t.market, "prev_closing_price 为0"));
            }
            Ok(ChangeRate::new(&t.market, (trade - prev) / prev * 100.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates(values: &[f64]) -> Vec<ChangeRate> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ChangeRate::new(&format!("KRW-C{}", i), *v))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(analyze(&[]), ChangeSummary::default());
    }

    #[test]
    fn test_tiers_are_nested() {
        let summary = analyze(&rates(&[20.0, 12.0, 6.0, 0.0, -7.0, -11.0, -16.0, -30.0]));
        assert_eq!(summary.total, 8);
        assert_eq!((summary.rise_5, summary.rise_10, summary.rise_15), (3, 2, 1));
        assert_eq!((summary.fall_5, summary.fall_10, summary.fall_15), (4, 3, 2));
        assert_eq!(summary.neutral, 1);
        assert_eq!(summary.rise_over_15.len(), summary.rise_15);
        assert_eq!(summary.fall_below_15.len(), summary.fall_15);
        assert_eq!(summary.rise_over_15[0].market, "KRW-C0");
        assert!(summary.rise_5 >= summary.rise_10 && summary.rise_10 >= summary.rise_15);
        assert!(summary.fall_5 >= summary.fall_10 && summary.fall_10 >= summary.fall_15);
    }

    #[test]
    fn test_boundaries() {
        let summary = analyze(&rates(&[5.0, -5.0, 15.0, -15.0, 4.999]));
        assert_eq!(summary.neutral, 1);
        assert_eq!(summary.rise_5, 2);
        assert_eq!(summary.fall_5, 2);
        assert_eq!(summary.rise_15, 1);
        assert_eq!(summary.fall_15, 1);
        assert_eq!(summary.fall_below_15[0].change_rate, -15.0);
    }

    #[test]
    fn test_compute_change_rates() {
        let tickers = vec![TickerData {
            market: "KRW-BTC".to_string(),
            trade_price: Some(110.0),
            prev_closing_price: Some(100.0),
        }];
        let rates = compute_change_rates(&tickers).unwrap();
        assert!((rates[0].change_rate - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_prev_close_fails_the_batch() {
        let tickers = vec![
            TickerData {
                market: "KRW-BTC".to_string(),
                trade_price: Some(110.0),
                prev_closing_price: Some(100.0),
            },
            TickerData {
                market: "KRW-NEW".to_string(),
                trade_price: Some(1.0),
                prev_closing_price: Some(0.0),
            },
        ];
        match compute_change_rates(&tickers) {
            Err(AppError::InvalidTicker { market, .. }) => assert_eq!(market, "KRW-NEW"),
            other => panic!("unexpected: {:?}", other),
        }

        let missing = vec![TickerData {
            market: "KRW-ETH".to_string(),
            trade_price: None,
            prev_closing_price: Some(1.0),
        }];
        assert!(compute_change_rates(&missing).is_err());
    }
}
