//! 股票数据模型
//!
//! 定义日线数据及其部分更新请求

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 单日 OHLCV 数据
///
/// (company, date) 唯一确定一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// 公司名称（与配置中的名称一致）
    pub company: String,
    /// 交易日（YYYY-MM-DD）
    pub date: NaiveDate,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 收盘价
    pub close: f64,
    /// 成交量
    pub volume: i64,
}

/// 数据库行：Company, Date, Open, High, Low, Close, Volume
pub type PriceRow = (String, NaiveDate, f64, f64, f64, f64, i64);

impl From<PriceRow> for PriceBar {
    fn from(row: PriceRow) -> Self {
        Self {
            company: row.0,
            date: row.1,
            open: row.2,
            high: row.3,
            low: row.4,
            close: row.5,
            volume: row.6,
        }
    }
}

/// 部分更新请求体
///
/// 字段缺失或为 null 表示不修改；显式给出的 0 会被写入。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PriceUpdate {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

impl PriceUpdate {
    /// 是否没有提供任何字段
    pub fn is_empty(&self) -> bool {
        self.open.is_none()
            && self.high.is_none()
            && self.low.is_none()
            && self.close.is_none()
            && self.volume.is_none()
    }

    /// 校验请求，返回面向客户端的错误描述
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("At least one stock data field is required".to_string());
        }
        if matches!(self.volume, Some(v) if v < 0) {
            return Err("Volume must not be negative".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_rejected() {
        let update: PriceUpdate = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());
        assert!(update.validate().is_err());
    }

    #[test]
    fn null_fields_count_as_absent() {
        let update: PriceUpdate = serde_json::from_str(r#"{"open": null, "close": null}"#).unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn zero_is_a_supplied_value() {
        let update: PriceUpdate = serde_json::from_str(r#"{"volume": 0}"#).unwrap();
        assert_eq!(update.volume, Some(0));
        assert!(update.validate().is_ok());
    }

    #[test]
    fn negative_volume_is_rejected() {
        let update = PriceUpdate {
            volume: Some(-5),
            ..Default::default()
        };
        assert_eq!(update.validate().unwrap_err(), "Volume must not be negative");
    }

    #[test]
    fn bar_serializes_with_iso_date() {
        let bar = PriceBar {
            company: "Acme".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: 1000,
        };
        let value = serde_json::to_value(&bar).unwrap();
        assert_eq!(value["date"], "2024-01-02");
        assert_eq!(value["close"], 10.5);
        assert_eq!(value["volume"], 1000);
    }
}
