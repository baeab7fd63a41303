//! 行情数据源
//!
//! 按股票代码拉取全部历史日线，目前对接 Yahoo Finance

mod yahoo;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::PriceBar;

pub use yahoo::{parse_chart, YahooSource};

/// 行情数据源抽象
///
/// 返回的日线按日期升序排列，`company` 字段填入调用方给出的公司名称。
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_daily_history(
        &self,
        company: &str,
        ticker: &str,
    ) -> Result<Vec<PriceBar>, FetchError>;
}
