//! Yahoo Finance 日线接口实现
//!
//! 对接 https://query1.finance.yahoo.com/v8/finance/chart/<ticker>?range=max&interval=1d

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::MarketDataSource;
use crate::config::MarketDataConfig;
use crate::error::FetchError;
use crate::models::PriceBar;

const BROWSER_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Yahoo Finance 行情源
#[derive(Clone)]
pub struct YahooSource {
    client: Client,
    base_url: String,
}

impl YahooSource {
    /// 按配置构建 HTTP 客户端
    ///
    /// 设置浏览器 User-Agent，否则 Yahoo 会直接返回 429
    pub fn new(config: &MarketDataConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MarketDataSource for YahooSource {
    async fn fetch_daily_history(
        &self,
        company: &str,
        ticker: &str,
    ) -> Result<Vec<PriceBar>, FetchError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        log::debug!("请求日线数据 URL: {} ({})", url, company);

        let response = self
            .client
            .get(&url)
            .query(&[("range", "max"), ("interval", "1d"), ("events", "history")])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        // 代码无效时 Yahoo 返回 404，但响应体里带有具体的错误描述
        match serde_json::from_str::<YahooResponse>(&text) {
            Ok(chart) => parse_chart(chart, company, ticker),
            Err(_) if !status.is_success() => Err(FetchError::Status(status)),
            Err(e) => Err(FetchError::Parse(e.to_string())),
        }
    }
}

/// Yahoo API 响应顶层结构
#[derive(Deserialize, Debug)]
pub struct YahooResponse {
    chart: YahooChart,
}

#[derive(Deserialize, Debug)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
struct YahooError {
    description: String,
}

#[derive(Deserialize, Debug)]
struct YahooResult {
    #[serde(default)]
    meta: YahooMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Deserialize, Debug, Default)]
struct YahooMeta {
    /// 交易所相对 UTC 的偏移（秒），用于把时间戳换算为交易所当地日期
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Deserialize, Debug)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Deserialize, Debug)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// 将 chart 响应转换为日线列表
///
/// 任一 OHLCV 字段缺失的交易日会被跳过；同一日期出现多次时保留最后一条。
pub fn parse_chart(
    response: YahooResponse,
    company: &str,
    ticker: &str,
) -> Result<Vec<PriceBar>, FetchError> {
    if let Some(err) = response.chart.error {
        return Err(FetchError::Upstream(err.description));
    }

    let result = response
        .chart
        .result
        .and_then(|mut r| r.pop())
        .ok_or_else(|| FetchError::Empty(ticker.to_string()))?;

    let quote = result
        .indicators
        .quote
        .first()
        .ok_or_else(|| FetchError::Parse("缺少 quote 数据".to_string()))?;

    let offset = result.meta.gmtoffset;
    let mut bars: Vec<PriceBar> = Vec::with_capacity(result.timestamp.len());

    for (i, &ts) in result.timestamp.iter().enumerate() {
        let fields = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = fields else {
            continue;
        };
        if volume < 0.0 {
            continue;
        }

        let date = local_date(ts, offset)
            .ok_or_else(|| FetchError::Parse(format!("无效的时间戳: {}", ts)))?;

        let bar = PriceBar {
            company: company.to_string(),
            date,
            open,
            high,
            low,
            close,
            volume: volume.round() as i64,
        };

        match bars.last_mut() {
            Some(last) if last.date == date => *last = bar,
            _ => bars.push(bar),
        }
    }

    if bars.is_empty() {
        return Err(FetchError::Empty(ticker.to_string()));
    }
    Ok(bars)
}

fn local_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}
