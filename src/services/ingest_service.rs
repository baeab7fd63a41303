//! 启动时数据导入
//!
//! 依次拉取每家公司的全部历史日线并写入存储。
//! 单家公司失败只记录在报告里，不影响其余公司。

use std::collections::BTreeMap;
use std::time::Duration;

use crate::services::market::MarketDataSource;
use crate::services::price_store::PriceStore;

/// 单家公司的导入结果
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// 成功写入的日线条数
    Stored(usize),
    /// 拉取或写入失败的原因
    Failed(String),
}

/// 单家公司的导入记录
#[derive(Debug, Clone)]
pub struct CompanyIngest {
    pub company: String,
    pub ticker: String,
    pub outcome: IngestOutcome,
}

/// 一次导入的汇总
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub companies: Vec<CompanyIngest>,
}

impl IngestReport {
    /// 成功写入的日线总数
    pub fn stored_bars(&self) -> usize {
        self.companies
            .iter()
            .map(|c| match c.outcome {
                IngestOutcome::Stored(n) => n,
                IngestOutcome::Failed(_) => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CompanyIngest> {
        self.companies
            .iter()
            .filter(|c| matches!(c.outcome, IngestOutcome::Failed(_)))
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }
}

/// 导入全部配置的公司
///
/// `companies` 为公司名称到股票代码的映射；`delay` 为相邻两次拉取之间的等待时间。
pub async fn ingest_all<S>(
    source: &S,
    store: &PriceStore,
    companies: &BTreeMap<String, String>,
    delay: Duration,
) -> IngestReport
where
    S: MarketDataSource + ?Sized,
{
    let mut report = IngestReport::default();

    for (i, (company, ticker)) in companies.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = match ingest_company(source, store, company, ticker).await {
            Ok(count) => {
                log::info!("{} ({}) 导入 {} 条日线", company, ticker, count);
                IngestOutcome::Stored(count)
            }
            Err(reason) => {
                log::error!("{} ({}) 导入失败: {}", company, ticker, reason);
                IngestOutcome::Failed(reason)
            }
        };

        report.companies.push(CompanyIngest {
            company: company.clone(),
            ticker: ticker.clone(),
            outcome,
        });
    }

    log::info!(
        "数据导入完成: {} 家公司，共 {} 条日线，失败 {} 家",
        report.companies.len(),
        report.stored_bars(),
        report.failed_count()
    );
    report
}

async fn ingest_company<S>(
    source: &S,
    store: &PriceStore,
    company: &str,
    ticker: &str,
) -> Result<usize, String>
where
    S: MarketDataSource + ?Sized,
{
    let bars = source
        .fetch_daily_history(company, ticker)
        .await
        .map_err(|e| e.to_string())?;

    store.upsert_batch(&bars).await.map_err(|e| e.to_string())
}
