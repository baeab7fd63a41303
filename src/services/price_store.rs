//! 日线数据存储
//!
//! 基于 SQLite 的 `finance_data` 表，以 (Company, Date) 为联合主键。
//! 所有写入都走 `INSERT OR REPLACE`，重复导入同一天的数据只会覆盖，不会产生重复行。

use chrono::NaiveDate;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use sqlx::Sqlite;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::models::{PriceBar, PriceRow, PriceUpdate};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS finance_data (
    Company TEXT NOT NULL,
    Date TEXT NOT NULL,
    Open REAL,
    High REAL,
    Low REAL,
    Close REAL,
    Volume INTEGER,
    PRIMARY KEY (Company, Date)
)
"#;

const UPSERT_SQL: &str = r#"
INSERT OR REPLACE INTO finance_data (Company, Date, Open, High, Low, Close, Volume)
VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

const SELECT_COLUMNS: &str = "SELECT Company, Date, Open, High, Low, Close, Volume FROM finance_data";

/// 日线数据存储句柄
///
/// 启动时通过 [`PriceStore::open`] 创建，作为 `web::Data` 在各 worker 间共享，
/// 关闭服务时调用 [`PriceStore::close`]。每个方法都是一次独立的数据库操作。
#[derive(Clone, Debug)]
pub struct PriceStore {
    pool: SqlitePool,
}

impl PriceStore {
    /// 打开（必要时创建）数据库文件并初始化表结构
    pub async fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;

        log::info!("数据库已就绪: {}", config.path.display());
        Ok(Self { pool })
    }

    /// 关闭连接池，等待已借出的连接归还
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// 插入或整体替换一条日线
    pub async fn upsert(&self, bar: &PriceBar) -> Result<(), StoreError> {
        bind_upsert(bar).execute(&self.pool).await?;
        Ok(())
    }

    /// 在一个事务内批量写入同一家公司的日线
    pub async fn upsert_batch(&self, bars: &[PriceBar]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        for bar in bars {
            bind_upsert(bar).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(bars.len())
    }

    /// 查询某一交易日所有公司的数据
    pub async fn query_by_date(&self, date: NaiveDate) -> Result<Vec<PriceBar>, StoreError> {
        let sql = format!("{} WHERE Date = ? ORDER BY Company", SELECT_COLUMNS);
        let rows = sqlx::query_as::<_, PriceRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PriceBar::from).collect())
    }

    /// 查询某公司某一交易日的数据
    pub async fn query_by_company_and_date(
        &self,
        company: &str,
        date: NaiveDate,
    ) -> Result<Option<PriceBar>, StoreError> {
        let sql = format!("{} WHERE Company = ? AND Date = ?", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, PriceRow>(&sql)
            .bind(company)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PriceBar::from))
    }

    /// 查询某公司的全部历史数据（按日期升序）
    pub async fn query_by_company(&self, company: &str) -> Result<Vec<PriceBar>, StoreError> {
        let sql = format!("{} WHERE Company = ? ORDER BY Date", SELECT_COLUMNS);
        let rows = sqlx::query_as::<_, PriceRow>(&sql)
            .bind(company)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PriceBar::from).collect())
    }

    /// 部分更新：只覆盖请求中给出的字段
    ///
    /// 单条 UPDATE 语句完成，多个字段的修改对并发读写是原子的。
    /// 没有匹配行时返回 [`StoreError::NotFound`]。
    pub async fn update_fields(
        &self,
        company: &str,
        date: NaiveDate,
        update: &PriceUpdate,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE finance_data
            SET Open = COALESCE(?, Open),
                High = COALESCE(?, High),
                Low = COALESCE(?, Low),
                Close = COALESCE(?, Close),
                Volume = COALESCE(?, Volume)
            WHERE Company = ? AND Date = ?
            "#,
        )
        .bind(update.open)
        .bind(update.high)
        .bind(update.low)
        .bind(update.close)
        .bind(update.volume)
        .bind(company)
        .bind(date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// 已存储的日线总数
    pub async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM finance_data")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn bind_upsert(bar: &PriceBar) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    sqlx::query(UPSERT_SQL)
        .bind(bar.company.as_str())
        .bind(bar.date)
        .bind(bar.open)
        .bind(bar.high)
        .bind(bar.low)
        .bind(bar.close)
        .bind(bar.volume)
}
