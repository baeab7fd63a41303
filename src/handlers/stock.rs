//! 股票日线接口处理器
//!
//! ## API 列表
//! - GET  /stocks/{date}            - 某交易日所有公司的日线
//! - GET  /stocks/{company}         - 某公司的全部日线
//! - GET  /stocks/{company}/{date}  - 某公司某交易日的日线
//! - POST /stocks/{company}/{date}  - 部分更新某公司某交易日的日线

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;

use crate::error::ApiError;
use crate::models::{MessageResponse, PriceUpdate};
use crate::services::price_store::PriceStore;

/// 单段路径按日期格式匹配，其余视为公司名称
const DATE_SEGMENT: &str = r"/{date:\d{4}-\d{2}-\d{2}}";

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date {}, expected YYYY-MM-DD", raw)))
}

/// 获取某交易日所有公司的日线
///
/// GET /stocks/{date}
pub async fn get_stocks_by_date(
    store: web::Data<PriceStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let raw = path.into_inner();
    let date = parse_date(&raw)?;

    let bars = store.query_by_date(date).await?;
    if bars.is_empty() {
        return Err(ApiError::NotFound(format!("No data found for date {}", raw)));
    }
    Ok(HttpResponse::Ok().json(bars))
}

/// 获取某公司某交易日的日线
///
/// GET /stocks/{company}/{date}
pub async fn get_company_stock_by_date(
    store: web::Data<PriceStore>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (company, raw) = path.into_inner();
    let date = parse_date(&raw)?;

    match store.query_by_company_and_date(&company, date).await? {
        Some(bar) => Ok(HttpResponse::Ok().json(bar)),
        None => Err(ApiError::NotFound(format!(
            "No data found for company {} on date {}",
            company, raw
        ))),
    }
}

/// 获取某公司的全部日线
///
/// GET /stocks/{company}
pub async fn get_company_stocks(
    store: web::Data<PriceStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let company = path.into_inner();

    let bars = store.query_by_company(&company).await?;
    if bars.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No data found for company {}",
            company
        )));
    }
    Ok(HttpResponse::Ok().json(bars))
}

/// 部分更新某公司某交易日的日线
///
/// POST /stocks/{company}/{date}
///
/// 请求体字段均可选：open, high, low, close, volume。
/// 一个字段都没有时直接返回 400，不访问数据库。
pub async fn update_company_stock_by_date(
    store: web::Data<PriceStore>,
    path: web::Path<(String, String)>,
    body: web::Json<PriceUpdate>,
) -> Result<HttpResponse, ApiError> {
    let (company, raw) = path.into_inner();
    let update = body.into_inner();

    update.validate().map_err(ApiError::BadRequest)?;
    let date = parse_date(&raw)?;

    store
        .update_fields(&company, date, &update)
        .await
        .map_err(|e| {
            ApiError::from_store(e, || {
                format!("No data found for company {} on date {}", company, raw)
            })
        })?;

    log::info!("已更新 {} {} 的日线: {:?}", company, raw, update);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Stock data updated successfully")))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    // 日期路由必须先于公司路由注册
    cfg.service(
        web::scope("/stocks")
            .route(DATE_SEGMENT, web::get().to(get_stocks_by_date))
            .route("/{company}", web::get().to(get_company_stocks))
            .route("/{company}/{date}", web::get().to(get_company_stock_by_date))
            .route("/{company}/{date}", web::post().to(update_company_stock_by_date)),
    );
}
