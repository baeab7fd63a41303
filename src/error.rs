//! 统一错误处理
//!
//! 存储层、行情源各自定义错误类型，HTTP 层统一映射为状态码与 JSON 响应体。

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;

/// 存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    /// 没有匹配 (company, date) 的记录
    #[error("记录不存在")]
    NotFound,

    /// 连接池耗尽或数据库文件被锁定超时
    #[error("数据库暂不可用: {0}")]
    Unavailable(String),

    #[error("数据库错误: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(ref db) if is_lock_contention(db.code().as_deref()) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// SQLITE_BUSY (5) / SQLITE_LOCKED (6)，扩展码的低 8 位为主错误码
fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .map(|c| matches!(c & 0xff, 5 | 6))
        .unwrap_or(false)
}

/// 行情数据源错误
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),

    #[error("行情接口返回 HTTP {0}")]
    Status(reqwest::StatusCode),

    /// 接口返回的业务错误（如代码不存在）
    #[error("行情接口错误: {0}")]
    Upstream(String),

    #[error("解析行情数据失败: {0}")]
    Parse(String),

    #[error("股票代码 {0} 没有任何日线数据")]
    Empty(String),
}

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 资源未找到 (404)
    #[error("{0}")]
    NotFound(String),

    /// 请求参数错误 (400)
    #[error("{0}")]
    BadRequest(String),

    /// 存储暂不可用 (503)
    #[error("服务暂不可用: {0}")]
    Unavailable(String),

    /// 内部错误 (500)
    #[error("内部服务错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 将存储层错误映射为 API 错误，`not_found` 为 404 时返回给客户端的描述
    pub fn from_store(err: StoreError, not_found: impl FnOnce() -> String) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound(not_found()),
            StoreError::Unavailable(msg) => ApiError::Unavailable(msg),
            StoreError::Database(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::from_store(err, || "Record not found".to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Unavailable(msg) => {
                log::warn!("存储暂不可用: {}", msg);
                "Storage temporarily unavailable, retry later".to_string()
            }
            ApiError::Internal(msg) => {
                // 内部错误只记录日志，不向客户端透传细节
                log::error!("内部服务错误: {}", msg);
                "Internal server error".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse::new(message))
    }
}
