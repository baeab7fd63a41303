pub mod stock;
pub mod health;

use actix_web::{error, web, HttpRequest};

use crate::error::ApiError;

/// 请求体不是合法 JSON 时返回统一的 400 错误
fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid request body: {}", err)).into()
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler));
    health::config(cfg);
    stock::config(cfg);
}
