use actix_web::{web, HttpResponse};

use crate::error::ApiError;
use crate::models::HealthResponse;
use crate::services::price_store::PriceStore;

pub async fn health_check(store: web::Data<PriceStore>) -> Result<HttpResponse, ApiError> {
    let rows = store.count().await?;
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        rows,
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
