//! 股票日线数据服务入口
//!
//! 加载配置 -> 打开数据库 -> 导入历史数据 -> 启动 HTTP 服务

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use std::time::Duration;

use stockdata_backend::config::AppConfig;
use stockdata_backend::handlers;
use stockdata_backend::services::ingest_service;
use stockdata_backend::services::market::YahooSource;
use stockdata_backend::services::price_store::PriceStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_path) = AppConfig::load()?;

    // RUST_LOG 优先于配置文件中的日志级别
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    match &config_path {
        Some(path) => log::info!("从 {} 加载配置成功", path.display()),
        None => log::info!("未找到配置文件，使用默认配置"),
    }
    if config.companies.is_empty() {
        log::warn!("配置中没有任何公司，不会导入数据");
    }

    let store = PriceStore::open(&config.database)
        .await
        .context("打开数据库失败")?;

    if config.ingest.enabled {
        let source = YahooSource::new(&config.market_data).context("创建行情客户端失败")?;
        let delay = Duration::from_millis(config.market_data.request_delay_ms);
        let report = ingest_service::ingest_all(&source, &store, &config.companies, delay).await;
        for failed in report.failures() {
            log::warn!("{} ({}) 未导入任何数据", failed.company, failed.ticker);
        }
    } else {
        log::info!("已关闭启动导入，直接使用现有数据");
    }

    let bind_addr = config.bind_addr();
    log::info!("启动股票日线数据服务，监听 {}", bind_addr);

    let data = web::Data::new(store.clone());
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default()) // 请求日志
            .app_data(data.clone())
            .configure(handlers::config)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let result = server
        .bind(&bind_addr)
        .with_context(|| format!("绑定地址 {} 失败", bind_addr))?
        .run()
        .await;

    store.close().await;
    log::info!("服务已停止");
    result.context("HTTP 服务异常退出")
}
