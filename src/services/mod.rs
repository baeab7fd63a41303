//! 业务逻辑服务模块
//!
//! 封装数据获取、导入和存储逻辑

pub mod ingest_service; // 启动时数据导入
pub mod market;         // 行情数据源
pub mod price_store;    // 日线数据存储
