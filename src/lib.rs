//! 股票日线数据服务
//!
//! 启动时从 Yahoo Finance 拉取配置中各公司的全部历史日线写入 SQLite，
//! 并提供按日期、公司查询及部分更新的 RESTful API。

pub mod config;   // 配置加载
pub mod error;    // 错误类型
pub mod handlers; // HTTP 请求处理器
pub mod models;   // 数据模型定义
pub mod services; // 业务逻辑服务
