//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，包括公司名称到股票代码的映射

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV: &str = "STOCKDATA_CONFIG";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite 数据库文件路径（不存在时自动创建）
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// 连接池最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 获取连接的超时时间（秒）
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    /// SQLite 写锁等待时间（秒）
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

/// 行情数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// Yahoo Finance 接口根地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 相邻两次请求之间的间隔（毫秒）
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,
}

/// 启动时数据导入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 是否在启动时拉取全部历史数据
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub market_data: MarketDataConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// 公司名称 -> 股票代码
    #[serde(default)]
    pub companies: BTreeMap<String, String>,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_db_path() -> PathBuf { PathBuf::from("stock_data.db") }
fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 5 }
fn default_busy_timeout() -> u64 { 5 }
fn default_base_url() -> String { "https://query1.finance.yahoo.com".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_request_delay() -> u64 { 500 }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            request_delay_ms: default_request_delay(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件 {} 失败", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 {} 失败", path.display()))?;
        Ok(config)
    }

    /// 查找配置文件：优先环境变量，其次 config.json、config/config.json
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        ["config.json", "config/config.json"]
            .into_iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    /// 加载配置
    ///
    /// 找不到配置文件时使用默认值；文件存在但无法解析时返回错误。
    /// 此时日志系统尚未初始化，调用方负责记录返回的路径。
    pub fn load() -> anyhow::Result<(Self, Option<PathBuf>)> {
        match Self::locate() {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
