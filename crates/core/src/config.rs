use crate::common::{Period, Stock};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 全局应用配置，启动时由命令行参数一次性构建，之后只读。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub stock: Stock,
    pub period: Period,
    pub fetch: FetchConfig,
    pub ui: UiConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchConfig {
    // 单次请求时限
    pub timeout: Duration,
    // 首次失败后的重试次数
    pub retries: u32,
    // 首次重试前的等待时间，之后逐次翻倍
    pub backoff: Duration,
    // 周期刷新间隔，None 表示只抓取一次
    pub refresh: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiConfig {
    // 重绘节奏
    pub tick: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub file: PathBuf,
    pub level: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 2,
            backoff: Duration::from_millis(500),
            refresh: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(250),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: std::env::temp_dir().join("market-chart.log"),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 以默认的抓取、界面与日志配置创建应用配置。
    pub fn new(stock: Stock, period: Period) -> Self {
        Self {
            stock,
            period,
            fetch: FetchConfig::default(),
            ui: UiConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// # Summary
/// 启动配置错误，在接管终端与发起网络请求之前即终止程序。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no time range was selected, pass one of --1d --5d --1m --3m --6m --ytd --1y --2y --5y --max")]
    NoPeriod,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
