use std::time::Duration;
use thiserror::Error;

/// # Summary
/// 行情数据源错误枚举，处理网络、解析及数据缺失等问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    // 网络层错误，包含底层 HTTP 客户端错误信息
    #[error("Network error: {0}")]
    Network(String),
    // 数据解析错误，如 JSON 格式不匹配
    #[error("Parse error: {0}")]
    Parse(String),
    // 请求的证券未找到
    #[error("Data not found")]
    NotFound,
    // 单次请求超过时限
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    // 数据源返回的业务错误或未分类错误
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl MarketError {
    /// 是否值得重试：仅网络抖动与超时。
    pub fn is_transient(&self) -> bool {
        matches!(self, MarketError::Network(_) | MarketError::Timeout(_))
    }
}

/// # Summary
/// 退化数据：输入合法，但无法产出常规摘要。
///
/// # Invariants
/// - 只在界面内联展示，不终止程序。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateData {
    // 结果集中没有任何收盘价非零的 K 线
    #[error("no valid bars")]
    NoValidBars,
    // 前收盘价为零，涨跌幅无定义
    #[error("previous close is zero")]
    ZeroPreviousClose,
}
