use crate::market::entity::{QuoteRequest, QuoteResponse};
use crate::market::error::MarketError;
use async_trait::async_trait;

/// # Summary
/// 行情数据源接口（原始数据源）。
///
/// # Invariants
/// - 实现者必须是线程安全的，调用方会在后台任务中使用它。
/// - 空结果集是合法响应，不应映射为错误。
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// # Summary
    /// 获取特定证券在指定时间范围内的 K 线与元数据。
    ///
    /// # Logic
    /// 1. 按 `request.interval` 构建数据源请求。
    /// 2. 执行网络请求并解析响应。
    /// 3. 返回元数据与只读一次的 K 线游标。
    ///
    /// # Arguments
    /// * `request`: 证券、采样间隔与时间范围。
    ///
    /// # Returns
    /// 成功返回 QuoteResponse，失败返回 MarketError。
    async fn fetch(&self, request: &QuoteRequest) -> Result<QuoteResponse, MarketError>;
}
