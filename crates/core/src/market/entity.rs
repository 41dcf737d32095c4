use crate::common::{Interval, Stock};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// # Summary
/// 单根价格 K 线，图表只使用其收盘价。
///
/// # Invariants
/// - `close` 为零表示非交易时段或数据源缺口，属于无效 K 线。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    // K 线时间戳
    pub time: DateTime<Utc>,
    // 收盘价 (定点小数)
    pub close: Decimal,
}

impl Bar {
    /// 收盘价非零即为有效 K 线。
    pub fn is_valid(&self) -> bool {
        !self.close.is_zero()
    }
}

/// # Summary
/// 证券元数据，每次会话从首个响应中捕获一次，之后只读。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentMeta {
    // 证券代码
    pub symbol: String,
    // 计价货币 (例如: USD)
    pub currency: String,
    // 图表窗口开始前的收盘价
    pub previous_close: Decimal,
    // 交易所名称 (例如: NMS)
    pub exchange: String,
    // 数据源实际返回的采样粒度标签 (例如: 1d)
    pub granularity: String,
}

/// # Summary
/// 行情请求参数。
///
/// # Invariants
/// - `start` 必须早于 `end`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub stock: Stock,
    pub interval: Interval,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// # Summary
/// 只能向前读取一次的 K 线游标。
///
/// # Invariants
/// - 不实现 `Clone`，消费后无法回放。
#[derive(Debug)]
pub struct BarCursor {
    inner: std::vec::IntoIter<Bar>,
}

impl BarCursor {
    /// 用数据源解码后的 K 线构造游标。
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            inner: bars.into_iter(),
        }
    }

    /// 空游标，对应数据源返回的空结果集。
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for BarCursor {
    type Item = Bar;

    fn next(&mut self) -> Option<Bar> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// # Summary
/// 数据源响应：元数据加上一次性 K 线游标。
#[derive(Debug)]
pub struct QuoteResponse {
    pub meta: InstrumentMeta,
    pub bars: BarCursor,
}
