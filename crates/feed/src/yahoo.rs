use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::time::Duration;
use tickr_core::market::entity::{Bar, BarCursor, InstrumentMeta, QuoteRequest, QuoteResponse};
use tickr_core::market::error::MarketError;
use tickr_core::market::port::QuoteSource;
use tracing::debug;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// # Summary
/// Yahoo Finance 行情提供者实现。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯。
/// - 客户端级超时兜底单次请求，重试策略由 `RetryingSource` 负责。
#[derive(Clone)]
pub struct YahooProvider {
    /// 内部使用的 HTTP 客户端
    client: Client,
    /// 客户端配置的单次请求时限
    timeout: Duration,
}

impl YahooProvider {
    /// # Summary
    /// 创建一个新的 YahooProvider 实例。
    ///
    /// # Logic
    /// 1. 配置请求超时。
    /// 2. 设置伪装浏览器 Header (User-Agent) 以减少被拦截风险。
    /// 3. 初始化 reqwest 客户端。
    ///
    /// # Arguments
    /// * `timeout`: 单次请求时限。
    ///
    /// # Returns
    /// 成功返回 YahooProvider，客户端构建失败返回 `MarketError::Network`。
    pub fn new(timeout: Duration) -> Result<Self, MarketError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| MarketError::Network(e.to_string()))?;

        Ok(Self { client, timeout })
    }
}

/// # Summary
/// Yahoo API 响应顶层结构。
///
/// # Invariants
/// - 映射自 Yahoo v8 chart 接口。
#[derive(Deserialize, Debug)]
pub(crate) struct YahooResponse {
    chart: YahooChart,
}

#[derive(Deserialize, Debug)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
struct YahooError {
    description: String,
}

/// # Summary
/// Yahoo API 单个时间序列结果。
///
/// # Invariants
/// - 无数据的窗口不返回 `timestamp` 字段，按空列表处理。
#[derive(Deserialize, Debug)]
struct YahooResult {
    meta: YahooMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    symbol: Option<String>,
    currency: Option<String>,
    exchange_name: Option<String>,
    data_granularity: Option<String>,
    // 图表窗口起点前的收盘价
    chart_previous_close: Option<f64>,
    // 上一交易日收盘价，部分区间只返回该字段
    previous_close: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuote>,
}

/// # Summary
/// Yahoo API 原始报价数据，图表只读取收盘价。
#[derive(Deserialize, Debug)]
struct YahooQuote {
    /// 收盘价列表，停牌或缺口处为 null
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// # Summary
/// 将浮点报价转换为定点小数。
///
/// # Logic
/// 1. 非有限值视为缺口，返回零。
/// 2. 保留 6 位小数以消除二进制浮点尾差。
fn to_decimal(value: Option<f64>) -> Decimal {
    value
        .and_then(Decimal::from_f64)
        .map(|d| d.round_dp(6))
        .unwrap_or(Decimal::ZERO)
}

/// # Summary
/// 将 Yahoo 响应解码为领域响应。
///
/// # Logic
/// 1. 业务错误映射为 `MarketError::Unknown`，缺少结果映射为 `NotFound`。
/// 2. 元数据前收盘价优先取 `chartPreviousClose`，其次 `previousClose`，均缺失时为零。
/// 3. 每个时间戳产出一根 K 线，收盘价缺失时记为零，保持原始位置不变。
///
/// # Arguments
/// * `symbol`: 请求的证券代码，元数据缺失代码时使用。
/// * `response`: 反序列化后的 Yahoo 响应。
///
/// # Returns
/// 成功返回 QuoteResponse，失败返回 MarketError。
pub(crate) fn decode_chart(
    symbol: &str,
    response: YahooResponse,
) -> Result<QuoteResponse, MarketError> {
    if let Some(err) = response.chart.error {
        return Err(MarketError::Unknown(err.description));
    }

    let result = response
        .chart
        .result
        .ok_or(MarketError::NotFound)?
        .pop()
        .ok_or(MarketError::NotFound)?;

    let meta = InstrumentMeta {
        symbol: result.meta.symbol.unwrap_or_else(|| symbol.to_string()),
        currency: result.meta.currency.unwrap_or_default(),
        previous_close: to_decimal(
            result
                .meta
                .chart_previous_close
                .or(result.meta.previous_close),
        ),
        exchange: result.meta.exchange_name.unwrap_or_default(),
        granularity: result.meta.data_granularity.unwrap_or_default(),
    };

    let closes = result
        .indicators
        .quote
        .first()
        .map(|q| q.close.as_slice())
        .unwrap_or(&[]);

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let time = Utc
            .timestamp_opt(ts, 0)
            .single()
            .ok_or_else(|| MarketError::Parse(format!("invalid timestamp {}", ts)))?;
        bars.push(Bar {
            time,
            close: to_decimal(closes.get(i).copied().flatten()),
        });
    }

    Ok(QuoteResponse {
        meta,
        bars: BarCursor::new(bars),
    })
}

#[async_trait]
impl QuoteSource for YahooProvider {
    /// # Summary
    /// 从 Yahoo Finance 抓取历史 K 线与元数据。
    ///
    /// # Logic
    /// 1. 构建包含 period1, period2, interval 的 API URL。
    /// 2. 发起异步请求，非 2xx 状态映射为网络错误。
    /// 3. 解析嵌套的 JSON 数据并交由 `decode_chart` 转换。
    ///
    /// # Arguments
    /// * `request`: 证券、采样间隔与时间范围。
    ///
    /// # Returns
    /// 成功返回 QuoteResponse，失败返回 MarketError。
    async fn fetch(&self, request: &QuoteRequest) -> Result<QuoteResponse, MarketError> {
        let symbol = &request.stock.symbol;
        let url = format!("{}/{}", CHART_URL, symbol);

        debug!(
            "Requesting {} interval={} period1={} period2={}",
            symbol, request.interval, request.start, request.end
        );

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", request.start.timestamp().to_string()),
                ("period2", request.end.timestamp().to_string()),
                ("interval", request.interval.code().to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketError::Timeout(self.timeout)
                } else {
                    MarketError::Network(e.to_string())
                }
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketError::NotFound);
        }
        if !status.is_success() {
            return Err(MarketError::Network(format!("HTTP {}", status)));
        }

        let json: YahooResponse = resp
            .json()
            .await
            .map_err(|e| MarketError::Parse(e.to_string()))?;

        decode_chart(symbol, json)
    }
}
