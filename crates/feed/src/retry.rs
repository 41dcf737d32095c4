use async_trait::async_trait;
use std::time::Duration;
use tickr_core::config::FetchConfig;
use tickr_core::market::entity::{QuoteRequest, QuoteResponse};
use tickr_core::market::error::MarketError;
use tickr_core::market::port::QuoteSource;
use tracing::{debug, warn};

/// # Summary
/// 为任意数据源附加超时与有限重试的装饰器。
///
/// # Invariants
/// - 每次尝试都受 `timeout` 约束，超时记为 `MarketError::Timeout`。
/// - 只有瞬时错误会被重试，总尝试次数不超过 `retries + 1`。
/// - 第 n 次重试前等待 `backoff * 2^(n-1)`。
pub struct RetryingSource<S> {
    inner: S,
    timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl<S: QuoteSource> RetryingSource<S> {
    /// # Summary
    /// 使用抓取配置包装数据源。
    ///
    /// # Arguments
    /// * `inner`: 被包装的数据源。
    /// * `config`: 超时、重试次数与退避基数。
    ///
    /// # Returns
    /// 返回装饰后的数据源。
    pub fn new(inner: S, config: &FetchConfig) -> Self {
        Self {
            inner,
            timeout: config.timeout,
            retries: config.retries,
            backoff: config.backoff,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

#[async_trait]
impl<S: QuoteSource> QuoteSource for RetryingSource<S> {
    /// # Summary
    /// 带超时与退避重试地抓取行情。
    ///
    /// # Logic
    /// 1. 以 `tokio::time::timeout` 包裹一次内部抓取。
    /// 2. 成功或非瞬时错误立即返回。
    /// 3. 瞬时错误在预算内按指数退避等待后重试。
    /// 4. 预算耗尽时返回最后一次的错误。
    async fn fetch(&self, request: &QuoteRequest) -> Result<QuoteResponse, MarketError> {
        let mut attempt = 0;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, self.inner.fetch(request)).await
            {
                Ok(result) => result,
                Err(_) => Err(MarketError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(resp) => {
                    if attempt > 0 {
                        debug!(
                            "Fetch for {} succeeded after {} retries",
                            request.stock.symbol, attempt
                        );
                    }
                    return Ok(resp);
                }
                Err(err) if err.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Fetch for {} failed ({}), retry {}/{} in {:?}",
                        request.stock.symbol, err, attempt, self.retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tickr_core::common::{Interval, Stock};
    use tickr_core::market::entity::{BarCursor, InstrumentMeta};

    /// 前 `failures` 次返回给定错误，之后成功的模拟数据源。
    struct FlakySource {
        calls: Arc<AtomicU32>,
        failures: u32,
        error: MarketError,
        hang: bool,
    }

    #[async_trait]
    impl QuoteSource for FlakySource {
        async fn fetch(&self, request: &QuoteRequest) -> Result<QuoteResponse, MarketError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                if self.hang {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                return Err(self.error.clone());
            }
            Ok(QuoteResponse {
                meta: InstrumentMeta {
                    symbol: request.stock.symbol.clone(),
                    currency: "USD".into(),
                    previous_close: Default::default(),
                    exchange: "NMS".into(),
                    granularity: "1d".into(),
                },
                bars: BarCursor::empty(),
            })
        }
    }

    fn request() -> QuoteRequest {
        let end = Utc::now();
        QuoteRequest {
            stock: Stock::new("AAPL"),
            interval: Interval::Day1,
            start: end - ChronoDuration::days(30),
            end,
        }
    }

    fn config(retries: u32) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(5),
            retries,
            backoff: Duration::from_millis(100),
            refresh: None,
        }
    }

    fn flaky(failures: u32, error: MarketError, hang: bool) -> (FlakySource, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let source = FlakySource {
            calls: calls.clone(),
            failures,
            error,
            hang,
        };
        (source, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let (source, calls) = flaky(2, MarketError::Network("reset".into()), false);
        let retrying = RetryingSource::new(source, &config(2));

        let resp = retrying.fetch(&request()).await;
        assert!(resp.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_returns_last_error() {
        let (source, calls) = flaky(10, MarketError::Network("reset".into()), false);
        let retrying = RetryingSource::new(source, &config(2));

        let err = retrying.fetch(&request()).await.unwrap_err();
        assert_eq!(err, MarketError::Network("reset".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_not_retried() {
        let (source, calls) = flaky(10, MarketError::NotFound, false);
        let retrying = RetryingSource::new(source, &config(3));

        let err = retrying.fetch(&request()).await.unwrap_err();
        assert_eq!(err, MarketError::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_attempt_times_out() {
        let (source, calls) = flaky(10, MarketError::Network("never".into()), true);
        let retrying = RetryingSource::new(source, &config(1));

        let err = retrying.fetch(&request()).await.unwrap_err();
        assert_eq!(err, MarketError::Timeout(Duration::from_secs(5)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_doubles() {
        let (source, _) = flaky(0, MarketError::NotFound, false);
        let retrying = RetryingSource::new(source, &config(3));
        assert_eq!(retrying.delay_for(1), Duration::from_millis(100));
        assert_eq!(retrying.delay_for(2), Duration::from_millis(200));
        assert_eq!(retrying.delay_for(3), Duration::from_millis(400));
    }
}
