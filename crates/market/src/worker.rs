use crate::label::LabelFormat;
use crate::period::{PeriodError, resolve_now};
use crate::series::{ChartFrame, SeriesBuilder};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tickr_core::common::time::TimeProvider;
use tickr_core::common::{Period, Stock};
use tickr_core::market::entity::{InstrumentMeta, QuoteRequest};
use tickr_core::market::error::MarketError;
use tickr_core::market::port::QuoteSource;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 后台任务单个周期的失败原因。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error(transparent)]
    Market(#[from] MarketError),
}

/// 每个周期交给界面的一条完整消息。
pub type ChartUpdate = Result<ChartFrame, WorkerError>;

/// # Summary
/// 行情后台任务：解析窗口、抓取、构建序列，并把结果整体推送给界面。
///
/// # Invariants
/// - 每个周期只发送一次完整结果，界面永远看不到半成品。
/// - 元数据取自首个成功响应，会话内不再变化。
/// - 从不触碰终端；接收端关闭即静默退出。
pub struct ChartWorker {
    source: Arc<dyn QuoteSource>,
    clock: Arc<dyn TimeProvider>,
    stock: Stock,
    period: Period,
    refresh: Option<Duration>,
    meta: Option<InstrumentMeta>,
}

impl ChartWorker {
    /// # Summary
    /// 创建后台任务。
    ///
    /// # Arguments
    /// * `source`: 行情数据源。
    /// * `clock`: 解析窗口用的时钟。
    /// * `stock`: 证券。
    /// * `period`: 窗口。
    /// * `refresh`: 周期刷新间隔，None 表示只运行一次。
    pub fn new(
        source: Arc<dyn QuoteSource>,
        clock: Arc<dyn TimeProvider>,
        stock: Stock,
        period: Period,
        refresh: Option<Duration>,
    ) -> Self {
        Self {
            source,
            clock,
            stock,
            period,
            refresh,
            meta: None,
        }
    }

    /// # Summary
    /// 执行一个完整周期。
    ///
    /// # Logic
    /// 1. 以时钟当前时间解析窗口，结束时间即当前时间。
    /// 2. 按窗口跨度选择标签格式。
    /// 3. 抓取行情，首次成功时捕获元数据。
    /// 4. 单次遍历 K 线游标构建图表帧。
    pub async fn cycle(&mut self) -> ChartUpdate {
        let resolution = resolve_now(self.period, self.clock.as_ref())?;
        info!(
            "Resolved {} for {}: interval={} start={} end={}",
            self.period, self.stock.symbol, resolution.interval, resolution.start, resolution.end
        );

        let request = QuoteRequest {
            stock: self.stock.clone(),
            interval: resolution.interval,
            start: resolution.start,
            end: resolution.end,
        };
        let format = LabelFormat::for_span(request.end, request.start);

        let response = self.source.fetch(&request).await?;
        let meta = self.meta.get_or_insert(response.meta).clone();

        let mut builder = SeriesBuilder::new(format, Local);
        for bar in response.bars {
            builder.push(bar);
        }
        let frame = builder.finish(meta);

        if let Err(degenerate) = &frame.summary {
            warn!("{}: {}", self.stock.symbol, degenerate);
        }
        Ok(frame)
    }

    /// # Summary
    /// 运行后台任务直到完成或界面关闭。
    ///
    /// # Logic
    /// 1. 执行一个周期并发送结果 (成功或失败都发送)。
    /// 2. 发送失败说明界面已退出，直接返回。
    /// 3. 未配置刷新则结束，否则等待刷新间隔后继续。
    pub async fn run(mut self, tx: mpsc::Sender<ChartUpdate>) {
        loop {
            let update = self.cycle().await;
            if let Err(err) = &update {
                warn!("Chart update for {} failed: {}", self.stock.symbol, err);
            }

            if tx.send(update).await.is_err() {
                debug!("UI closed, discarding result for {}", self.stock.symbol);
                return;
            }

            let Some(every) = self.refresh else {
                return;
            };
            tokio::select! {
                _ = tokio::time::sleep(every) => {}
                _ = tx.closed() => {
                    debug!("UI closed, stopping refresh for {}", self.stock.symbol);
                    return;
                }
            }
        }
    }

    /// 在 tokio 运行时上启动后台任务。
    pub fn spawn(self, tx: mpsc::Sender<ChartUpdate>) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }
}
