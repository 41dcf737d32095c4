//! # 图表界面
//!
//! 前台界面循环：持有终端，按固定节奏重绘，接收后台任务推送的完整结果，并监听退出键。

pub mod chart;
pub mod header;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use header::{HeaderState, header_line};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Layout};
use ratatui::widgets::{Block, Paragraph};
use std::io;
use std::time::Duration;
use tickr_market::series::ChartSeries;
use tickr_market::worker::ChartUpdate;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// # Summary
/// 退出信号，界面循环持续观察它。
///
/// # Invariants
/// - 一旦置位不可撤销。
#[derive(Clone)]
pub struct QuitSignal {
    tx: watch::Sender<bool>,
}

impl QuitSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for QuitSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// q、Q、Esc 与 Ctrl-C 触发退出。
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// # Summary
/// 界面持有的两个部件状态：头部与折线图。
///
/// # Invariants
/// - 只通过 `apply` 整体替换，每次更新每个部件只写一次。
/// - 抓取失败时保留上一份序列，只更新头部。
pub struct ChartView {
    symbol: String,
    header: HeaderState,
    series: ChartSeries,
}

impl ChartView {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            header: HeaderState::Loading,
            series: ChartSeries::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn header(&self) -> &HeaderState {
        &self.header
    }

    #[cfg(test)]
    pub(crate) fn series(&self) -> &ChartSeries {
        &self.series
    }

    /// 应用后台任务的一次完整结果。
    pub fn apply(&mut self, update: ChartUpdate) {
        match update {
            Ok(frame) => {
                self.header = match frame.summary {
                    Ok(summary) => HeaderState::Ready(summary),
                    Err(_) => HeaderState::NoData,
                };
                self.series = frame.series;
            }
            Err(err) => {
                self.header = HeaderState::Failed(err.to_string());
            }
        }
    }

    /// # Summary
    /// 绘制整个界面。
    ///
    /// # Logic
    /// 1. 外框标题提示退出键。
    /// 2. 上方 3 行带边框的头部，下方为折线图。
    pub fn render(&self, frame: &mut Frame) {
        let outer = Block::bordered().title("PRESS Q TO QUIT");
        let inner = outer.inner(frame.area());
        frame.render_widget(outer, frame.area());

        let [top, bottom] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(inner);

        let header = Paragraph::new(header_line(&self.symbol, &self.header)).block(Block::bordered());
        frame.render_widget(header, top);

        let points = self.series.points();
        frame.render_widget(chart::line_chart(&self.series, &points), bottom);
    }
}

/// # Summary
/// 运行界面循环直到退出信号置位或输入流结束。
///
/// # Logic
/// 1. 按 `tick` 节奏重绘。
/// 2. 收到后台结果时整体应用并立即重绘；后台通道关闭后不再轮询它。
/// 3. 键盘退出键置位退出信号，循环在观察到信号后返回。
/// 4. 终端尺寸变化时立即重绘。
pub async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    view: &mut ChartView,
    mut updates: mpsc::Receiver<ChartUpdate>,
    quit: QuitSignal,
    tick: Duration,
) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut quit_rx = quit.subscribe();
    let mut updates_open = true;

    while !quit.is_triggered() {
        tokio::select! {
            _ = ticker.tick() => {
                terminal.draw(|f| view.render(f))?;
            }
            update = updates.recv(), if updates_open => match update {
                Some(update) => {
                    view.apply(update);
                    terminal.draw(|f| view.render(f))?;
                }
                None => {
                    debug!("Update channel closed");
                    updates_open = false;
                }
            },
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if is_quit_key(&key) => {
                    info!("Quit key pressed");
                    quit.trigger();
                }
                Some(Ok(Event::Resize(_, _))) => {
                    terminal.draw(|f| view.render(f))?;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => {
                    debug!("Input stream ended");
                    quit.trigger();
                }
            },
            changed = quit_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    Ok(())
}
