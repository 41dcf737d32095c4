mod cli;
mod logging;
mod terminal;
mod ui;

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tickr_core::common::time::RealTimeProvider;
use tickr_core::config::AppConfig;
use tickr_feed::retry::RetryingSource;
use tickr_feed::yahoo::YahooProvider;
use tickr_market::worker::ChartWorker;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// # Summary
/// 程序入口，负责装配并把错误转换为退出码。
///
/// # Logic
/// 1. 解析命令行并构建配置，配置错误在接管终端与联网之前即退出。
/// 2. 初始化文件日志。
/// 3. 运行图表会话，任何致命错误以非零状态退出。
#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let config = match cli.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("market: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match logging::init(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("market: failed to initialise logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let selected = cli.periods.selected();
    if selected.len() > 1 {
        warn!(
            "Several periods selected ({:?}), using {}",
            selected, config.period
        );
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {}", e);
            eprintln!("market: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// # Summary
/// 图表会话，纯粹的装配容器。
///
/// # Logic
/// 1. 实例化数据源 (Yahoo + 超时重试装饰)。
/// 2. 启动后台任务，通过通道交付完整结果。
/// 3. 接管终端并运行界面循环，守卫在返回时恢复终端。
/// 4. 界面退出后后台任务的迟到结果随通道关闭被丢弃。
async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "market starting: symbol={} period={} fetch={:?}",
        config.stock.symbol, config.period, config.fetch
    );

    tickr_feed::install_crypto_provider();
    let source = Arc::new(RetryingSource::new(
        YahooProvider::new(config.fetch.timeout)?,
        &config.fetch,
    ));

    let (tx, rx) = mpsc::channel(4);
    let worker = ChartWorker::new(
        source,
        Arc::new(RealTimeProvider),
        config.stock.clone(),
        config.period,
        config.fetch.refresh,
    )
    .spawn(tx);

    let quit = ui::QuitSignal::new();
    let mut guard = terminal::TerminalGuard::acquire(quit.clone())?;
    let mut view = ui::ChartView::new(config.stock.symbol.clone());
    let result = ui::run(guard.terminal(), &mut view, rx, quit, config.ui.tick).await;
    drop(guard);

    worker.abort();
    info!("market exiting");
    Ok(result?)
}
