use std::path::Path;
use tickr_core::config::{ConfigError, LogConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// # Summary
/// 初始化全局日志，输出到文件 (终端被图表界面接管)。
///
/// # Logic
/// 1. 解析日志过滤指令，非法时返回配置错误。
/// 2. 以不滚动的文件 appender 搭配非阻塞写入器。
/// 3. 安装全局 fmt subscriber。
///
/// # Returns
/// 返回写入器守卫，调用方必须持有到进程退出以保证日志落盘。
pub fn init(config: &LogConfig) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| ConfigError::InvalidArgument(format!("log level {:?}: {}", config.level, e)))?;

    let dir = config
        .file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = config
        .file
        .file_name()
        .ok_or_else(|| ConfigError::InvalidArgument(format!("log file {:?}", config.file)))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| e as Box<dyn std::error::Error>)?;

    Ok(guard)
}
