use clap::{Args, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tickr_core::common::{Period, Stock};
use tickr_core::config::{AppConfig, ConfigError, FetchConfig, LogConfig, UiConfig};
use tickr_market::period::pick_period;

/// 命令行参数，启动时解析一次并转换为不可变的 `AppConfig`。
#[derive(Parser, Debug)]
#[command(name = "market")]
#[command(about = "Display stocks in realtime", long_about = None)]
pub struct Cli {
    /// Instrument symbol, e.g. AAPL
    pub symbol: String,

    #[command(flatten)]
    pub periods: PeriodFlags,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Retries after a transient fetch failure
    #[arg(long, default_value_t = 2)]
    pub retries: u32,

    /// Re-fetch the chart every SECS seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh: Option<u64>,

    /// Redraw cadence in milliseconds
    #[arg(long = "tick-ms", value_name = "MS", default_value_t = 250, value_parser = clap::value_parser!(u64).range(10..))]
    pub tick_ms: u64,

    /// Log file (defaults to market-chart.log in the temp directory)
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter directive, e.g. info or tickr_feed=debug
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

/// 窗口开关。允许同时传入多个，按表格顺序取第一个。
#[derive(Args, Debug, Default, Clone)]
pub struct PeriodFlags {
    /// Current day
    #[arg(long = "1d")]
    pub one_day: bool,
    /// Last 5 days
    #[arg(long = "5d")]
    pub five_days: bool,
    /// Last 1 month
    #[arg(long = "1m")]
    pub one_month: bool,
    /// Last 3 months
    #[arg(long = "3m")]
    pub three_months: bool,
    /// Last 6 months
    #[arg(long = "6m")]
    pub six_months: bool,
    /// Year to date
    #[arg(long = "ytd")]
    pub ytd: bool,
    /// Last 1 year
    #[arg(long = "1y")]
    pub one_year: bool,
    /// Last 2 years
    #[arg(long = "2y")]
    pub two_years: bool,
    /// Last 5 years
    #[arg(long = "5y")]
    pub five_years: bool,
    /// Display whole history
    #[arg(long = "max")]
    pub max: bool,
}

impl PeriodFlags {
    /// 所有被置位的窗口，按表格顺序排列。
    pub fn selected(&self) -> Vec<Period> {
        [
            (self.one_day, Period::OneDay),
            (self.five_days, Period::FiveDays),
            (self.one_month, Period::OneMonth),
            (self.three_months, Period::ThreeMonths),
            (self.six_months, Period::SixMonths),
            (self.ytd, Period::YearToDate),
            (self.one_year, Period::OneYear),
            (self.two_years, Period::TwoYears),
            (self.five_years, Period::FiveYears),
            (self.max, Period::Max),
        ]
        .into_iter()
        .filter_map(|(set, period)| set.then_some(period))
        .collect()
    }
}

impl Cli {
    /// # Summary
    /// 构建应用配置。
    ///
    /// # Logic
    /// 1. 代码去除首尾空白后不能为空。
    /// 2. 至少选中一个窗口，否则返回 `ConfigError::NoPeriod`。
    /// 3. 其余参数映射到抓取、界面与日志配置。
    pub fn config(&self) -> Result<AppConfig, ConfigError> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err(ConfigError::InvalidArgument("symbol must not be empty".into()));
        }
        let period = pick_period(&self.periods.selected())?;

        let log_defaults = LogConfig::default();
        Ok(AppConfig {
            stock: Stock::new(symbol),
            period,
            fetch: FetchConfig {
                timeout: Duration::from_secs(self.timeout),
                retries: self.retries,
                refresh: self.refresh.map(Duration::from_secs),
                ..FetchConfig::default()
            },
            ui: UiConfig {
                tick: Duration::from_millis(self.tick_ms),
            },
            log: LogConfig {
                file: self.log_file.clone().unwrap_or(log_defaults.file),
                level: self.log_level.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("market").chain(args.iter().copied()))
    }

    #[test]
    fn test_symbol_and_period() {
        let config = parse(&["AAPL", "--ytd"]).unwrap().config().unwrap();
        assert_eq!(config.stock.symbol, "AAPL");
        assert_eq!(config.period, Period::YearToDate);
        assert_eq!(config.fetch.timeout, Duration::from_secs(10));
        assert_eq!(config.fetch.refresh, None);
        assert_eq!(config.ui.tick, Duration::from_millis(250));
    }

    #[test]
    fn test_every_flag_maps_to_its_period() {
        for period in Period::ALL {
            let flag = format!("--{}", period.flag());
            let config = parse(&["MSFT", &flag]).unwrap().config().unwrap();
            assert_eq!(config.period, period);
        }
    }

    #[test]
    fn test_no_period_is_config_error() {
        let cli = parse(&["AAPL"]).unwrap();
        assert_eq!(cli.config().unwrap_err(), ConfigError::NoPeriod);
    }

    #[test]
    fn test_missing_symbol_is_rejected() {
        assert!(parse(&["--1d"]).is_err());
    }

    #[test]
    fn test_blank_symbol_is_rejected() {
        let cli = parse(&["  ", "--1d"]).unwrap();
        assert!(matches!(cli.config(), Err(ConfigError::InvalidArgument(_))));
    }

    #[test]
    fn test_multiple_flags_first_in_table_wins() {
        let cli = parse(&["AAPL", "--max", "--3m", "--1y"]).unwrap();
        assert_eq!(
            cli.periods.selected(),
            vec![Period::ThreeMonths, Period::OneYear, Period::Max]
        );
        assert_eq!(cli.config().unwrap().period, Period::ThreeMonths);
    }

    #[test]
    fn test_ambient_flags() {
        let cli = parse(&[
            "TSLA",
            "--5d",
            "--timeout",
            "3",
            "--retries",
            "0",
            "--refresh",
            "30",
            "--tick-ms",
            "100",
            "--log-file",
            "/tmp/x.log",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let config = cli.config().unwrap();
        assert_eq!(config.fetch.timeout, Duration::from_secs(3));
        assert_eq!(config.fetch.retries, 0);
        assert_eq!(config.fetch.refresh, Some(Duration::from_secs(30)));
        assert_eq!(config.ui.tick, Duration::from_millis(100));
        assert_eq!(config.log.file, PathBuf::from("/tmp/x.log"));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(parse(&["AAPL", "--1d", "--timeout", "0"]).is_err());
    }
}
