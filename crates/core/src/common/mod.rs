use serde::{Deserialize, Serialize};

pub mod time;

/// # Summary
/// 证券标的实体，代表图表所展示的单一股票或资产。
///
/// # Invariants
/// - `symbol` 必须是数据源可识别的交易代码。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stock {
    // 股票代码 (例如: AAPL, 0700.HK)
    pub symbol: String,
}

impl Stock {
    /// 使用代码创建证券实体，交易所由数据源元数据给出。
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

/// # Summary
/// 采样间隔枚举，定义向数据源请求的相邻 K 线之间的时间跨度。
///
/// # Invariants
/// - 每个变体对应数据源唯一的 interval 编码。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Interval {
    // 5分钟
    Minute5,
    // 90分钟
    Minute90,
    // 1日
    Day1,
    // 5日
    Day5,
    // 1月
    Month1,
}

impl Interval {
    /// 数据源接口使用的 interval 编码。
    pub fn code(&self) -> &'static str {
        match self {
            Interval::Minute5 => "5m",
            Interval::Minute90 => "90m",
            Interval::Day1 => "1d",
            Interval::Day5 => "5d",
            Interval::Month1 => "1mo",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// # Summary
/// 用户选择的历史窗口。
///
/// # Invariants
/// - `Period::ALL` 的顺序即命令行多选时的优先级顺序，不得调整。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    YearToDate,
    OneYear,
    TwoYears,
    FiveYears,
    Max,
}

impl Period {
    /// 按优先级排列的全部窗口。
    pub const ALL: [Period; 10] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::YearToDate,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::Max,
    ];

    /// 命令行开关名 (不含前缀 `--`)。
    pub fn flag(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1m",
            Period::ThreeMonths => "3m",
            Period::SixMonths => "6m",
            Period::YearToDate => "ytd",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::Max => "max",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_flags_in_table_order() {
        let flags: Vec<_> = Period::ALL.iter().map(Period::flag).collect();
        assert_eq!(
            flags,
            vec!["1d", "5d", "1m", "3m", "6m", "ytd", "1y", "2y", "5y", "max"]
        );
        assert_eq!(Period::YearToDate.to_string(), "ytd");
    }

    #[test]
    fn test_interval_codes() {
        assert_eq!(Interval::Minute90.to_string(), "90m");
        assert_eq!(Interval::Month1.code(), "1mo");
    }
}
