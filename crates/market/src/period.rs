use chrono::{
    DateTime, Datelike, Days, Local, LocalResult, Months, NaiveDate, NaiveDateTime, TimeDelta,
    TimeZone, Utc,
};
use thiserror::Error;
use tickr_core::common::{Interval, Period};
use tickr_core::common::time::TimeProvider;
use tickr_core::config::ConfigError;

/// # Summary
/// 周期解析结果：采样间隔与请求时间窗。
///
/// # Invariants
/// - `start` 严格早于 `end`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub interval: Interval,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodError {
    // 日历运算越界
    #[error("start of the {0} window is out of range")]
    OutOfRange(Period),
    // 窗口起点不早于当前时间 (例如元旦零点的 ytd)
    #[error("the {0} window is empty")]
    EmptyWindow(Period),
}

/// 每个窗口对应的采样间隔，窗口越宽粒度越粗。
pub fn interval_for(period: Period) -> Interval {
    match period {
        Period::OneDay => Interval::Minute5,
        Period::FiveDays => Interval::Minute90,
        Period::OneMonth | Period::ThreeMonths | Period::SixMonths | Period::YearToDate => {
            Interval::Day1
        }
        Period::OneYear => Interval::Day5,
        Period::TwoYears | Period::FiveYears | Period::Max => Interval::Month1,
    }
}

/// # Summary
/// 从多个被选中的窗口中按固定优先级挑出一个。
///
/// # Logic
/// 1. 按 `Period::ALL` 顺序返回第一个出现在 `selected` 中的窗口。
/// 2. 一个都没有时返回 `ConfigError::NoPeriod`。
pub fn pick_period(selected: &[Period]) -> Result<Period, ConfigError> {
    Period::ALL
        .into_iter()
        .find(|p| selected.contains(p))
        .ok_or(ConfigError::NoPeriod)
}

/// 夏令时跳变时向后搜索有效当地时间的上限 (分钟)。
const GAP_SEARCH_MINUTES: u32 = 180;

/// # Summary
/// 把 `tz` 下的当地挂钟时间映射为一个确定的时刻。
///
/// # Logic
/// 1. 唯一映射直接返回。
/// 2. 夏令时回拨造成的歧义取较早者。
/// 3. 夏令时跳变造成的空档按分钟向后移到第一个存在的当地时间。
fn local_instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    let mut wall = naive;
    for _ in 0..=GAP_SEARCH_MINUTES {
        match tz.from_local_datetime(&wall) {
            LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest.with_timezone(&Utc)),
            LocalResult::None => wall = wall.checked_add_signed(TimeDelta::minutes(1))?,
        }
    }
    None
}

/// # Summary
/// 以给定的“当前时间”解析窗口。
///
/// # Logic
/// 1. 日、月、年的偏移在 `now` 所在时区的挂钟时间上按日历计算，月末溢出时取当月最后一天。
/// 2. ytd 取当年 1 月 1 日零点 (当地时间)。
/// 3. 计算出的当地时间经 `local_instant` 落到时刻上，夏令时前后都能解析。
/// 4. 结束时间即 `now`。
///
/// # Arguments
/// * `period`: 用户选择的窗口。
/// * `now`: 解析时刻，其时区决定日历运算与 ytd 的“当地”。
///
/// # Returns
/// 成功返回 Resolution，越界或空窗口返回 PeriodError。
pub fn resolve<Tz: TimeZone>(period: Period, now: DateTime<Tz>) -> Result<Resolution, PeriodError> {
    let wall = now.naive_local();
    let start_wall = match period {
        Period::OneDay => wall.checked_sub_days(Days::new(1)),
        Period::FiveDays => wall.checked_sub_days(Days::new(5)),
        Period::OneMonth => wall.checked_sub_months(Months::new(1)),
        Period::ThreeMonths => wall.checked_sub_months(Months::new(3)),
        Period::SixMonths => wall.checked_sub_months(Months::new(6)),
        Period::YearToDate => NaiveDate::from_ymd_opt(wall.year(), 1, 1)
            .and_then(|day| day.and_hms_opt(0, 0, 0)),
        Period::OneYear => wall.checked_sub_months(Months::new(12)),
        Period::TwoYears => wall.checked_sub_months(Months::new(24)),
        Period::FiveYears => wall.checked_sub_months(Months::new(60)),
        Period::Max => wall.checked_sub_months(Months::new(1200)),
    };

    let start = start_wall
        .and_then(|naive| local_instant(&now.timezone(), naive))
        .ok_or(PeriodError::OutOfRange(period))?;
    let end = now.with_timezone(&Utc);
    if start >= end {
        return Err(PeriodError::EmptyWindow(period));
    }

    Ok(Resolution {
        interval: interval_for(period),
        start,
        end,
    })
}

/// 以时钟的当前时间、本地时区解析窗口。
pub fn resolve_now(period: Period, clock: &dyn TimeProvider) -> Result<Resolution, PeriodError> {
    resolve(period, clock.now().with_timezone(&Local))
}
