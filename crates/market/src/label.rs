use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

/// 窗口跨度达到该秒数 (24 小时) 时改用日期标签。
pub const DATE_LABEL_THRESHOLD_SECS: i64 = 86_400;

/// # Summary
/// 横轴标签格式，只有日期与时刻两档。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFormat {
    // 日 月 (例如: 2 Jan)
    Date,
    // 时:分 (例如: 15:04)
    Time,
}

impl LabelFormat {
    /// # Summary
    /// 按请求窗口跨度选择标签格式。
    ///
    /// # Logic
    /// 1. 跨度不小于 86,400 秒选日期，否则选时刻。
    pub fn for_span(end: DateTime<Utc>, start: DateTime<Utc>) -> Self {
        if (end - start).num_seconds() >= DATE_LABEL_THRESHOLD_SECS {
            LabelFormat::Date
        } else {
            LabelFormat::Time
        }
    }

    /// chrono 格式串。
    pub fn pattern(&self) -> &'static str {
        match self {
            LabelFormat::Date => "%-d %b",
            LabelFormat::Time => "%H:%M",
        }
    }

    /// 在指定时区下格式化时间戳。
    pub fn format<Tz>(&self, time: &DateTime<Utc>, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        time.with_timezone(tz).format(self.pattern()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn span(secs: i64) -> LabelFormat {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap();
        LabelFormat::for_span(start + Duration::seconds(secs), start)
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(span(90_000), LabelFormat::Date);
        assert_eq!(span(86_400), LabelFormat::Date);
        assert_eq!(span(86_399), LabelFormat::Time);
        assert_eq!(span(3_600), LabelFormat::Time);
        assert_eq!(span(0), LabelFormat::Time);
    }

    #[test]
    fn test_format_patterns() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(LabelFormat::Date.format(&t, &Utc), "2 Jan");
        assert_eq!(LabelFormat::Time.format(&t, &Utc), "15:04");

        let tokyo = chrono::FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(LabelFormat::Time.format(&t, &tokyo), "00:04");
        assert_eq!(LabelFormat::Date.format(&t, &tokyo), "3 Jan");
    }
}
