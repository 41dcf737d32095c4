use crate::label::LabelFormat;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use std::fmt::Display;
use tickr_core::market::entity::{Bar, InstrumentMeta};
use tickr_core::market::error::DegenerateData;
use tracing::{debug, warn};

/// # Summary
/// 可直接绘制的价格序列。
///
/// # Invariants
/// - `values` 严格按 K 线到达顺序排列，长度等于有效 K 线数量。
/// - `labels` 的键是 K 线在过滤前序列中的位置，取值范围 `0..total_bars`。
/// - `labels` 与 `values` 一一对应：按键升序遍历 `labels` 即得到 `values` 的顺序。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    values: Vec<f64>,
    labels: BTreeMap<usize, String>,
    total_bars: usize,
}

impl ChartSeries {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn labels(&self) -> &BTreeMap<usize, String> {
        &self.labels
    }

    /// 过滤前的 K 线总数 (含无效 K 线)。
    pub fn total_bars(&self) -> usize {
        self.total_bars
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// # Summary
    /// 以过滤前位置为横坐标的绘图点。
    ///
    /// # Logic
    /// 1. 按键升序配对 `labels` 与 `values`，缺口处横坐标留空。
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.labels
            .keys()
            .zip(self.values.iter())
            .filter_map(|(&index, &value)| index.to_f64().map(|x| (x, value)))
            .collect()
    }

    /// 纵轴范围 (最小值, 最大值)，空序列返回 None。
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.values.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// # Summary
/// 图表头部展示的价格摘要。
///
/// # Invariants
/// - 所有数值均为定点小数，只有图表序列才转换为浮点。
/// - `change == last_price - previous_close`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub symbol: String,
    pub currency: String,
    pub exchange: String,
    pub last_price: Decimal,
    pub last_time: DateTime<Utc>,
    pub previous_close: Decimal,
    pub change: Decimal,
    change_percent: Option<Decimal>,
}

impl Summary {
    /// # Summary
    /// 由元数据与最后一根有效 K 线组合摘要。
    ///
    /// # Logic
    /// 1. 涨跌额 = 最新价 - 前收盘价。
    /// 2. 涨跌幅 = 涨跌额 / 前收盘价 × 100，前收盘价为零时无定义。
    ///
    /// # Arguments
    /// * `meta`: 证券元数据，只读。
    /// * `last`: 最后一根有效 K 线。
    pub fn compose(meta: &InstrumentMeta, last: &Bar) -> Self {
        let change = last.close - meta.previous_close;
        let change_percent = change
            .checked_div(meta.previous_close)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));

        Self {
            symbol: meta.symbol.clone(),
            currency: meta.currency.clone(),
            exchange: meta.exchange.clone(),
            last_price: last.close,
            last_time: last.time,
            previous_close: meta.previous_close,
            change,
            change_percent,
        }
    }

    /// 涨跌幅 (百分比)，前收盘价为零时返回 `DegenerateData::ZeroPreviousClose`。
    pub fn change_percent(&self) -> Result<Decimal, DegenerateData> {
        self.change_percent.ok_or(DegenerateData::ZeroPreviousClose)
    }
}

/// # Summary
/// 一次抓取周期的完整产出，整体交给界面。
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub meta: InstrumentMeta,
    pub format: LabelFormat,
    pub series: ChartSeries,
    pub summary: Result<Summary, DegenerateData>,
}

/// # Summary
/// 序列构建器：单次遍历 K 线，过滤无效数据并记录标签与最后有效价。
///
/// # Invariants
/// - 每根 K 线无论是否有效都会占用一个位置编号。
/// - 只追加，不排序、不去重。
pub struct SeriesBuilder<Tz: TimeZone> {
    format: LabelFormat,
    tz: Tz,
    next_index: usize,
    values: Vec<f64>,
    labels: BTreeMap<usize, String>,
    last_valid: Option<Bar>,
}

impl<Tz> SeriesBuilder<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(format: LabelFormat, tz: Tz) -> Self {
        Self {
            format,
            tz,
            next_index: 0,
            values: Vec::new(),
            labels: BTreeMap::new(),
            last_valid: None,
        }
    }

    /// # Summary
    /// 消费一根 K 线。
    ///
    /// # Logic
    /// 1. 分配位置编号。
    /// 2. 收盘价为零则丢弃，但编号照常消耗。
    /// 3. 否则追加浮点收盘价，在同一编号下写入格式化标签，并更新最后有效 K 线。
    pub fn push(&mut self, bar: Bar) {
        let index = self.next_index;
        self.next_index += 1;

        if !bar.is_valid() {
            return;
        }
        let Some(value) = bar.close.to_f64() else {
            warn!("Close {} at index {} is not representable, skipped", bar.close, index);
            return;
        };

        self.values.push(value);
        self.labels.insert(index, self.format.format(&bar.time, &self.tz));
        self.last_valid = Some(bar);
    }

    /// # Summary
    /// 结束构建并产出图表帧。
    ///
    /// # Logic
    /// 1. 至少有一根有效 K 线时组合摘要。
    /// 2. 否则摘要为 `DegenerateData::NoValidBars`，序列为空。
    pub fn finish(self, meta: InstrumentMeta) -> ChartFrame {
        debug!(
            "{}: {} bars received, {} valid",
            meta.symbol,
            self.next_index,
            self.values.len()
        );

        let summary = match &self.last_valid {
            Some(last) => Ok(Summary::compose(&meta, last)),
            None => Err(DegenerateData::NoValidBars),
        };

        ChartFrame {
            format: self.format,
            series: ChartSeries {
                values: self.values,
                labels: self.labels,
                total_bars: self.next_index,
            },
            summary,
            meta,
        }
    }
}

/// 用单次遍历的 K 线序列构建图表帧。
pub fn build_frame<I, Tz>(bars: I, meta: InstrumentMeta, format: LabelFormat, tz: Tz) -> ChartFrame
where
    I: IntoIterator<Item = Bar>,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut builder = SeriesBuilder::new(format, tz);
    for bar in bars {
        builder.push(bar);
    }
    builder.finish(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use tickr_core::market::entity::BarCursor;

    fn meta(previous_close: Decimal) -> InstrumentMeta {
        InstrumentMeta {
            symbol: "ACME".into(),
            currency: "USD".into(),
            previous_close,
            exchange: "NYQ".into(),
            granularity: "1d".into(),
        }
    }

    fn t(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap() + Duration::minutes(5 * i)
    }

    fn bar(i: i64, close: Decimal) -> Bar {
        Bar { time: t(i), close }
    }

    #[test]
    fn test_skips_zero_close_and_keeps_index() {
        let bars = vec![bar(0, dec!(0)), bar(1, dec!(10.00)), bar(2, dec!(10.50))];
        let frame = build_frame(
            BarCursor::new(bars),
            meta(dec!(10.00)),
            LabelFormat::Time,
            Utc,
        );

        assert_eq!(frame.series.values(), &[10.0, 10.5]);
        assert_eq!(frame.series.total_bars(), 3);
        let labels: Vec<_> = frame.series.labels().iter().collect();
        assert_eq!(
            labels,
            vec![(&1, &"09:05".to_string()), (&2, &"09:10".to_string())]
        );

        let summary = frame.summary.unwrap();
        assert_eq!(summary.last_price, dec!(10.50));
        assert_eq!(summary.change, dec!(0.50));
        assert_eq!(summary.change_percent(), Ok(dec!(5.00)));
        assert_eq!(summary.last_time, t(2));
    }

    #[test]
    fn test_no_valid_bars_is_degenerate() {
        let bars = vec![bar(0, dec!(0)), bar(1, dec!(0))];
        let frame = build_frame(bars, meta(dec!(10)), LabelFormat::Time, Utc);

        assert!(frame.series.is_empty());
        assert!(frame.series.labels().is_empty());
        assert_eq!(frame.series.total_bars(), 2);
        assert_eq!(frame.summary, Err(DegenerateData::NoValidBars));
    }

    #[test]
    fn test_empty_input_is_degenerate() {
        let frame = build_frame(BarCursor::empty(), meta(dec!(10)), LabelFormat::Date, Utc);
        assert_eq!(frame.series.total_bars(), 0);
        assert_eq!(frame.series.bounds(), None);
        assert_eq!(frame.summary, Err(DegenerateData::NoValidBars));
    }

    #[test]
    fn test_zero_previous_close_has_no_percent() {
        let frame = build_frame(vec![bar(0, dec!(3.25))], meta(dec!(0)), LabelFormat::Time, Utc);
        let summary = frame.summary.unwrap();
        assert_eq!(summary.change, dec!(3.25));
        assert_eq!(
            summary.change_percent(),
            Err(DegenerateData::ZeroPreviousClose)
        );
    }

    #[test]
    fn test_negative_change() {
        let frame = build_frame(
            vec![bar(0, dec!(98.00)), bar(1, dec!(96.00))],
            meta(dec!(100)),
            LabelFormat::Time,
            Utc,
        );
        let summary = frame.summary.unwrap();
        assert_eq!(summary.change, dec!(-4));
        assert_eq!(summary.change_percent(), Ok(dec!(-4)));
    }

    #[test]
    fn test_label_keys_match_valid_positions() {
        let closes = [0, 5, 0, 0, 7, 8, 0, 9];
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i as i64, Decimal::from(c)))
            .collect();
        let frame = build_frame(bars, meta(dec!(1)), LabelFormat::Time, Utc);

        let valid = closes.iter().filter(|&&c| c != 0).count();
        assert_eq!(frame.series.values().len(), valid);
        assert_eq!(frame.series.labels().len(), valid);
        for key in frame.series.labels().keys() {
            assert!(*key < closes.len());
            assert_ne!(closes[*key], 0);
        }
        assert_eq!(
            frame.series.points(),
            vec![(1.0, 5.0), (4.0, 7.0), (5.0, 8.0), (7.0, 9.0)]
        );
        assert_eq!(frame.series.bounds(), Some((5.0, 9.0)));
    }

    #[test]
    fn test_compose_does_not_touch_meta() {
        let m = meta(dec!(20));
        let before = m.clone();
        let _ = Summary::compose(&m, &bar(0, dec!(21)));
        assert_eq!(m, before);
    }
}
