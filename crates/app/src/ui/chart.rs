use ratatui::style::{Color, Style};
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Chart, Dataset, GraphType};
use rust_decimal::prelude::ToPrimitive;
use tickr_market::series::ChartSeries;

/// 横轴最多展示的标签数。
pub const MAX_X_LABELS: usize = 5;

/// # Summary
/// 从标签映射中均匀挑选横轴标签。
///
/// # Logic
/// 1. 在 `0..total_bars` 上取 `count` 个等距目标位置。
/// 2. 每个目标取键距离最近的标签 (距离相同取左侧)。
/// 3. 少于两个有效点时只返回已有标签。
pub fn x_labels(series: &ChartSeries, count: usize) -> Vec<String> {
    let labels = series.labels();
    if labels.len() < 2 || count < 2 {
        return labels.values().cloned().collect();
    }

    let last = series.total_bars().saturating_sub(1);
    (0..count)
        .filter_map(|k| {
            let target = k * last / (count - 1);
            let before = labels.range(..=target).next_back();
            let after = labels.range(target..).next();
            match (before, after) {
                (Some((bk, bv)), Some((ak, av))) => {
                    if target - bk <= ak - target {
                        Some(bv.clone())
                    } else {
                        Some(av.clone())
                    }
                }
                (Some((_, v)), None) | (None, Some((_, v))) => Some(v.clone()),
                (None, None) => None,
            }
        })
        .collect()
}

/// # Summary
/// 纵轴范围，上下各留 2% 空白；单一价格时上下各扩 1。
pub fn y_bounds(series: &ChartSeries) -> [f64; 2] {
    match series.bounds() {
        None => [0.0, 1.0],
        Some((lo, hi)) if (hi - lo).abs() < f64::EPSILON => [lo - 1.0, hi + 1.0],
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.02;
            [lo - pad, hi + pad]
        }
    }
}

/// # Summary
/// 构建折线图部件。
///
/// # Arguments
/// * `series`: 图表序列。
/// * `points`: `series.points()` 的结果，由调用方持有以满足借用。
pub fn line_chart<'a>(series: &ChartSeries, points: &'a [(f64, f64)]) -> Chart<'a> {
    let dataset = Dataset::default()
        .name("main")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::White))
        .data(points);

    let x_max = series
        .total_bars()
        .saturating_sub(1)
        .max(1)
        .to_f64()
        .unwrap_or(1.0);
    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Red))
        .bounds([0.0, x_max])
        .labels(
            x_labels(series, MAX_X_LABELS)
                .into_iter()
                .map(|l| Span::styled(l, Style::default().fg(Color::Cyan)))
                .collect::<Vec<_>>(),
        );

    let [lo, hi] = y_bounds(series);
    let y_axis = Axis::default()
        .style(Style::default().fg(Color::Red))
        .bounds([lo, hi])
        .labels(
            [lo, (lo + hi) / 2.0, hi]
                .into_iter()
                .map(|v| Span::styled(format!("{:.2}", v), Style::default().fg(Color::Green)))
                .collect::<Vec<_>>(),
        );

    Chart::new(vec![dataset]).x_axis(x_axis).y_axis(y_axis)
}
