use chrono::Local;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use rust_decimal::{Decimal, RoundingStrategy};
use tickr_market::series::Summary;

/// 头部区域当前展示的内容。
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderState {
    Loading,
    Ready(Summary),
    // 没有任何有效 K 线
    NoData,
    // 数据源或窗口解析失败
    Failed(String),
}

/// 两位小数，中点远离零舍入。
pub fn fixed2(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// # Summary
/// 生成头部的一行富文本。
///
/// # Logic
/// 1. 代码、货币与价格使用品红色。
/// 2. 涨跌部分上涨为绿色，持平或下跌为红色；前收盘价为零时涨跌幅显示 n/a。
/// 3. 无数据与失败状态给出明确提示，不显示零值。
pub fn header_line(symbol: &str, state: &HeaderState) -> Line<'static> {
    let magenta = Style::default().fg(Color::Magenta);

    match state {
        HeaderState::Loading => Line::from(format!("Loading {}…", symbol)),
        HeaderState::NoData => Line::from(vec![
            Span::styled(symbol.to_string(), magenta),
            Span::raw(" | No data for the selected range"),
        ]),
        HeaderState::Failed(reason) => Line::from(vec![
            Span::styled(symbol.to_string(), magenta),
            Span::styled(
                format!(" | Error: {}", reason),
                Style::default().fg(Color::Red),
            ),
        ]),
        HeaderState::Ready(summary) => {
            let diff_color = if summary.change.is_sign_positive() && !summary.change.is_zero() {
                Color::Green
            } else {
                Color::Red
            };
            let percent = summary
                .change_percent()
                .map(fixed2)
                .unwrap_or_else(|_| "n/a".to_string());

            Line::from(vec![
                Span::styled(format!("{} {}", summary.symbol, summary.currency), magenta),
                Span::raw(" | Prev close at "),
                Span::styled(fixed2(summary.previous_close), magenta),
                Span::raw(" | "),
                Span::raw("Current "),
                Span::styled(fixed2(summary.last_price), magenta),
                Span::styled(
                    format!(" {}({})", fixed2(summary.change), percent),
                    Style::default().fg(diff_color),
                ),
                Span::raw(format!(
                    " on {}",
                    summary
                        .last_time
                        .with_timezone(&Local)
                        .format("%d/%m/%Y %H:%M")
                )),
                Span::raw(" | "),
                Span::raw(summary.exchange.clone()),
            ])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tickr_core::market::entity::{Bar, InstrumentMeta};

    fn summary(previous_close: Decimal, last: Decimal) -> Summary {
        let meta = InstrumentMeta {
            symbol: "AAPL".into(),
            currency: "USD".into(),
            previous_close,
            exchange: "NMS".into(),
            granularity: "1d".into(),
        };
        let bar = Bar {
            time: Utc.with_ymd_and_hms(2024, 5, 2, 20, 0, 0).unwrap(),
            close: last,
        };
        Summary::compose(&meta, &bar)
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_fixed2_rounding() {
        assert_eq!(fixed2(dec!(10.5)), "10.50");
        assert_eq!(fixed2(dec!(1.005)), "1.01");
        assert_eq!(fixed2(dec!(-0.125)), "-0.13");
    }

    #[test]
    fn test_ready_line() {
        let line = header_line("AAPL", &HeaderState::Ready(summary(dec!(10.00), dec!(10.50))));
        let s = text(&line);
        assert!(s.starts_with("AAPL USD | Prev close at 10.00 | Current 10.50 0.50(5.00) on "));
        assert!(s.ends_with(" | NMS"));

        let diff = line.spans.iter().find(|s| s.content.contains("(5.00)")).unwrap();
        assert_eq!(diff.style.fg, Some(Color::Green));
    }

    #[test]
    fn test_falling_price_is_red() {
        let line = header_line("AAPL", &HeaderState::Ready(summary(dec!(100), dec!(97.5))));
        let diff = line.spans.iter().find(|s| s.content.contains("(-2.50)")).unwrap();
        assert_eq!(diff.style.fg, Some(Color::Red));
    }

    #[test]
    fn test_zero_previous_close_shows_na() {
        let line = header_line("NEWCO", &HeaderState::Ready(summary(dec!(0), dec!(12))));
        assert!(text(&line).contains(" 12.00(n/a)"));
    }

    #[test]
    fn test_degenerate_and_error_states() {
        assert_eq!(text(&header_line("AAPL", &HeaderState::Loading)), "Loading AAPL…");
        assert!(text(&header_line("AAPL", &HeaderState::NoData)).contains("No data"));
        let failed = header_line("AAPL", &HeaderState::Failed("Data not found".into()));
        assert!(text(&failed).contains("Error: Data not found"));
    }
}
