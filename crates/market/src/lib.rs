//! # tickr-market
//!
//! 行情到图表序列的转换管线：周期解析、坐标轴标签格式、序列构建与摘要，
//! 以及把完整结果交给界面的后台任务。

pub mod label;
pub mod period;
pub mod series;
pub mod worker;
