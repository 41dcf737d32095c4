//! # tickr-core
//!
//! 行情图表程序的领域词汇：证券身份、采样周期、K 线、元数据、数据源端口与时钟端口。

pub mod common;
pub mod config;

pub mod market {
    pub mod entity;
    pub mod error;
    pub mod port;
}
