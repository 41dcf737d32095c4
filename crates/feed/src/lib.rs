//! # tickr-feed
//!
//! 行情数据源适配层：Yahoo Finance 图表接口，以及带超时与重试的数据源装饰器。

pub mod retry;
pub mod yahoo;

/// # Summary
/// 为 rustls 安装进程级加密后端。
///
/// # Logic
/// 1. reqwest 以 `rustls-no-provider` 构建，必须在首个 TLS 连接前安装 ring 后端。
/// 2. 重复安装直接忽略。
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }
}
