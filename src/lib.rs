//! netwatch - 单次网络可达性检测工具
//!
//! 支持三种检测方式，统一返回检测结果（是否成功、延迟、描述）：
//! - ICMP ping
//! - TCP 连接
//! - HTTP GET
//!
//! 另外提供 HTTP API、命令行和 TOML 配置。

pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod web;

// 重新导出主要类型
pub use checks::{check_http, check_ping, check_tcp, CheckResult, CheckType, Dispatcher, Target};
pub use config::Config;
pub use error::{CheckError, NetwatchError};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
