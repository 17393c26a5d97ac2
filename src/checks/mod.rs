//! 检测执行模块
//!
//! 提供 ping、TCP、HTTP 三种单次检测以及按类型分发的调度器

pub mod dispatcher;
pub mod http;
pub mod ping;
pub mod result;
pub mod target;
pub mod tcp;

use async_trait::async_trait;
use std::time::Duration;

// 重新导出主要类型
pub use dispatcher::{check_http, check_ping, check_tcp, Dispatcher, DEFAULT_TIMEOUT};
pub use http::HttpExecutor;
pub use ping::{EchoProber, EchoReply, PingExecutor, SystemPing};
pub use result::{CheckResult, ProbeOutcome};
pub use target::{CheckType, Target};
pub use tcp::TcpExecutor;

/// 单协议检测执行器
#[async_trait]
pub trait Probe: Send + Sync {
    /// 对目标执行一次探测
    async fn probe(&self, target: &Target, timeout: Duration) -> ProbeOutcome;

    /// 执行一次探测并生成检测结果
    async fn check(&self, target: &Target, timeout: Duration) -> CheckResult {
        self.probe(target, timeout).await.into_result(target.clone())
    }
}
