//! 检测调度器与便捷入口
//!
//! 根据目标的检测类型选择执行器，并原样返回执行器的结果

use crate::checks::http::HttpExecutor;
use crate::checks::ping::{EchoProber, PingExecutor, SystemPing};
use crate::checks::result::CheckResult;
use crate::checks::target::{CheckType, Target};
use crate::checks::tcp::TcpExecutor;
use crate::checks::Probe;
use crate::error::CheckError;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 默认检测超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// 检测调度器
#[derive(Debug, Clone)]
pub struct Dispatcher<P = SystemPing> {
    ping: PingExecutor<P>,
    tcp: TcpExecutor,
    http: HttpExecutor,
    /// 默认超时时间
    default_timeout: Duration,
}

impl Dispatcher<SystemPing> {
    /// 使用系统 ping 命令创建调度器
    pub fn new() -> Result<Self, CheckError> {
        Self::with_prober(SystemPing::new())
    }
}

impl<P: EchoProber> Dispatcher<P> {
    /// 使用自定义 ping 探测器创建调度器
    pub fn with_prober(prober: P) -> Result<Self, CheckError> {
        Ok(Self {
            ping: PingExecutor::with_prober(prober),
            tcp: TcpExecutor::new(),
            http: HttpExecutor::new()?,
            default_timeout: DEFAULT_TIMEOUT,
        })
    }

    /// 设置默认超时时间
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// 默认超时时间
    pub fn timeout(&self) -> Duration {
        self.default_timeout
    }

    /// 使用默认超时执行检测
    pub async fn run_check(&self, target: &Target) -> CheckResult {
        self.run_check_with_timeout(target, self.default_timeout).await
    }

    /// 执行检测
    ///
    /// 从不返回错误：未知的检测类型同样以失败结果表示。
    pub async fn run_check_with_timeout(&self, target: &Target, timeout: Duration) -> CheckResult {
        log_start(target);

        let result = match &target.check_type {
            CheckType::Ping => self.ping.check(target, timeout).await,
            CheckType::Tcp => self.tcp.check(target, timeout).await,
            CheckType::Http => self.http.check(target, timeout).await,
            CheckType::Other(kind) => {
                CheckResult::failure(target.clone(), format!("Unknown check type: {kind}"))
            }
        };

        log_result(&result);
        result
    }

    /// 对单个主机执行 ping 检测
    pub async fn check_ping(&self, host: &str, timeout: Duration) -> CheckResult {
        self.run_check_with_timeout(&ping_target(host), timeout).await
    }

    /// 对单个主机端口执行 TCP 检测
    pub async fn check_tcp(&self, host: &str, port: u16, timeout: Duration) -> CheckResult {
        self.run_check_with_timeout(&tcp_target(host, port), timeout).await
    }

    /// 对完整 URL 执行 HTTP 检测，复用调度器的客户端
    pub async fn check_http(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<CheckResult, CheckError> {
        let url = HttpExecutor::validate_url(url)?;
        Ok(fetch_url(&self.http, &url, timeout).await)
    }
}

fn ping_target(host: &str) -> Target {
    Target::new(format!("ping:{host}"), host, CheckType::Ping)
}

fn tcp_target(host: &str, port: u16) -> Target {
    Target::new(format!("tcp:{host}:{port}"), host, CheckType::Tcp).with_port(port)
}

/// 对已校验的 URL 发送请求，保留 URL 原本的协议
async fn fetch_url(http: &HttpExecutor, url: &Url, timeout: Duration) -> CheckResult {
    let target = HttpExecutor::target_from_url(url);
    log_start(&target);
    let result = http.fetch(url.as_str(), timeout).await.into_result(target);
    log_result(&result);
    result
}

fn log_start(target: &Target) {
    debug!(
        target_name = %target.name,
        host = %target.host,
        check_type = %target.check_type,
        "开始检测"
    );
}

fn log_result(result: &CheckResult) {
    if result.success {
        info!(
            target_name = %result.target.name,
            latency_ms = ?result.latency_ms,
            "检测成功: {}",
            result.message
        );
    } else {
        warn!(
            target_name = %result.target.name,
            latency_ms = ?result.latency_ms,
            "检测失败: {}",
            result.message
        );
    }
}

/// 对单个主机执行 ping 检测
pub async fn check_ping(host: &str, timeout: Duration) -> CheckResult {
    let target = ping_target(host);
    log_start(&target);
    let result = PingExecutor::new().check(&target, timeout).await;
    log_result(&result);
    result
}

/// 对单个主机端口执行 TCP 检测
pub async fn check_tcp(host: &str, port: u16, timeout: Duration) -> CheckResult {
    let target = tcp_target(host, port);
    log_start(&target);
    let result = TcpExecutor::new().check(&target, timeout).await;
    log_result(&result);
    result
}

/// 对完整 URL 执行 HTTP 检测
///
/// URL 在发出任何请求之前校验，不合法时返回 [`CheckError::InvalidUrl`]。
/// 每次调用都会新建客户端，需要复用连接时使用 [`Dispatcher::check_http`]。
pub async fn check_http(url: &str, timeout: Duration) -> Result<CheckResult, CheckError> {
    let url = HttpExecutor::validate_url(url)?;
    let http = HttpExecutor::new()?;
    Ok(fetch_url(&http, &url, timeout).await)
}
