//! ICMP ping 检测
//!
//! 通过系统自带的 ping 命令发送一个回显请求。命令的调用被封装在
//! [`EchoProber`] 后面，测试中可以替换为假的实现。

use crate::checks::result::ProbeOutcome;
use crate::checks::target::Target;
use crate::checks::Probe;
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// 一次回显请求的原始输出
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EchoReply {
    /// 进程退出码是否表示收到回复
    pub delivered: bool,
    /// 标准输出
    pub stdout: String,
    /// 诊断输出（标准错误）
    pub stderr: String,
}

/// 发送单个回显请求的能力
#[async_trait]
pub trait EchoProber: Send + Sync {
    /// 向 `host` 发送一个回显请求，最多等待 `wait_secs` 秒
    async fn echo(&self, host: &str, wait_secs: u64) -> io::Result<EchoReply>;
}

/// 基于系统 ping 命令的实现
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
}

impl SystemPing {
    /// 使用 PATH 中的 `ping`
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    /// 使用指定的 ping 程序
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemPing {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EchoProber for SystemPing {
    async fn echo(&self, host: &str, wait_secs: u64) -> io::Result<EchoReply> {
        // 防止主机名被当作命令行选项
        if host.is_empty() || host.starts_with('-') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid host {host:?}"),
            ));
        }

        let wait = wait_secs.to_string();
        let mut command = Command::new(&self.program);

        #[cfg(target_os = "macos")]
        command.args(["-c", "1", "-t", &wait, host]);
        #[cfg(not(target_os = "macos"))]
        command.args(["-c", "1", "-W", &wait, host]);

        // 超时后 future 被丢弃，子进程随之被杀掉
        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(EchoReply {
            delivered: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Ping 检测执行器
#[derive(Debug, Clone, Default)]
pub struct PingExecutor<P = SystemPing> {
    prober: P,
}

impl PingExecutor<SystemPing> {
    /// 使用系统 ping 命令创建执行器
    pub fn new() -> Self {
        Self::with_prober(SystemPing::new())
    }
}

impl<P: EchoProber> PingExecutor<P> {
    /// 使用自定义探测器创建执行器
    pub fn with_prober(prober: P) -> Self {
        Self { prober }
    }
}

/// ping 命令自身的等待秒数：`max(1, floor(timeout))`
pub fn wait_seconds(timeout: Duration) -> u64 {
    timeout.as_secs().max(1)
}

/// 强制终止的时限：`timeout + 1s`
pub fn hard_limit(timeout: Duration) -> Duration {
    timeout + Duration::from_secs(1)
}

/// 从 ping 输出中解析延迟
///
/// 取第一个包含 `time=` 的行，解析其后的数值（毫秒）。数值无法解析时返回 `None`。
pub fn parse_latency(output: &str) -> Option<f64> {
    let line = output.lines().find(|line| line.contains("time="))?;
    let (_, rest) = line.split_once("time=")?;
    // 数值必须紧跟在 `time=` 之后
    let token = rest.split(char::is_whitespace).next()?;
    let value = token.strip_suffix("ms").unwrap_or(token);

    value
        .parse::<f64>()
        .ok()
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
}

#[async_trait]
impl<P: EchoProber> Probe for PingExecutor<P> {
    async fn probe(&self, target: &Target, timeout: Duration) -> ProbeOutcome {
        let limit = hard_limit(timeout);
        let attempt = self.prober.echo(&target.host, wait_seconds(timeout));

        let reply = match tokio::time::timeout(limit, attempt).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return ProbeOutcome::failed(format!("Ping error: {e}")),
            Err(_) => {
                return ProbeOutcome::failed(format!(
                    "Ping error: no reply within {:.1}s, probe killed",
                    limit.as_secs_f64()
                ))
            }
        };

        let latency_ms = parse_latency(&reply.stdout);
        let message = if reply.delivered {
            "Ping OK".to_string()
        } else {
            let diagnostic = reply.stderr.trim();
            if diagnostic.is_empty() {
                "Ping failed".to_string()
            } else {
                diagnostic.to_string()
            }
        };

        ProbeOutcome::completed(reply.delivered, latency_ms, message)
    }
}
