//! TCP 连接检测

use crate::checks::result::{duration_to_ms, ProbeOutcome};
use crate::checks::target::Target;
use crate::checks::Probe;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// TCP 检测执行器
///
/// 建立连接后立即关闭，不收发任何数据。
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpExecutor;

impl TcpExecutor {
    /// 创建TCP检测执行器
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for TcpExecutor {
    async fn probe(&self, target: &Target, timeout: Duration) -> ProbeOutcome {
        let Some(port) = target.port else {
            return ProbeOutcome::failed("TCP check requires a port");
        };

        let start_time = Instant::now();
        let connect = TcpStream::connect((target.host.as_str(), port));

        match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(stream)) => {
                let elapsed = start_time.elapsed();
                drop(stream);
                ProbeOutcome::completed(
                    true,
                    Some(duration_to_ms(elapsed)),
                    "TCP connection successful",
                )
            }
            Ok(Err(e)) => ProbeOutcome::failed(format!("TCP error: {e}")),
            Err(_) => ProbeOutcome::failed(format!(
                "TCP error: connection timed out after {:.1}s",
                timeout.as_secs_f64()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::target::CheckType;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_requires_port() {
        let target = Target::new("Missing port", "localhost", CheckType::Tcp);

        let result = TcpExecutor::new().check(&target, Duration::from_secs(1)).await;

        assert!(!result.success);
        assert!(result.latency_ms.is_none());
        assert_eq!(result.message, "TCP check requires a port");
    }

    #[tokio::test]
    async fn test_tcp_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let target = Target::new("Local", "127.0.0.1", CheckType::Tcp).with_port(port);

        let result = TcpExecutor::new().check(&target, Duration::from_secs(2)).await;

        assert!(result.success, "unexpected failure: {}", result.message);
        assert_eq!(result.message, "TCP connection successful");
        let latency = result.latency_ms.expect("latency should be measured");
        assert!(latency >= 0.0);
    }

    #[tokio::test]
    async fn test_tcp_closed_port() {
        // 绑定后立即释放，拿到一个大概率没人监听的端口
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let target = Target::new("Closed", "127.0.0.1", CheckType::Tcp).with_port(port);

        let result = TcpExecutor::new().check(&target, Duration::from_secs(2)).await;

        assert!(!result.success);
        assert!(result.latency_ms.is_none());
        assert!(result.message.starts_with("TCP error: "));
        assert!(result.message.len() > "TCP error: ".len());
    }

    #[tokio::test]
    async fn test_tcp_unresolvable_host() {
        let target = Target::new("Nowhere", "nowhere.invalid", CheckType::Tcp).with_port(80);

        let result = TcpExecutor::new().check(&target, Duration::from_secs(2)).await;

        assert!(!result.success);
        assert!(result.message.starts_with("TCP error: "));
    }
}
