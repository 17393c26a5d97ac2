//! HTTP GET 检测
//!
//! 支持两种入口：基于检测目标（总是使用 https）和基于完整 URL（先校验）

use crate::checks::result::{duration_to_ms, CheckResult, ProbeOutcome};
use crate::checks::target::{CheckType, Target};
use crate::checks::Probe;
use crate::error::CheckError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::error::Error as _;
use std::time::{Duration, Instant};

/// HTTP 检测执行器
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    /// HTTP客户端
    client: Client,
}

impl HttpExecutor {
    /// 创建新的HTTP检测执行器
    ///
    /// 超时在每次请求上单独设置，客户端本身不带超时。
    pub fn new() -> Result<Self, CheckError> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()?;

        Ok(Self { client })
    }

    /// 基于检测目标构建请求 URL：`https://<host><path>`
    pub fn target_url(target: &Target) -> String {
        format!("https://{}{}", target.host, target.path_or_root())
    }

    /// 校验完整 URL：必须有协议和主机，且协议为 http 或 https
    pub fn validate_url(raw: &str) -> Result<Url, CheckError> {
        let invalid = |reason: String| CheckError::InvalidUrl {
            url: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(invalid(format!(
                    "unsupported scheme {other:?}, expected http or https"
                )))
            }
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }

        Ok(url)
    }

    /// 根据已校验的 URL 生成检测目标
    pub fn target_from_url(url: &Url) -> Target {
        let host = url.host_str().unwrap_or_default();
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        Target::new(format!("http:{authority}"), authority, CheckType::Http).with_path(path)
    }

    /// 对完整 URL 执行检测
    ///
    /// URL 不合法时返回错误，且不会发出任何请求。
    pub async fn http_from_url(
        &self,
        raw: &str,
        timeout: Duration,
    ) -> Result<CheckResult, CheckError> {
        let url = Self::validate_url(raw)?;
        let target = Self::target_from_url(&url);
        Ok(self.fetch(url.as_str(), timeout).await.into_result(target))
    }

    /// 发送一次 GET 请求
    pub(crate) async fn fetch(&self, url: &str, timeout: Duration) -> ProbeOutcome {
        let start_time = Instant::now();
        let response = self.client.get(url).timeout(timeout).send().await;
        let response_time = start_time.elapsed();

        match response {
            Ok(response) => {
                let status = response.status();
                ProbeOutcome::completed(
                    status == StatusCode::OK,
                    Some(duration_to_ms(response_time)),
                    format!("HTTP {}", status.as_u16()),
                )
            }
            Err(e) => {
                ProbeOutcome::failed(format!("HTTP error: {}", format_request_error(&e, timeout)))
            }
        }
    }
}

/// 格式化请求错误信息，带上底层原因
fn format_request_error(error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        return format!("request timed out after {:.1}s", timeout.as_secs_f64());
    }

    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[async_trait]
impl Probe for HttpExecutor {
    async fn probe(&self, target: &Target, timeout: Duration) -> ProbeOutcome {
        self.fetch(&Self::target_url(target), timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_url_forces_https() {
        let target = Target::new("GitHub API", "api.github.com", CheckType::Http);
        assert_eq!(HttpExecutor::target_url(&target), "https://api.github.com/");

        let target = target.with_path("/rate_limit");
        assert_eq!(
            HttpExecutor::target_url(&target),
            "https://api.github.com/rate_limit"
        );
    }

    #[test]
    fn test_validate_url_accepts_http_and_https() {
        assert!(HttpExecutor::validate_url("http://localhost:8080/health").is_ok());
        assert!(HttpExecutor::validate_url("https://example.com").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_other_schemes() {
        let err = HttpExecutor::validate_url("ftp://host/").unwrap_err();
        assert!(matches!(err, CheckError::InvalidUrl { .. }));
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn test_validate_url_rejects_missing_scheme_or_host() {
        assert!(HttpExecutor::validate_url("example.com/health").is_err());
        assert!(HttpExecutor::validate_url("").is_err());
        assert!(HttpExecutor::validate_url("http://").is_err());
        assert!(HttpExecutor::validate_url("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_target_from_url() {
        let url = HttpExecutor::validate_url("http://127.0.0.1:8080/status?verbose=1").unwrap();
        let target = HttpExecutor::target_from_url(&url);

        assert_eq!(target.name, "http:127.0.0.1:8080");
        assert_eq!(target.host, "127.0.0.1:8080");
        assert_eq!(target.check_type, CheckType::Http);
        assert_eq!(target.path.as_deref(), Some("/status?verbose=1"));
        assert!(target.port.is_none());
    }

    #[tokio::test]
    async fn test_http_200() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let executor = HttpExecutor::new().unwrap();
        let result = executor
            .http_from_url(&format!("{}/health", server.url()), Duration::from_secs(5))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(result.success);
        assert_eq!(result.message, "HTTP 200");
        assert!(result.latency_ms.unwrap() > 0.0);
        assert_eq!(result.target.path.as_deref(), Some("/health"));
    }

    #[tokio::test]
    async fn test_http_404() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let executor = HttpExecutor::new().unwrap();
        let result = executor
            .http_from_url(&format!("{}/missing", server.url()), Duration::from_secs(5))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.message, "HTTP 404");
        assert!(result.latency_ms.is_some());
    }

    #[tokio::test]
    async fn test_http_other_2xx_is_not_success() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/").with_status(204).create_async().await;

        let executor = HttpExecutor::new().unwrap();
        let result = executor
            .http_from_url(&server.url(), Duration::from_secs(5))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.message, "HTTP 204");
    }

    #[tokio::test]
    async fn test_http_invalid_url_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/").expect(0).create_async().await;

        let executor = HttpExecutor::new().unwrap();
        let err = executor
            .http_from_url("ftp://host/", Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::InvalidUrl { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_connection_refused() {
        // 绑定后立即释放的端口
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let executor = HttpExecutor::new().unwrap();
        let result = executor
            .http_from_url(&format!("http://127.0.0.1:{port}/"), Duration::from_secs(2))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.latency_ms.is_none());
        assert!(result.message.starts_with("HTTP error: "));
    }
}
