//! Web 路由处理函数
//!
//! 校验请求负载并调用检测入口

use super::{ApiError, AppState};
use crate::checks::{CheckResult, CheckType};
use crate::config::{is_valid_timeout, MAX_TIMEOUT_SECONDS, MIN_TIMEOUT_SECONDS};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// 检测请求负载
#[derive(Debug, Clone, Deserialize)]
pub struct RunCheckRequest {
    /// 检测类型
    #[serde(rename = "type")]
    pub check_type: CheckType,
    /// 主机（ping / tcp）
    #[serde(default)]
    pub host: Option<String>,
    /// 完整 URL（http）
    #[serde(default)]
    pub url: Option<String>,
    /// 端口（tcp）
    #[serde(default)]
    pub port: Option<u16>,
    /// 超时时间（秒）
    #[serde(default = "default_request_timeout")]
    pub timeout: f64,
}

fn default_request_timeout() -> f64 {
    5.0
}

/// 取出非空字段，缺失或为空时返回 400
fn required<'a>(value: &'a Option<String>, detail: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(detail))
}

/// 存活检查
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// 执行一次检测
pub async fn run_check(
    State(state): State<AppState>,
    Json(payload): Json<RunCheckRequest>,
) -> Result<Json<CheckResult>, ApiError> {
    debug!("收到检测请求: {:?}", payload);

    if !is_valid_timeout(payload.timeout) {
        return Err(ApiError::unprocessable(format!(
            "timeout must be between {MIN_TIMEOUT_SECONDS} and {MAX_TIMEOUT_SECONDS} seconds"
        )));
    }
    let timeout = Duration::from_secs_f64(payload.timeout);

    let result = match &payload.check_type {
        CheckType::Ping => {
            let host = required(&payload.host, "host is required for ping")?;
            state.dispatcher.check_ping(host, timeout).await
        }
        CheckType::Http => {
            let url = required(&payload.url, "url is required for http")?;
            state.dispatcher.check_http(url, timeout).await?
        }
        CheckType::Tcp => {
            let host = required(&payload.host, "host and port are required for tcp")?;
            let port = payload
                .port
                .ok_or_else(|| ApiError::bad_request("host and port are required for tcp"))?;
            state.dispatcher.check_tcp(host, port, timeout).await
        }
        CheckType::Other(_) => return Err(ApiError::bad_request("unknown check type")),
    };

    Ok(Json(result))
}
