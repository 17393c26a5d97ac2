//! Web API 模块
//!
//! 提供检测接口 `POST /check` 和存活检查 `GET /health`

use crate::checks::Dispatcher;
use crate::error::CheckError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod server;

pub use server::WebServer;

/// 路由共享状态
#[derive(Debug, Clone)]
pub struct AppState {
    /// 检测调度器，HTTP 客户端在请求之间复用
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// 使用系统 ping 命令和新的 HTTP 客户端创建
    pub fn new() -> Result<Self, CheckError> {
        Ok(Self::with_dispatcher(Dispatcher::new()?))
    }

    /// 使用已有的调度器创建
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

/// API错误响应，序列化为 `{"detail": "..."}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP 状态码
    pub status: StatusCode,
    /// 错误详情
    pub detail: String,
}

impl ApiError {
    /// 创建新的API错误
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// 400 错误
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// 422 错误
    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    /// 500 错误
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl From<CheckError> for ApiError {
    fn from(error: CheckError) -> Self {
        match error {
            CheckError::InvalidUrl { .. } => ApiError::bad_request(error.to_string()),
            CheckError::Client(_) => ApiError::internal(error.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("请求处理失败: {}", self.detail);
        }
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

/// 处理 handler 中的 panic，返回 500
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "internal server error".to_string()
    };

    ApiError::internal(detail).into_response()
}

/// 创建路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/check", post(handlers::run_check))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}
