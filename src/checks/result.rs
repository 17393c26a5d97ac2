//! 检测结果数据结构
//!
//! 定义统一的检测结果以及各执行器返回的探测结果

use crate::checks::target::Target;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// 产生该结果的检测目标
    pub target: Target,
    /// 是否成功
    pub success: bool,
    /// 延迟（毫秒），未测量时为空
    pub latency_ms: Option<f64>,
    /// 可读的结果描述
    pub message: String,
}

impl CheckResult {
    /// 创建新的检测结果
    pub fn new(
        target: Target,
        success: bool,
        latency_ms: Option<f64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target,
            success,
            latency_ms,
            message: message.into(),
        }
    }

    /// 创建失败结果（无延迟）
    pub fn failure(target: Target, message: impl Into<String>) -> Self {
        Self::new(target, false, None, message)
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从JSON字符串创建
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// 执行器的探测结果
///
/// `Completed` 表示协议层得到了回应（不一定健康），
/// `Failed` 表示探测本身没能完成，此时不会有延迟。
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// 探测完成
    Completed {
        success: bool,
        latency_ms: Option<f64>,
        message: String,
    },
    /// 探测失败
    Failed { message: String },
}

impl ProbeOutcome {
    /// 创建完成结果
    pub fn completed(success: bool, latency_ms: Option<f64>, message: impl Into<String>) -> Self {
        ProbeOutcome::Completed {
            success,
            latency_ms,
            message: message.into(),
        }
    }

    /// 创建失败结果
    pub fn failed(message: impl Into<String>) -> Self {
        ProbeOutcome::Failed {
            message: message.into(),
        }
    }

    /// 转换为针对 `target` 的检测结果
    pub fn into_result(self, target: Target) -> CheckResult {
        match self {
            ProbeOutcome::Completed {
                success,
                latency_ms,
                message,
            } => CheckResult::new(target, success, latency_ms, message),
            ProbeOutcome::Failed { message } => CheckResult::failure(target, message),
        }
    }
}

/// 将时长转换为毫秒浮点数
pub fn duration_to_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
