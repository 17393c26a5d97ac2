//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// netwatch 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum NetwatchError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 检测相关错误
    #[error("检测错误: {0}")]
    Check(#[from] CheckError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 检测错误类型
///
/// 运行期的网络失败不会走到这里，它们被编码进 `CheckResult`。
/// 只有调用方传入的输入本身不合法时才会返回错误。
#[derive(Error, Debug)]
pub enum CheckError {
    /// URL 不合法（缺少协议、缺少主机或协议不是 http/https）
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// HTTP 客户端构建失败
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, NetwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_message() {
        let err = CheckError::InvalidUrl {
            url: "ftp://host/".to_string(),
            reason: "scheme must be http or https".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ftp://host/"));
        assert!(msg.contains("http or https"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: NetwatchError = ConfigError::EnvVarError {
            var: "API_TOKEN".to_string(),
        }
        .into();
        assert!(matches!(err, NetwatchError::Config(_)));
        assert!(err.to_string().contains("API_TOKEN"));
    }
}
