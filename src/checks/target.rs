//! 检测目标定义
//!
//! 描述要检测的对象：名称、主机、检测类型以及可选的端口和路径

use serde::{Deserialize, Serialize};
use std::fmt;

/// 检测类型
///
/// 已知类型只有 ping / tcp / http 三种。无法识别的类型字符串保存在
/// `Other` 中，反序列化不会因此失败，由调度器把它报告为失败结果。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    /// ICMP 回显检测
    Ping,
    /// TCP 连接检测
    Tcp,
    /// HTTP GET 检测
    Http,
    /// 未知类型，保留原始字符串
    #[serde(untagged)]
    Other(String),
}

impl CheckType {
    /// 类型的字符串形式
    pub fn as_str(&self) -> &str {
        match self {
            CheckType::Ping => "ping",
            CheckType::Tcp => "tcp",
            CheckType::Http => "http",
            CheckType::Other(kind) => kind,
        }
    }

    /// 是否为已知的检测类型
    pub fn is_known(&self) -> bool {
        !matches!(self, CheckType::Other(_))
    }
}

impl From<&str> for CheckType {
    fn from(value: &str) -> Self {
        match value {
            "ping" => CheckType::Ping,
            "tcp" => CheckType::Tcp,
            "http" => CheckType::Http,
            other => CheckType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 检测目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// 显示名称
    pub name: String,
    /// 主机名、IP 或 authority（host:port）
    pub host: String,
    /// 检测类型
    #[serde(rename = "type")]
    pub check_type: CheckType,
    /// 端口，仅 tcp 检测使用
    #[serde(default)]
    pub port: Option<u16>,
    /// 路径，仅 http 检测使用，缺省为 "/"
    #[serde(default)]
    pub path: Option<String>,
}

impl Target {
    /// 创建新的检测目标
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        check_type: impl Into<CheckType>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            check_type: check_type.into(),
            port: None,
            path: None,
        }
    }

    /// 设置端口
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// 设置路径
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// http 检测使用的路径，未设置时为 "/"，并保证以 "/" 开头
    pub fn path_or_root(&self) -> String {
        match self.path.as_deref() {
            None | Some("") => "/".to_string(),
            Some(path) if path.starts_with('/') => path.to_string(),
            Some(path) => format!("/{path}"),
        }
    }
}
