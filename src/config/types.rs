//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体、默认检测目标和验证逻辑

use crate::checks::{CheckType, Target};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// 允许的最小检测超时（秒）
pub const MIN_TIMEOUT_SECONDS: f64 = 0.1;
/// 允许的最大检测超时（秒）
pub const MAX_TIMEOUT_SECONDS: f64 = 60.0;

/// 主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// Web API 配置
    #[serde(default)]
    pub web: WebConfig,
    /// 检测目标列表，为空时使用内置默认目标
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 检测超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 日志文件路径，设置后日志写入文件而不是标准错误
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// 按模块设置的日志级别，例如 `"netwatch::checks" = "debug"`
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub log_modules: HashMap<String, String>,
}

/// Web API 配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebConfig {
    /// 绑定地址
    #[serde(default = "default_web_bind_address")]
    pub bind_address: String,
    /// 监听端口
    #[serde(default = "default_web_port")]
    pub port: u16,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            log_level: default_log_level(),
            log_file: None,
            log_modules: HashMap::new(),
        }
    }
}

impl GlobalConfig {
    /// 检测超时时间
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: default_web_bind_address(),
            port: default_web_port(),
        }
    }
}

impl WebConfig {
    /// 解析监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| format!("无效的监听地址 {}:{}: {}", self.bind_address, self.port, e))
    }
}

impl Config {
    /// 实际使用的检测目标：配置了目标时使用配置，否则使用内置默认目标
    pub fn effective_targets(&self) -> Vec<Target> {
        if self.targets.is_empty() {
            default_targets()
        } else {
            self.targets.clone()
        }
    }
}

// 默认值函数
fn default_timeout() -> f64 {
    5.0
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_web_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_web_port() -> u16 {
    8000
}

/// 内置的示例检测目标
pub fn default_targets() -> Vec<Target> {
    vec![
        Target::new("Google DNS", "8.8.8.8", CheckType::Ping),
        Target::new("GitHub API", "api.github.com", CheckType::Http).with_path("/"),
        Target::new("SSH Prod", "example.com", CheckType::Tcp).with_port(22),
    ]
}

/// 超时是否在允许范围内
pub fn is_valid_timeout(seconds: f64) -> bool {
    (MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&seconds)
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if !is_valid_timeout(config.global.timeout_seconds) {
        return Err(format!(
            "检测超时时间 {} 超出范围 {}-{} 秒",
            config.global.timeout_seconds, MIN_TIMEOUT_SECONDS, MAX_TIMEOUT_SECONDS
        ));
    }

    // 验证日志级别
    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.global.log_level, valid_log_levels
        ));
    }
    for (module, level) in &config.global.log_modules {
        if module.trim().is_empty() {
            return Err("模块日志级别的模块名不能为空".to_string());
        }
        if !valid_log_levels.contains(&level.as_str()) {
            return Err(format!("模块 {} 的日志级别 {} 无效", module, level));
        }
    }

    if config.web.bind_address.trim().is_empty() {
        return Err("Web服务器绑定地址不能为空".to_string());
    }

    if config.web.port == 0 {
        return Err("Web服务器端口不能为0".to_string());
    }

    for target in &config.targets {
        if target.name.trim().is_empty() {
            return Err("检测目标名称不能为空".to_string());
        }

        if target.host.trim().is_empty() {
            return Err(format!("检测目标 {} 的主机不能为空", target.name));
        }

        match &target.check_type {
            CheckType::Tcp => match target.port {
                None => return Err(format!("TCP 检测目标 {} 必须指定端口", target.name)),
                Some(0) => return Err(format!("检测目标 {} 的端口不能为0", target.name)),
                Some(_) => {}
            },
            CheckType::Ping | CheckType::Http => {}
            CheckType::Other(kind) => {
                return Err(format!(
                    "检测目标 {} 的检测类型 {} 无效，支持的类型: [\"ping\", \"tcp\", \"http\"]",
                    target.name, kind
                ))
            }
        }
    }

    Ok(())
}
