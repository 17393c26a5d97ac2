//! 配置管理模块
//!
//! 提供配置文件解析、验证和默认检测目标

pub mod loader;
pub mod types;

// 重新导出主要类型
pub use loader::{get_default_config_path, ConfigLoader, TomlConfigLoader};
pub use types::{
    default_targets, is_valid_timeout, validate_config, Config, GlobalConfig, WebConfig,
    MAX_TIMEOUT_SECONDS, MIN_TIMEOUT_SECONDS,
};
