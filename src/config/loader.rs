//! 配置加载器实现
//!
//! 提供TOML配置文件解析、环境变量替换和错误处理功能

use crate::config::types::{validate_config, Config};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::{Captures, Regex};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `${VAR_NAME}` 占位符
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("环境变量占位符正则无效")
});

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 从字符串加载配置
    async fn load_from_string(&self, content: &str) -> Result<Config>;

    /// 验证配置
    fn validate(&self, config: &Config) -> Result<()>;
}

/// TOML配置加载器实现
///
/// 环境变量只在解析后的字符串值中展开，注释和键名保持原样。
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl TomlConfigLoader {
    /// 创建新的TOML配置加载器
    ///
    /// # 参数
    /// * `enable_env_substitution` - 是否启用环境变量替换
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 解析TOML文档，展开字符串值中的环境变量后再映射为 `Config`
    fn parse_toml(&self, content: &str) -> Result<Config> {
        let mut document: toml::Table = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?;

        if self.enable_env_substitution {
            for (_, value) in document.iter_mut() {
                expand_in_value(value)?;
            }
        }

        toml::Value::Table(document)
            .try_into()
            .map_err(|e| ConfigError::ParseError(format!("配置结构无效: {}", e)).into())
    }

    /// 加载配置，未显式指定且默认文件不存在时使用默认配置
    ///
    /// # 参数
    /// * `explicit` - 命令行或环境变量指定的配置文件路径
    pub async fn load_or_default(&self, explicit: Option<&Path>) -> Result<Config> {
        match explicit {
            Some(path) => self.load_from_file(path).await,
            None => {
                let path = get_default_config_path();
                if path.exists() {
                    self.load_from_file(&path).await
                } else {
                    log::debug!("未找到配置文件 {}，使用默认配置", path.display());
                    Ok(Config::default())
                }
            }
        }
    }
}

/// 递归展开 TOML 值中的字符串
fn expand_in_value(value: &mut toml::Value) -> Result<()> {
    match value {
        toml::Value::String(text) => *text = expand_env_vars(text)?,
        toml::Value::Array(items) => {
            for item in items {
                expand_in_value(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                expand_in_value(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// 展开单个字符串中的 `${VAR}`，展开结果不会被再次替换
fn expand_env_vars(text: &str) -> Result<String> {
    let mut missing: Option<String> = None;

    let expanded = ENV_VAR_PATTERN.replace_all(text, |captures: &Captures| {
        match std::env::var(&captures[1]) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| captures[1].to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var) => Err(ConfigError::EnvVarError { var }.into()),
        None => Ok(expanded.into_owned()),
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::ParseError(format!("读取 {} 失败: {}", path.display(), e))
            }
        })?;

        let config = self.parse_toml(&content)?;
        self.validate(&config)?;

        log::info!(
            "已加载配置文件 {}（{} 个检测目标）",
            path.display(),
            config.targets.len()
        );

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<Config> {
        let config = self.parse_toml(content)?;
        self.validate(&config)?;
        Ok(config)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

/// 获取默认配置文件路径
///
/// 当前目录存在 `netwatch.toml` 时使用它，否则使用平台配置目录下的
/// `netwatch/config.toml`。
pub fn get_default_config_path() -> PathBuf {
    let local = PathBuf::from("netwatch.toml");
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|config_dir| config_dir.join("netwatch").join("config.toml"))
        .unwrap_or(local)
}
