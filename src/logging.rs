//! 日志系统模块
//!
//! 提供结构化日志配置和初始化功能

use crate::config::GlobalConfig;
use log::LevelFilter;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 全局日志初始化状态
#[derive(Debug, Default)]
struct GlobalLoggingState {
    /// 是否已初始化
    initialized: bool,
    /// 初始化失败时的错误信息
    init_error: Option<String>,
}

/// 全局日志状态管理器
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

/// 日志配置结构
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 日志文件路径，未设置时写到标准错误
    pub file_path: Option<PathBuf>,
    /// 是否使用JSON格式
    pub json_format: bool,
    /// 模块级别日志控制
    pub module_levels: HashMap<String, LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
            json_format: false,
            module_levels: HashMap::new(),
        }
    }
}

impl LogConfig {
    /// 从级别字符串创建，无法识别时使用 info
    pub fn from_level_name(level: &str) -> Self {
        let level = level.parse().unwrap_or(LevelFilter::Info);
        Self {
            level,
            ..Default::default()
        }
    }

    /// 从配置文件的 `[global]` 段创建
    pub fn from_global(global: &GlobalConfig) -> Self {
        let module_levels = global
            .log_modules
            .iter()
            .filter_map(|(module, level)| {
                level
                    .parse()
                    .ok()
                    .map(|level: LevelFilter| (module.clone(), level))
            })
            .collect();

        Self {
            file_path: global.log_file.clone(),
            module_levels,
            ..Self::from_level_name(&global.log_level)
        }
    }
}

/// 日志系统管理器
#[derive(Debug)]
pub struct LoggingSystem {
    /// 配置
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 进程内只会真正初始化一次，之后的调用直接返回新的句柄。
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let state_mutex =
            GLOBAL_LOGGING_STATE.get_or_init(|| Mutex::new(GlobalLoggingState::default()));

        let mut state = state_mutex
            .lock()
            .map_err(|_| anyhow::anyhow!("日志状态锁已损坏"))?;

        if state.initialized {
            if let Some(e) = &state.init_error {
                return Err(anyhow::anyhow!("日志系统之前初始化失败: {}", e));
            }
            return Ok(Self { config });
        }

        let init_result = Self::perform_initialization(&config);
        state.initialized = true;
        state.init_error = init_result.as_ref().err().map(|e| e.to_string());

        init_result?;
        Ok(Self { config })
    }

    /// 当前句柄使用的配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// 执行实际的日志系统初始化
    fn perform_initialization(config: &LogConfig) -> anyhow::Result<()> {
        // log crate 到 tracing 的桥接
        Self::init_log_tracer()?;
        Self::init_tracing_subscriber(config)?;
        Ok(())
    }

    /// 初始化 LogTracer
    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

        let result = LOG_TRACER_INIT.get_or_init(|| LogTracer::init().map_err(|e| e.to_string()));

        result
            .as_ref()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;
        Ok(())
    }

    /// 构建环境过滤器：RUST_LOG 优先，其次是配置的级别和模块级别
    fn build_env_filter(config: &LogConfig) -> EnvFilter {
        let mut env_filter = EnvFilter::from_default_env()
            .add_directive(Self::convert_level_to_directive(config.level));

        for (module, level) in &config.module_levels {
            match format!("{}={}", module, Self::level_to_string(*level)).parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(e) => eprintln!("忽略无效的模块日志级别 {module}: {e}"),
            }
        }

        env_filter
    }

    /// 构建输出层
    fn format_layer<S, W>(
        json_format: bool,
        writer: W,
        ansi: bool,
    ) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        if json_format {
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_file(true)
                .with_line_number(true)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(writer)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_ansi(ansi)
                .with_target(false)
                .boxed()
        }
    }

    /// 初始化 tracing subscriber
    ///
    /// 未配置日志文件时写到标准错误，标准输出留给检测结果。
    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        let env_filter = Self::build_env_filter(config);

        let output_layer = match &config.file_path {
            Some(file_path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(file_path)
                    .map_err(|e| {
                        anyhow::anyhow!("打开日志文件 {} 失败: {}", file_path.display(), e)
                    })?;
                Self::format_layer(config.json_format, Mutex::new(file), false)
            }
            None => Self::format_layer(config.json_format, std::io::stderr, true),
        };

        match registry().with(env_filter).with(output_layer).try_init() {
            Ok(()) => {
                tracing::debug!("日志系统初始化完成: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains(
                    "attempted to set a logger after the logging system was already initialized",
                ) || error_msg.contains("a global default trace dispatcher has already been set")
                {
                    // LogTracer 已提前安装，或已有全局 subscriber（例如测试中重复初始化）
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!(
                        "tracing subscriber初始化失败: {}",
                        error_msg
                    ))
                }
            }
        }
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> tracing_subscriber::filter::Directive {
        use tracing_subscriber::filter::{Directive, LevelFilter as TracingLevel};
        match level {
            LevelFilter::Off => Directive::from(TracingLevel::OFF),
            LevelFilter::Error => Directive::from(tracing::Level::ERROR),
            LevelFilter::Warn => Directive::from(tracing::Level::WARN),
            LevelFilter::Info => Directive::from(tracing::Level::INFO),
            LevelFilter::Debug => Directive::from(tracing::Level::DEBUG),
            LevelFilter::Trace => Directive::from(tracing::Level::TRACE),
        }
    }

    /// 将 log::LevelFilter 转换为字符串
    fn level_to_string(level: LevelFilter) -> &'static str {
        match level {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        }
    }

    /// 重置日志系统状态（主要用于测试）
    #[cfg(test)]
    fn reset_for_testing() {
        if let Some(state_mutex) = GLOBAL_LOGGING_STATE.get() {
            if let Ok(mut state) = state_mutex.lock() {
                *state = GlobalLoggingState::default();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_from_level_name() {
        assert_eq!(LogConfig::from_level_name("debug").level, LevelFilter::Debug);
        assert_eq!(LogConfig::from_level_name("WARN").level, LevelFilter::Warn);
        assert_eq!(LogConfig::from_level_name("bogus").level, LevelFilter::Info);
    }

    #[test]
    fn test_from_global_config() {
        let global = GlobalConfig {
            log_level: "warn".to_string(),
            log_file: Some(PathBuf::from("netwatch.log")),
            log_modules: HashMap::from([
                ("netwatch::checks".to_string(), "debug".to_string()),
                ("hyper".to_string(), "nonsense".to_string()),
            ]),
            ..Default::default()
        };

        let config = LogConfig::from_global(&global);

        assert_eq!(config.level, LevelFilter::Warn);
        assert_eq!(config.file_path, Some(PathBuf::from("netwatch.log")));
        assert!(!config.json_format);
        assert_eq!(
            config.module_levels,
            HashMap::from([("netwatch::checks".to_string(), LevelFilter::Debug)])
        );
    }

    #[test]
    #[serial]
    fn test_logging_system_single_initialization() {
        LoggingSystem::reset_for_testing();

        let first = LoggingSystem::setup_logging(LogConfig::default());
        assert!(first.is_ok());

        // 第二次初始化不会重复安装 subscriber
        let second = LoggingSystem::setup_logging(LogConfig::from_level_name("debug"));
        assert_eq!(second.unwrap().config().level, LevelFilter::Debug);
    }

    #[test]
    #[serial]
    fn test_logging_system_with_file_output() {
        LoggingSystem::reset_for_testing();

        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("netwatch.log");
        let config = LogConfig {
            file_path: Some(log_path.clone()),
            ..Default::default()
        };

        assert!(LoggingSystem::setup_logging(config).is_ok());
        assert!(log_path.exists());
    }

    #[test]
    #[serial]
    fn test_logging_system_unwritable_file_is_reported() {
        LoggingSystem::reset_for_testing();

        let dir = TempDir::new().unwrap();
        let config = LogConfig {
            file_path: Some(dir.path().join("missing").join("netwatch.log")),
            ..Default::default()
        };

        let err = LoggingSystem::setup_logging(config).unwrap_err();
        assert!(err.to_string().contains("打开日志文件"));

        // 失败状态会被记住
        assert!(LoggingSystem::setup_logging(LogConfig::default()).is_err());
        LoggingSystem::reset_for_testing();
    }

    #[test]
    #[serial]
    fn test_logging_system_with_json_format() {
        LoggingSystem::reset_for_testing();

        let config = LogConfig {
            json_format: true,
            ..Default::default()
        };

        let system = LoggingSystem::setup_logging(config).unwrap();
        assert!(system.config().json_format);
    }

    #[test]
    fn test_module_level_filter() {
        let config = LogConfig {
            module_levels: HashMap::from([("netwatch::checks".to_string(), LevelFilter::Debug)]),
            ..Default::default()
        };

        let filter = LoggingSystem::build_env_filter(&config);
        assert!(filter.to_string().contains("netwatch::checks"));
    }
}
