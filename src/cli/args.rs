//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// netwatch - 单次 ping / TCP / HTTP 可达性检测工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "netwatch",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "配置文件路径",
        env = "NETWATCH_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别，未指定时使用配置文件中的级别
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        help = "日志级别",
        env = "NETWATCH_LOG_LEVEL"
    )]
    pub log_level: Option<LogLevel>,

    /// 以JSON格式输出日志
    #[arg(long, global = true, help = "以JSON格式输出日志")]
    pub json_logs: bool,

    /// 日志文件路径，覆盖配置文件中的 `log_file`
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "日志文件路径",
        env = "NETWATCH_LOG_FILE"
    )]
    pub log_file: Option<PathBuf>,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 执行一次性检测
    Check {
        /// 检测类型及目标
        #[command(subcommand)]
        probe: ProbeArgs,
    },

    /// 依次检测配置中的所有目标（未配置时使用内置目标）
    Targets {
        /// 检测选项
        #[command(flatten)]
        options: CheckOptions,
    },

    /// 启动 HTTP API 服务
    Serve {
        /// 绑定地址
        #[arg(short, long, value_name = "ADDR", help = "绑定地址")]
        bind: Option<String>,

        /// 监听端口
        #[arg(short, long, value_name = "PORT", help = "监听端口")]
        port: Option<u16>,
    },

    /// 验证配置文件
    Validate {
        /// 配置文件路径
        #[arg(value_name = "FILE", help = "配置文件路径")]
        config_path: Option<PathBuf>,
    },

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },
}

/// 单次检测的目标
#[derive(Subcommand, Debug, Clone)]
pub enum ProbeArgs {
    /// ICMP ping 检测
    Ping {
        /// 主机名或IP
        host: String,

        #[command(flatten)]
        options: CheckOptions,
    },

    /// TCP 连接检测
    Tcp {
        /// 主机名或IP
        host: String,

        /// 端口
        port: u16,

        #[command(flatten)]
        options: CheckOptions,
    },

    /// HTTP GET 检测
    Http {
        /// 完整 URL（http 或 https）
        url: String,

        #[command(flatten)]
        options: CheckOptions,
    },
}

impl ProbeArgs {
    /// 检测选项
    pub fn options(&self) -> &CheckOptions {
        match self {
            ProbeArgs::Ping { options, .. }
            | ProbeArgs::Tcp { options, .. }
            | ProbeArgs::Http { options, .. } => options,
        }
    }
}

/// 检测相关的通用选项
#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct CheckOptions {
    /// 超时时间（秒），未指定时使用配置文件中的值
    #[arg(short, long, value_name = "SECONDS", help = "超时时间（秒）")]
    pub timeout: Option<f64>,

    /// 输出格式
    #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
    pub format: OutputFormat,
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
}

impl Commands {
    /// 该命令是否需要预先加载配置文件
    pub fn needs_config(&self) -> bool {
        !matches!(self, Commands::Validate { .. } | Commands::Version { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_check_tcp() {
        let args = Args::try_parse_from([
            "netwatch", "check", "tcp", "example.com", "22", "--timeout", "2.5", "-f", "json",
        ])
        .unwrap();

        match args.command {
            Commands::Check {
                probe: ProbeArgs::Tcp { host, port, options },
            } => {
                assert_eq!(host, "example.com");
                assert_eq!(port, 22);
                assert_eq!(options.timeout, Some(2.5));
                assert_eq!(options.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_options_after_subcommand() {
        let args = Args::try_parse_from([
            "netwatch", "targets", "--log-level", "debug", "--config", "netwatch.toml",
        ])
        .unwrap();

        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.config, Some(PathBuf::from("netwatch.toml")));
        assert!(args.command.needs_config());
    }

    #[test]
    fn test_parse_log_file() {
        let args =
            Args::try_parse_from(["netwatch", "serve", "--log-file", "/tmp/netwatch.log"]).unwrap();

        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/netwatch.log")));
    }

    #[test]
    fn test_check_http_requires_url() {
        assert!(Args::try_parse_from(["netwatch", "check", "http"]).is_err());
    }

    #[test]
    fn test_validate_does_not_preload_config() {
        let args = Args::try_parse_from(["netwatch", "validate", "custom.toml"]).unwrap();
        assert!(!args.command.needs_config());
    }
}
