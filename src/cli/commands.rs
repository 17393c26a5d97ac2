//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑。`execute` 返回 `Ok(false)` 表示检测未通过，
//! 由调用方决定退出码。

use crate::checks::{CheckResult, Dispatcher};
use crate::cli::args::{Args, CheckOptions, Commands, OutputFormat, ProbeArgs};
use crate::config::{
    is_valid_timeout, Config, ConfigLoader, TomlConfigLoader, MAX_TIMEOUT_SECONDS,
    MIN_TIMEOUT_SECONDS,
};
use crate::error::{ConfigError, Result};
use crate::web::WebServer;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args, config: &Config) -> Result<bool>;
}

/// 根据子命令选择处理器
pub fn command_for(command: &Commands) -> Box<dyn Command> {
    match command {
        Commands::Check { .. } => Box::new(CheckCommand),
        Commands::Targets { .. } => Box::new(TargetsCommand),
        Commands::Serve { .. } => Box::new(ServeCommand),
        Commands::Validate { .. } => Box::new(ValidateCommand),
        Commands::Version { .. } => Box::new(VersionCommand),
    }
}

/// 解析检测超时：命令行优先，其次是配置文件
pub fn resolve_timeout(options: &CheckOptions, config: &Config) -> Result<Duration> {
    let seconds = options.timeout.unwrap_or(config.global.timeout_seconds);
    if !is_valid_timeout(seconds) {
        return Err(ConfigError::ValidationError(format!(
            "超时时间 {} 超出范围 {}-{} 秒",
            seconds, MIN_TIMEOUT_SECONDS, MAX_TIMEOUT_SECONDS
        ))
        .into());
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// 格式化单条检测结果（文本格式）
pub fn format_result_line(result: &CheckResult) -> String {
    let marker = if result.success { "✓" } else { "✗" };
    let target = &result.target;
    let endpoint = match target.port {
        Some(port) => format!("{}:{}", target.host, port),
        None => target.host.clone(),
    };
    let latency = result
        .latency_ms
        .map(|ms| format!(" {ms:.2}ms"))
        .unwrap_or_default();

    format!(
        "{} {} [{} {}]{} - {}",
        marker, target.name, target.check_type, endpoint, latency, result.message
    )
}

/// 按指定格式输出检测结果
fn print_results(results: &[CheckResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            if let [single] = results {
                println!("{}", single.to_json()?);
            } else {
                println!("{}", serde_json::to_string_pretty(results)?);
            }
        }
        OutputFormat::Text => {
            for result in results {
                println!("{}", format_result_line(result));
            }
        }
    }
    Ok(())
}

/// 单次检测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args, config: &Config) -> Result<bool> {
        let Commands::Check { probe } = &args.command else {
            return Ok(true);
        };

        let options = probe.options();
        let timeout = resolve_timeout(options, config)?;

        let dispatcher = Dispatcher::new()?;

        let result = match probe {
            ProbeArgs::Ping { host, .. } => dispatcher.check_ping(host, timeout).await,
            ProbeArgs::Tcp { host, port, .. } => dispatcher.check_tcp(host, *port, timeout).await,
            ProbeArgs::Http { url, .. } => dispatcher.check_http(url, timeout).await?,
        };

        print_results(std::slice::from_ref(&result), options.format)?;
        Ok(result.success)
    }
}

/// 批量检测命令：依次检测所有目标
pub struct TargetsCommand;

#[async_trait]
impl Command for TargetsCommand {
    async fn execute(&self, args: &Args, config: &Config) -> Result<bool> {
        let Commands::Targets { options } = &args.command else {
            return Ok(true);
        };

        let timeout = resolve_timeout(options, config)?;
        let dispatcher = Dispatcher::new()?.with_timeout(timeout);
        let targets = config.effective_targets();

        info!("开始检测 {} 个目标", targets.len());
        if options.format == OutputFormat::Text {
            println!("检测时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        }

        let mut results = Vec::with_capacity(targets.len());
        for target in &targets {
            results.push(dispatcher.run_check(target).await);
        }

        print_results(&results, options.format)?;

        let failed = results.iter().filter(|r| !r.success).count();
        if options.format == OutputFormat::Text {
            println!();
            println!(
                "共 {} 个目标，成功 {}，失败 {}",
                results.len(),
                results.len() - failed,
                failed
            );
        }

        Ok(failed == 0)
    }
}

/// HTTP API 服务命令
pub struct ServeCommand;

#[async_trait]
impl Command for ServeCommand {
    async fn execute(&self, args: &Args, config: &Config) -> Result<bool> {
        let Commands::Serve { bind, port } = &args.command else {
            return Ok(true);
        };

        let mut web_config = config.web.clone();
        if let Some(bind) = bind {
            web_config.bind_address = bind.clone();
        }
        if let Some(port) = port {
            web_config.port = *port;
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("接收到 Ctrl+C 信号"),
                Err(e) => error!("监听关闭信号失败: {}", e),
            }
            let _ = shutdown_tx.send(());
        });

        let mut server = WebServer::new(web_config, shutdown_rx);
        server.start().await?;
        Ok(true)
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args, _config: &Config) -> Result<bool> {
        let Commands::Validate { config_path } = &args.command else {
            return Ok(true);
        };

        let config_file = config_path
            .clone()
            .or_else(|| args.config.clone())
            .unwrap_or_else(crate::config::get_default_config_path);

        self.validate_config_file(&config_file).await?;
        Ok(true)
    }
}

impl ValidateCommand {
    /// 验证配置文件
    async fn validate_config_file(&self, config_path: &Path) -> Result<()> {
        println!("验证配置文件: {}", config_path.display());

        let loader = TomlConfigLoader::new(true);
        let config = loader.load_from_file(config_path).await?;

        println!("✓ 配置文件验证通过");
        println!("  检测超时: {}秒", config.global.timeout_seconds);
        println!("  日志级别: {}", config.global.log_level);
        println!("  API 地址: {}:{}", config.web.bind_address, config.web.port);

        if config.targets.is_empty() {
            println!(
                "✓ 未配置检测目标，将使用 {} 个内置目标",
                config.effective_targets().len()
            );
        } else {
            println!("✓ 找到 {} 个检测目标", config.targets.len());
            for (i, target) in config.targets.iter().enumerate() {
                println!(
                    "  {}. {} ({} {})",
                    i + 1,
                    target.name,
                    target.check_type,
                    target.host
                );
            }
        }

        Ok(())
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args, _config: &Config) -> Result<bool> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckType, Target};
    use clap::Parser;

    #[test]
    fn test_resolve_timeout() {
        let config = Config::default();
        let options = CheckOptions {
            timeout: None,
            format: OutputFormat::Text,
        };
        assert_eq!(resolve_timeout(&options, &config).unwrap(), Duration::from_secs(5));

        let options = CheckOptions {
            timeout: Some(0.5),
            format: OutputFormat::Text,
        };
        assert_eq!(
            resolve_timeout(&options, &config).unwrap(),
            Duration::from_millis(500)
        );

        let options = CheckOptions {
            timeout: Some(0.0),
            format: OutputFormat::Text,
        };
        assert!(resolve_timeout(&options, &config).is_err());
    }

    #[test]
    fn test_format_result_line() {
        let target = Target::new("SSH Prod", "example.com", CheckType::Tcp).with_port(22);
        let ok = CheckResult::new(target.clone(), true, Some(12.345), "TCP connection successful");
        assert_eq!(
            format_result_line(&ok),
            "✓ SSH Prod [tcp example.com:22] 12.35ms - TCP connection successful"
        );

        let failed = CheckResult::failure(target, "TCP error: connection refused");
        assert_eq!(
            format_result_line(&failed),
            "✗ SSH Prod [tcp example.com:22] - TCP error: connection refused"
        );
    }

    #[tokio::test]
    async fn test_check_command_tcp() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        let args = Args::try_parse_from(["netwatch", "check", "tcp", "127.0.0.1", &port]).unwrap();

        let healthy = command_for(&args.command)
            .execute(&args, &Config::default())
            .await
            .unwrap();
        assert!(healthy);
    }

    #[tokio::test]
    async fn test_check_command_invalid_url() {
        let args = Args::try_parse_from(["netwatch", "check", "http", "ftp://host/"]).unwrap();

        let result = command_for(&args.command)
            .execute(&args, &Config::default())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_targets_command_reports_failure() {
        let config = Config {
            targets: vec![Target::new("No port", "127.0.0.1", CheckType::Tcp)],
            ..Default::default()
        };
        let args = Args::try_parse_from(["netwatch", "targets", "-f", "json"]).unwrap();

        let healthy = command_for(&args.command)
            .execute(&args, &config)
            .await
            .unwrap();
        assert!(!healthy);
    }
}
