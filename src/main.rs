//! netwatch 主程序入口

use anyhow::{Context, Result};
use clap::Parser;
use netwatch::cli::{command_for, Args};
use netwatch::config::{Config, TomlConfigLoader};
use netwatch::logging::{LogConfig, LoggingSystem};
use tracing::{debug, error};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 加载配置
    let config = if args.command.needs_config() {
        TomlConfigLoader::new(true)
            .load_or_default(args.config.as_deref())
            .await
            .context("加载配置失败")?
    } else {
        Config::default()
    };

    // 初始化日志系统，命令行参数优先
    let mut log_config = LogConfig::from_global(&config.global);
    if let Some(level) = args.log_level.clone() {
        log_config.level = level.into();
    }
    if let Some(log_file) = args.log_file.clone() {
        log_config.file_path = Some(log_file);
    }
    log_config.json_format = args.json_logs;

    let logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    debug!(
        "netwatch v{} 启动，日志级别 {}",
        netwatch::VERSION,
        logging_system.config().level
    );

    // 执行命令
    match command_for(&args.command).execute(&args, &config).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("命令执行失败: {}", e);
            std::process::exit(1);
        }
    }
}
