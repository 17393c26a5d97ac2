//! Web服务器实现
//!
//! 绑定监听地址并运行 API 路由，收到关闭信号后优雅退出

use super::{create_router, AppState};
use crate::config::WebConfig;
use crate::error::{NetwatchError, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

/// Web服务器
pub struct WebServer {
    /// 配置
    config: WebConfig,
    /// 关闭信号接收器
    shutdown_rx: Option<broadcast::Receiver<()>>,
}

impl WebServer {
    /// 创建新的Web服务器
    pub fn new(config: WebConfig, shutdown_rx: broadcast::Receiver<()>) -> Self {
        Self {
            config,
            shutdown_rx: Some(shutdown_rx),
        }
    }

    /// 监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.config
            .socket_addr()
            .map_err(|e| NetwatchError::Other(anyhow::anyhow!(e)))
    }

    /// 绑定监听端口
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.socket_addr()?;
        Ok(TcpListener::bind(addr).await?)
    }

    /// 启动Web服务器，直到收到关闭信号
    pub async fn start(&mut self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// 在已绑定的监听器上运行
    pub async fn serve(&mut self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self
            .shutdown_rx
            .take()
            .ok_or_else(|| NetwatchError::Other(anyhow::anyhow!("关闭信号接收器已被使用")))?;

        let state = AppState::new()?;
        let addr = listener.local_addr()?;
        info!("Web服务器已启动: http://{}", addr);
        info!("检测接口: POST http://{}/check", addr);

        axum::serve(listener, create_router(state))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("接收到关闭信号，正在关闭Web服务器...");
            })
            .await?;

        info!("Web服务器已关闭");
        Ok(())
    }
}
