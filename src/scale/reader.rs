// ==========================================
// 地磅称重系统 - 仪表读数器
// ==========================================
// ManualScaleReader: 手工/模拟仪表，返回录入值
// TcpScaleReader: 连接仪表 TCP 输出，读取一行并解析
// ConnectionScaleReader: 按地磅连接方式分派
// ==========================================

use crate::config::{WeighbridgeConfigReader, DEFAULT_SCALE_TCP_TIMEOUT_MS};
use crate::domain::master_data::{ScaleConnection, WeighingScale};
use crate::scale::error::{ScaleError, ScaleResult};
use crate::scale::frame::parse_weight_frame;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

// ==========================================
// ScaleReader Trait
// ==========================================
#[async_trait]
pub trait ScaleReader: Send + Sync {
    /// 读取当前重量（KG）
    async fn read_weight(&self, scale: &WeighingScale) -> ScaleResult<f64>;
}

// ==========================================
// ManualScaleReader
// ==========================================
pub struct ManualScaleReader;

#[async_trait]
impl ScaleReader for ManualScaleReader {
    async fn read_weight(&self, scale: &WeighingScale) -> ScaleResult<f64> {
        match &scale.connection {
            ScaleConnection::Manual { weight_kg } => Ok(*weight_kg),
            other => Err(ScaleError::Misconfigured(format!(
                "{} 不是手工仪表 ({})",
                scale.name,
                other.kind()
            ))),
        }
    }
}

// ==========================================
// TcpScaleReader
// ==========================================
pub struct TcpScaleReader {
    timeout: Duration,
}

impl TcpScaleReader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn read_frame(address: &str) -> ScaleResult<String> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| ScaleError::ConnectFailed {
                address: address.to_string(),
                message: e.to_string(),
            })?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(ScaleError::NoData);
        }
        Ok(line)
    }
}

#[async_trait]
impl ScaleReader for TcpScaleReader {
    async fn read_weight(&self, scale: &WeighingScale) -> ScaleResult<f64> {
        let (host, port) = match &scale.connection {
            ScaleConnection::Tcp { host, port } => (host, *port),
            other => {
                return Err(ScaleError::Misconfigured(format!(
                    "{} 不是 TCP 仪表 ({})",
                    scale.name,
                    other.kind()
                )))
            }
        };
        let address = format!("{}:{}", host, port);

        let frame = tokio::time::timeout(self.timeout, Self::read_frame(&address))
            .await
            .map_err(|_| ScaleError::Timeout {
                address: address.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        tracing::debug!(scale = %scale.scale_id, frame = %frame.trim(), "收到仪表读数帧");
        parse_weight_frame(&frame)
    }
}

// ==========================================
// ConnectionScaleReader - 按连接方式分派
// ==========================================
pub struct ConnectionScaleReader {
    config: Arc<dyn WeighbridgeConfigReader>,
}

impl ConnectionScaleReader {
    pub fn new(config: Arc<dyn WeighbridgeConfigReader>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ScaleReader for ConnectionScaleReader {
    async fn read_weight(&self, scale: &WeighingScale) -> ScaleResult<f64> {
        match &scale.connection {
            ScaleConnection::Manual { .. } => ManualScaleReader.read_weight(scale).await,
            ScaleConnection::Tcp { .. } => {
                let timeout_ms = match self.config.get_scale_tcp_timeout_ms().await {
                    Ok(ms) => ms,
                    Err(e) => {
                        tracing::warn!(
                            scale = %scale.name,
                            error = %e,
                            default = DEFAULT_SCALE_TCP_TIMEOUT_MS,
                            "仪表超时配置读取失败，使用默认值"
                        );
                        DEFAULT_SCALE_TCP_TIMEOUT_MS
                    }
                };
                TcpScaleReader::new(Duration::from_millis(timeout_ms))
                    .read_weight(scale)
                    .await
            }
        }
    }
}
