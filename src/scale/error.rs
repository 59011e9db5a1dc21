// ==========================================
// 地磅称重系统 - 仪表读数错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaleError {
    #[error("仪表连接失败 ({address}): {message}")]
    ConnectFailed { address: String, message: String },

    #[error("仪表读数超时 ({address}, {timeout_ms}ms)")]
    Timeout { address: String, timeout_ms: u64 },

    #[error("仪表连接已关闭，未收到数据")]
    NoData,

    #[error("读数不稳定: {frame}")]
    Unstable { frame: String },

    #[error("无法解析读数: {frame}")]
    InvalidFrame { frame: String },

    #[error("仪表配置错误: {0}")]
    Misconfigured(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ScaleResult<T> = Result<T, ScaleError>;
