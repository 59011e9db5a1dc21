// ==========================================
// 地磅称重系统 - 仪表读数层
// ==========================================
// 职责: 读取地磅当前重量（只读，不改变称重状态）
// ==========================================

pub mod error;
pub mod frame;
pub mod reader;

pub use error::{ScaleError, ScaleResult};
pub use frame::parse_weight_frame;
pub use reader::{ConnectionScaleReader, ManualScaleReader, ScaleReader, TcpScaleReader};
