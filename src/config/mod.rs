// ==========================================
// 地磅称重系统 - 配置层
// ==========================================
// 职责: 库位、核对容差、仪表超时等系统配置
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod weighbridge_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_SCALE_TCP_TIMEOUT_MS};
pub use weighbridge_config_trait::WeighbridgeConfigReader;
