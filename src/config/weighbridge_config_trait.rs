// ==========================================
// 地磅称重系统 - 称重配置读取 Trait
// ==========================================
// 职责: 定义称重流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// WeighbridgeConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait WeighbridgeConfigReader: Send + Sync {
    // ===== 库位配置 =====

    /// 入库单来源库位
    ///
    /// # 默认值
    /// - LOC-SUPPLIER
    async fn get_incoming_src_location(&self) -> Result<String, Box<dyn Error>>;

    /// 入库单目的库位
    ///
    /// # 默认值
    /// - LOC-STOCK
    async fn get_incoming_dest_location(&self) -> Result<String, Box<dyn Error>>;

    /// 出库单来源库位
    ///
    /// # 默认值
    /// - LOC-STOCK
    async fn get_outgoing_src_location(&self) -> Result<String, Box<dyn Error>>;

    /// 客户未配置专属库位时的出库目的库位
    ///
    /// # 默认值
    /// - LOC-CUSTOMER
    async fn get_default_customer_location(&self) -> Result<String, Box<dyn Error>>;

    // ===== 核对配置 =====

    /// 超收/短收判定容差（KG）
    ///
    /// |净重 - 需求| <= 容差 视为相符
    ///
    /// # 默认值
    /// - 0.0
    async fn get_reconcile_tolerance_kg(&self) -> Result<f64, Box<dyn Error>>;

    // ===== 仪表配置 =====

    /// TCP 仪表读数超时（毫秒）
    ///
    /// # 默认值
    /// - 3000
    async fn get_scale_tcp_timeout_ms(&self) -> Result<u64, Box<dyn Error>>;
}
