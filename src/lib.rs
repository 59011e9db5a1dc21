// ==========================================
// 地磅称重系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + Tokio
// 系统定位: 毛重/皮重采集，净重回写入库/出库单
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 状态机与核对规则
pub mod engine;

// 仪表层 - 地磅实时读数
pub mod scale;

// 导入层 - 车辆档案
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    DeliveryStatus, LocationUsage, OrderKind, OrderState, PickingState, PickingType,
    WeighingState,
};

// 领域实体
pub use domain::{
    ActionLog, ActionType, CreateWeighingRequest, StockMove, StockMoveLine, StockPicking,
    TradeOrder, TradeOrderLine, Truck, WeighingFilter, WeighingRecord, WeighingScale,
};

// 引擎
pub use engine::{
    compute_net_weight, OrderLinker, ReconciliationEngine, WeighingError, WeighingLifecycleEngine,
};

// API
pub use api::{ApiError, ApiResult, DashboardApi, WeighingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "地磅称重系统";
