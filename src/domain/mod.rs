// ==========================================
// 地磅称重系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod inventory;
pub mod master_data;
pub mod order;
pub mod types;
pub mod weighing;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType, TargetType};
pub use inventory::{
    PickingDetail, PickingToWeigh, QuantityWriteback, StockMove, StockMoveLine, StockPicking,
};
pub use master_data::{Operator, Partner, Product, ScaleConnection, StockLocation, Truck, WeighingScale};
pub use order::{OrderWithLines, TradeOrder, TradeOrderLine};
pub use types::{
    DeliveryStatus, LocationUsage, OrderKind, OrderState, PickingState, PickingType, WeighingState,
};
pub use weighing::{
    round_kg, CreateWeighingRequest, WeighingFilter, WeighingRecord, NEW_REFERENCE,
};
