// ==========================================
// 地磅称重系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供命令行调用
// ==========================================

pub mod config_api;
pub mod dashboard_api;
pub mod error;
pub mod import_api;
pub mod weighing_api;

// 重导出核心类型
pub use config_api::ConfigApi;
pub use dashboard_api::{
    DashboardApi, DashboardData, OrderLineWeighingSummary, OrderOverview, OrderWeighingSummary,
    OverviewData, PendingWeighing, PickingOverview, PickingWeighingSummary,
};
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
pub use weighing_api::{InventoryUpdate, LinkedDocument, WeighingApi};
