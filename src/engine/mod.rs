// ==========================================
// 地磅称重系统 - 引擎层
// ==========================================
// 职责: 称重状态机、收发货核对、订单/单据关联
// 红线: Engine 不拼 SQL，拒绝必须给出原因
// ==========================================

pub mod error;
pub mod order_linker;
pub mod reconciliation;
pub mod weighing_lifecycle;

// 重导出核心引擎
pub use error::{WeighingError, WeighingResult};
pub use order_linker::{OrderLinker, PickingLocations};
pub use reconciliation::{classify_delivery, status_text, ReconciliationEngine, ReconciliationPlan};
pub use weighing_lifecycle::{compute_net_weight, WeighingLifecycleEngine};
