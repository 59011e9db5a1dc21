// ==========================================
// 地磅称重系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod master_data_repo;
pub mod order_repo;
pub mod picking_repo;
pub mod scale_repo;
pub mod sequence_repo;
pub mod weighing_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use master_data_repo::MasterDataRepository;
pub use order_repo::OrderRepository;
pub use picking_repo::PickingRepository;
pub use scale_repo::ScaleRepository;
pub use sequence_repo::SequenceRepository;
pub use weighing_repo::{DoneStats, WeighingRepository};
