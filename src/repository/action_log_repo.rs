// ==========================================
// 地磅称重系统 - 操作日志数据仓储
// ==========================================
// 红线: 所有状态变更必须记录
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
