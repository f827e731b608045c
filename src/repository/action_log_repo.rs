// ==========================================
// FuelEU 合规系统 - 操作日志数据仓储
// ==========================================
// 依据: v0.1_init.sql action_log 表
// 红线: 所有写入必须记录
// ==========================================

mod core;
mod queries;


pub use self::core::ActionLogRepository;
