// ==========================================
// FuelEU 合规系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、实体级业务规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod bank;
pub mod compliance;
pub mod ids;
pub mod pool;
pub mod route;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use bank::{BankEntry, BankEntryState};
pub use compliance::ShipCompliance;
pub use ids::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use pool::{Pool, PoolMember, MIN_POOL_MEMBERS};
pub use route::{Route, RouteFilter, MAX_COMPLIANCE_YEAR, MIN_COMPLIANCE_YEAR};
pub use types::{ComplianceStatus, FuelType, VesselType};
