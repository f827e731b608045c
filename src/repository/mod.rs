// ==========================================
// FuelEU 合规系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 事务: 写操作均提供 *_tx(&Connection, ..) 形式，由 UnitOfWork 组合
// ==========================================

pub mod action_log_repo;
pub mod bank_entry_repo;
pub mod compliance_repo;
pub mod error;
pub mod pool_repo;
pub mod route_repo;
pub mod sql_codec;
pub mod unit_of_work;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use bank_entry_repo::BankEntryRepository;
pub use compliance_repo::ShipComplianceRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use pool_repo::PoolRepository;
pub use route_repo::RouteRepository;
pub use unit_of_work::UnitOfWork;
