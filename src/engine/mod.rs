// ==========================================
// FuelEU 合规系统 - 引擎层
// ==========================================
// 职责: 合规计算、存储台账、联营分配的纯规则实现
// 红线: Engine 不拼 SQL, 不做持久化
// ==========================================

pub mod bank_ledger;
pub mod comparison;
pub mod compliance_calculator;
pub mod error;
pub mod pool_allocator;
pub mod rounding;
pub mod target_schedule;

// 重导出核心引擎
pub use bank_ledger::{BankLedger, DrawDownPlan, EntryDraw};
pub use comparison::{meets_target, percent_diff};
pub use compliance_calculator::{ComplianceCalculator, ComplianceSnapshot, ENERGY_FACTOR};
pub use error::{EngineError, EngineResult};
pub use pool_allocator::{Allocation, AllocationSummary, MemberBalance, PoolAllocator};
pub use rounding::{round_balance, round_intensity, round_to};
pub use target_schedule::{TargetSchedule, DEFAULT_BASELINE_INTENSITY, DEFAULT_SCHEDULE};
