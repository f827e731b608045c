// ==========================================
// FuelEU 合规系统 - API 层
// ==========================================
// 职责: 编排校验、计算与持久化，供命令行入口调用
// ==========================================

pub mod banking_api;
pub mod compliance_api;
pub mod dto;
pub mod error;
pub mod pool_api;
pub mod route_api;
pub mod validator;

// 重导出核心类型
pub use banking_api::BankingApi;
pub use compliance_api::ComplianceApi;
pub use dto::{
    AdjustedComplianceBalanceResult, ApplyBankingResult, BankSummary, BankingRecord,
    BankingResult, ComparisonRoute, ComplianceBalanceResult, PoolCreationResult,
    PoolMemberResult, PoolSummary, RouteComparisonResult, RouteInput,
};
pub use error::{map_api_error, ApiError, ApiResult, ErrorResponse};
pub use pool_api::PoolApi;
pub use route_api::RouteApi;
pub use validator::YearRange;
