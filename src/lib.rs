// ==========================================
// FuelEU 合规系统 - 核心库
// ==========================================
// 职责: 船舶年度 GHG 强度合规余额计算、盈余存储 (Banking) 与联营 (Pooling)
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 纯计算规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 数据仓储层 - 数据访问
pub mod repository;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ComplianceStatus, FuelType, VesselType};

// 领域实体
pub use domain::{ActionLog, ActionType, BankEntry, Pool, PoolMember, Route, ShipCompliance};

// 引擎
pub use engine::{BankLedger, ComplianceCalculator, PoolAllocator, TargetSchedule};

// API
pub use api::{ApiError, BankingApi, ComplianceApi, PoolApi, RouteApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "FuelEU 合规系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
