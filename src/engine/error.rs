// ==========================================
// FuelEU 合规系统 - 引擎层错误类型
// ==========================================
// 职责: 纯计算错误，不含持久化语义
// 映射: 由 api::error 转换为 ApiError
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    // ===== 合规计算 =====
    #[error("没有可用于计算的航线数据")]
    NoRoutes,

    #[error("航线总能量为零，无法计算实际强度")]
    ZeroEnergy,

    // ===== 目标强度表 =====
    #[error("目标强度表无效: {0}")]
    InvalidSchedule(String),

    // ===== 存储台账 =====
    #[error("动用金额必须为正: {0}")]
    NonPositiveAmount(f64),

    #[error("存储余额不足: 请求 {requested}, 可用 {available}")]
    InsufficientBanked { requested: f64, available: f64 },

    #[error("存储余额必须为正: {0}")]
    NoSurplus(f64),

    // ===== 对比 =====
    #[error("基线强度为零，无法计算百分比差异")]
    ZeroBaseline,

    #[error("{0}")]
    Invalid(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
