// ==========================================
// FuelEU 合规系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/Engine错误为用户可读的错误消息
// 分类: 业务/校验错误（客户端错误） vs 基础设施错误（内部错误）
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无可用数据: {0}")]
    NoData(String),

    #[error("重复存储: {0}")]
    AlreadyBanked(String),

    #[error("无盈余可存储: {0}")]
    NoSurplus(String),

    #[error("无赤字可抵扣: {0}")]
    NoDeficit(String),

    #[error("存储余额不足: 请求 {requested}, 可用 {available}")]
    InsufficientBanked { requested: f64, available: f64 },

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("重复入池: {0}")]
    AlreadyPooled(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NoData(_) => "NO_DATA",
            ApiError::AlreadyBanked(_) => "ALREADY_BANKED",
            ApiError::NoSurplus(_) => "NO_SURPLUS",
            ApiError::NoDeficit(_) => "NO_DEFICIT",
            ApiError::InsufficientBanked { .. } => "INSUFFICIENT_BANKED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::AlreadyPooled(_) => "ALREADY_POOLED",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }

    /// 是否为客户端错误（业务规则/输入校验）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::NoData(_)
                | ApiError::AlreadyBanked(_)
                | ApiError::NoSurplus(_)
                | ApiError::NoDeficit(_)
                | ApiError::InsufficientBanked { .. }
                | ApiError::NotFound(_)
                | ApiError::ValidationError(_)
                | ApiError::AlreadyPooled(_)
        )
    }

    /// 转换配置层错误
    ///
    /// 计划表校验失败时配置层返回 EngineError，其余归为内部错误
    pub fn from_config(err: Box<dyn std::error::Error>) -> Self {
        match err.downcast::<EngineError>() {
            Ok(engine_err) => ApiError::from(*engine_err),
            Err(other) => ApiError::InternalError(format!("配置读取失败: {}", other)),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        if err.is_unique_violation_on("bank_entry") {
            return ApiError::AlreadyBanked(err.to_string());
        }
        if err.is_unique_violation_on("pool_member") {
            return ApiError::AlreadyPooled(err.to_string());
        }

        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::ValidationError(format!("检查约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NoRoutes | EngineError::ZeroEnergy => ApiError::NoData(err.to_string()),
            EngineError::InvalidSchedule(msg) => {
                ApiError::InternalError(format!("目标强度表配置无效: {}", msg))
            }
            EngineError::NonPositiveAmount(_) | EngineError::ZeroBaseline | EngineError::Invalid(_) => {
                ApiError::ValidationError(err.to_string())
            }
            EngineError::InsufficientBanked {
                requested,
                available,
            } => ApiError::InsufficientBanked {
                requested,
                available,
            },
            EngineError::NoSurplus(balance) => {
                ApiError::NoSurplus(format!("当前余额 {}", balance))
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// ErrorResponse - 错误响应（返回给调用方）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 是否客户端错误
    pub client_error: bool,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        ErrorResponse {
            code: err.code().to_string(),
            message: err.to_string(),
            client_error: err.is_client_error(),
            details: match err {
                ApiError::InsufficientBanked {
                    requested,
                    available,
                } => Some(serde_json::json!({
                    "requested": requested,
                    "available": available,
                })),
                _ => None,
            },
        }
    }
}

/// 将ApiError转换为JSON字符串
pub fn map_api_error(err: &ApiError) -> String {
    serde_json::to_string(&ErrorResponse::from(err)).unwrap_or_else(|_| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Route".to_string(),
            id: "R009".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Route"));
                assert!(msg.contains("R009"));
            }
            _ => panic!("Expected NotFound"),
        }

        let dup = RepositoryError::UniqueConstraintViolation(
            "UNIQUE constraint failed: bank_entry.ship_id, bank_entry.year".to_string(),
        );
        assert!(matches!(ApiError::from(dup), ApiError::AlreadyBanked(_)));

        let dup = RepositoryError::UniqueConstraintViolation(
            "UNIQUE constraint failed: pool_member.ship_id, pool_member.year".to_string(),
        );
        assert!(matches!(ApiError::from(dup), ApiError::AlreadyPooled(_)));
    }

    #[test]
    fn test_engine_error_conversion() {
        assert!(matches!(ApiError::from(EngineError::NoRoutes), ApiError::NoData(_)));
        assert!(matches!(
            ApiError::from(EngineError::InsufficientBanked {
                requested: 2.0,
                available: 1.0
            }),
            ApiError::InsufficientBanked { .. }
        ));
        let internal = ApiError::from(EngineError::InvalidSchedule("x".to_string()));
        assert!(!internal.is_client_error());
    }

    #[test]
    fn test_config_error_conversion() {
        let boxed: Box<dyn std::error::Error> =
            Box::new(EngineError::InvalidSchedule("年度未递增".to_string()));
        let err = ApiError::from_config(boxed);
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(err.to_string().contains("年度未递增"));

        let boxed: Box<dyn std::error::Error> = "no such table".into();
        assert!(matches!(ApiError::from_config(boxed), ApiError::InternalError(_)));
    }

    #[test]
    fn test_error_response_envelope() {
        let err = ApiError::InsufficientBanked {
            requested: 10.0,
            available: 4.0,
        };
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.code, "INSUFFICIENT_BANKED");
        assert!(resp.client_error);
        assert_eq!(resp.details.unwrap()["available"], 4.0);

        let json = map_api_error(&ApiError::DatabaseError("boom".to_string()));
        let parsed: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.code, "DATABASE_ERROR");
        assert!(!parsed.client_error);
    }
}
