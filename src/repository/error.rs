// ==========================================
// FuelEU 合规系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 约束失败按 SQLite 错误消息分类（UNIQUE / FOREIGN KEY / CHECK）
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("检查约束违反: {0}")]
    CheckConstraintViolation(String),

    // ===== 数据质量错误 =====
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else if msg.contains("CHECK") {
                    RepositoryError::CheckConstraintViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            rusqlite::Error::FromSqlConversionFailure(idx, _, inner) => {
                RepositoryError::FieldValueError {
                    field: format!("column#{}", idx),
                    message: inner.to_string(),
                }
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl RepositoryError {
    /// 是否为指定表的唯一约束冲突
    ///
    /// SQLite 消息形如 `UNIQUE constraint failed: bank_entry.ship_id, bank_entry.year`
    pub fn is_unique_violation_on(&self, table: &str) -> bool {
        match self {
            RepositoryError::UniqueConstraintViolation(msg) => {
                msg.contains(&format!("{}.", table))
            }
            _ => false,
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_classifies_unique_and_check() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (a INTEGER UNIQUE, b REAL CHECK (b >= 0));
             INSERT INTO t (a, b) VALUES (1, 1.0);",
        )
        .unwrap();

        let dup: RepositoryError = conn
            .execute("INSERT INTO t (a, b) VALUES (1, 2.0)", [])
            .unwrap_err()
            .into();
        assert!(dup.is_unique_violation_on("t"));
        assert!(!dup.is_unique_violation_on("bank_entry"));

        let neg: RepositoryError = conn
            .execute("INSERT INTO t (a, b) VALUES (2, -1.0)", [])
            .unwrap_err()
            .into();
        assert!(matches!(neg, RepositoryError::CheckConstraintViolation(_)));
    }
}
