// ==========================================
// FuelEU 合规系统 - 事务单元
// ==========================================
// 职责: 把多步写入包成一个 SQLite 事务（Ok 提交 / Err 回滚）
// 约束: 闭包内只能使用各仓储的 *_tx 关联函数，
//       不能调用持有锁的仓储方法（同一把 Mutex，会死锁）
// ==========================================

use crate::repository::error::RepositoryError;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub struct UnitOfWork {
    conn: Arc<Mutex<Connection>>,
}

impl UnitOfWork {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 在单个事务中执行闭包
    ///
    /// # 返回
    /// - Ok: 闭包成功且提交成功
    /// - Err: 闭包错误（已回滚）或事务错误
    pub fn run<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        match work(&*tx) {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!(error = %rollback_err, "事务回滚失败");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::error::RepositoryResult;

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL)").unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn count(conn: &Arc<Mutex<Connection>>) -> i64 {
        conn.lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit_on_ok() {
        let conn = setup();
        let uow = UnitOfWork::new(conn.clone());
        let result: RepositoryResult<()> = uow.run(|c| {
            c.execute("INSERT INTO t (v) VALUES (1)", [])?;
            c.execute("INSERT INTO t (v) VALUES (2)", [])?;
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(count(&conn), 2);
    }

    #[test]
    fn test_rollback_on_err() {
        let conn = setup();
        let uow = UnitOfWork::new(conn.clone());
        let result: RepositoryResult<()> = uow.run(|c| {
            c.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Err(RepositoryError::ValidationError("后续步骤失败".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(count(&conn), 0);
    }
}
