// ==========================================
// FuelEU 合规系统 - 联营仓储
// ==========================================
// 红线: 联营只增不改
// 冲突: pool_member UNIQUE(ship_id, year) 保证每船每年至多一个联营
// ==========================================

use crate::domain::pool::{Pool, PoolMember};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_codec::{ts_from_db, ts_to_db};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// PoolRepository - 联营仓储
// ==========================================
pub struct PoolRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PoolRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find_by_id(&self, pool_id: &str) -> RepositoryResult<Option<Pool>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, pool_id)
    }

    /// 按年度查询（按创建时间排序）
    pub fn find_by_year(&self, year: i32) -> RepositoryResult<Vec<Pool>> {
        let conn = self.get_conn()?;
        let ids: Vec<String> = {
            let mut stmt =
                conn.prepare("SELECT id FROM pool WHERE year = ?1 ORDER BY created_at, id")?;
            let rows = stmt.query_map(params![year], |row| row.get::<_, String>(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?);
            }
            ids
        };

        let mut pools = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(pool) = Self::find_by_id_tx(&conn, &id)? {
                pools.push(pool);
            }
        }
        Ok(pools)
    }

    /// 船舶在指定年度所属的联营
    pub fn find_by_ship_year(&self, ship_id: &str, year: i32) -> RepositoryResult<Option<Pool>> {
        let conn = self.get_conn()?;
        Self::find_by_ship_year_tx(&conn, ship_id, year)
    }

    pub fn insert(&self, pool: &Pool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, pool)
    }

    // ==========================================
    // 连接级操作
    // ==========================================

    pub fn find_by_id_tx(conn: &Connection, pool_id: &str) -> RepositoryResult<Option<Pool>> {
        let header: Option<(String, i32, f64, String)> = conn
            .query_row(
                "SELECT id, year, total_pool_balance, created_at FROM pool WHERE id = ?1",
                params![pool_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let (id, year, total_pool_balance, created_at_raw) = match header {
            Some(h) => h,
            None => return Ok(None),
        };
        let created_at: DateTime<Utc> = ts_from_db(3, &created_at_raw)?;

        let mut stmt = conn.prepare(
            "SELECT ship_id, cb_before, cb_after FROM pool_member
             WHERE pool_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok(PoolMember {
                ship_id: row.get(0)?,
                cb_before: row.get(1)?,
                cb_after: row.get(2)?,
            })
        })?;
        let mut members = Vec::new();
        for row in rows {
            members.push(row?);
        }

        Ok(Some(Pool {
            id,
            year,
            members,
            total_pool_balance,
            created_at,
        }))
    }

    pub fn find_by_ship_year_tx(
        conn: &Connection,
        ship_id: &str,
        year: i32,
    ) -> RepositoryResult<Option<Pool>> {
        let pool_id: Option<String> = conn
            .query_row(
                "SELECT pool_id FROM pool_member WHERE ship_id = ?1 AND year = ?2",
                params![ship_id, year],
                |row| row.get(0),
            )
            .optional()?;
        match pool_id {
            Some(id) => Self::find_by_id_tx(conn, &id),
            None => Ok(None),
        }
    }

    /// 写入联营及其成员（成员顺序即 position）
    pub fn insert_tx(conn: &Connection, pool: &Pool) -> RepositoryResult<()> {
        conn.execute(
            "INSERT INTO pool (id, year, total_pool_balance, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![pool.id, pool.year, pool.total_pool_balance, ts_to_db(&pool.created_at)],
        )?;

        let mut stmt = conn.prepare(
            r#"
            INSERT INTO pool_member (pool_id, position, ship_id, year, cb_before, cb_after)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;
        for (position, member) in pool.members.iter().enumerate() {
            stmt.execute(params![
                pool.id,
                position as i64,
                member.ship_id,
                pool.year,
                member.cb_before,
                member.cb_after,
            ])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setup() -> PoolRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        PoolRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn member(ship_id: &str, cb_before: f64, cb_after: f64) -> PoolMember {
        PoolMember {
            ship_id: ship_id.to_string(),
            cb_before,
            cb_after,
        }
    }

    #[test]
    fn test_insert_and_load_members_in_order() {
        let repo = setup();
        let pool = Pool::create(
            "p-1".to_string(),
            2025,
            vec![member("BulkCarrier", 300.0, 200.0), member("Tanker", -100.0, 0.0)],
            Utc::now(),
        )
        .unwrap();
        repo.insert(&pool).unwrap();

        let loaded = repo.find_by_id("p-1").unwrap().unwrap();
        assert_eq!(loaded.members, pool.members);
        assert_eq!(loaded.total_pool_balance, 200.0);

        let by_ship = repo.find_by_ship_year("Tanker", 2025).unwrap().unwrap();
        assert_eq!(by_ship.id, "p-1");
        assert!(repo.find_by_ship_year("Tanker", 2024).unwrap().is_none());
        assert_eq!(repo.find_by_year(2025).unwrap().len(), 1);
    }

    #[test]
    fn test_ship_cannot_join_two_pools() {
        let repo = setup();
        let now = Utc::now();
        let first = Pool::create(
            "p-1".to_string(),
            2025,
            vec![member("BulkCarrier", 300.0, 300.0), member("Tanker", 10.0, 10.0)],
            now,
        )
        .unwrap();
        repo.insert(&first).unwrap();

        let second = Pool::create(
            "p-2".to_string(),
            2025,
            vec![member("RoRo", 5.0, 5.0), member("Tanker", 10.0, 10.0)],
            now,
        )
        .unwrap();
        let err = repo.insert(&second).unwrap_err();
        assert!(err.is_unique_violation_on("pool_member"));
    }
}
