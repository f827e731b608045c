// ==========================================
// FuelEU 合规系统 - 船舶合规记录仓储
// ==========================================
// 主键语义: (ship_id, year) 唯一，upsert 覆盖已有计算结果
// ==========================================

use crate::domain::compliance::ShipCompliance;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_codec::{ts_from_db, ts_to_db};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COMPLIANCE: &str = r#"
    SELECT id, ship_id, year, actual_ghg_intensity, energy_used,
           compliance_balance, created_at, updated_at
    FROM ship_compliance
"#;

// ==========================================
// ShipComplianceRepository - 合规记录仓储
// ==========================================
pub struct ShipComplianceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShipComplianceRepository {
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

    pub fn find_by_ship_year(&self, ship_id: &str, year: i32) -> RepositoryResult<Option<ShipCompliance>> {
        let conn = self.get_conn()?;
        Self::find_by_ship_year_tx(&conn, ship_id, year)
    }

    /// 按年度查询（按 ship_id 排序）
    pub fn find_by_year(&self, year: i32) -> RepositoryResult<Vec<ShipCompliance>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE year = ?1 ORDER BY ship_id", SELECT_COMPLIANCE);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![year], map_compliance_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn insert(&self, record: &ShipCompliance) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, record)
    }

    pub fn upsert(&self, record: &ShipCompliance) -> RepositoryResult<ShipCompliance> {
        let conn = self.get_conn()?;
        Self::upsert_tx(&conn, record)
    }

    // ==========================================
    // 连接级操作
    // ==========================================

    pub fn find_by_ship_year_tx(
        conn: &Connection,
        ship_id: &str,
        year: i32,
    ) -> RepositoryResult<Option<ShipCompliance>> {
        let sql = format!("{} WHERE ship_id = ?1 AND year = ?2", SELECT_COMPLIANCE);
        Ok(conn
            .query_row(&sql, params![ship_id, year], map_compliance_row)
            .optional()?)
    }

    pub fn insert_tx(conn: &Connection, record: &ShipCompliance) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO ship_compliance (
                id, ship_id, year, actual_ghg_intensity, energy_used,
                compliance_balance, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.id,
                record.ship_id,
                record.year,
                record.actual_ghg_intensity,
                record.energy_used,
                record.compliance_balance,
                ts_to_db(&record.created_at),
                ts_to_db(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 按 (ship_id, year) 创建或覆盖
    ///
    /// 已存在时保留原 id 与 created_at，返回落库后的记录
    pub fn upsert_tx(conn: &Connection, record: &ShipCompliance) -> RepositoryResult<ShipCompliance> {
        conn.execute(
            r#"
            INSERT INTO ship_compliance (
                id, ship_id, year, actual_ghg_intensity, energy_used,
                compliance_balance, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(ship_id, year) DO UPDATE SET
                actual_ghg_intensity = excluded.actual_ghg_intensity,
                energy_used = excluded.energy_used,
                compliance_balance = excluded.compliance_balance,
                updated_at = excluded.updated_at
            "#,
            params![
                record.id,
                record.ship_id,
                record.year,
                record.actual_ghg_intensity,
                record.energy_used,
                record.compliance_balance,
                ts_to_db(&record.created_at),
                ts_to_db(&record.updated_at),
            ],
        )?;

        Self::find_by_ship_year_tx(conn, &record.ship_id, record.year)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "ShipCompliance".to_string(),
                id: format!("{}/{}", record.ship_id, record.year),
            }
        })
    }

    /// 覆写合规余额
    ///
    /// # 返回
    /// - Err(NotFound): 记录不存在
    pub fn update_balance_tx(
        conn: &Connection,
        ship_id: &str,
        year: i32,
        balance: f64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let affected = conn.execute(
            "UPDATE ship_compliance SET compliance_balance = ?3, updated_at = ?4
             WHERE ship_id = ?1 AND year = ?2",
            params![ship_id, year, balance, ts_to_db(&now)],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ShipCompliance".to_string(),
                id: format!("{}/{}", ship_id, year),
            });
        }
        Ok(())
    }
}

fn map_compliance_row(row: &Row<'_>) -> rusqlite::Result<ShipCompliance> {
    Ok(ShipCompliance {
        id: row.get(0)?,
        ship_id: row.get(1)?,
        year: row.get(2)?,
        actual_ghg_intensity: row.get(3)?,
        energy_used: row.get(4)?,
        compliance_balance: row.get(5)?,
        created_at: ts_from_db(6, &row.get::<_, String>(6)?)?,
        updated_at: ts_from_db(7, &row.get::<_, String>(7)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ShipComplianceRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        ShipComplianceRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn record(id: &str, balance: f64) -> ShipCompliance {
        let now = Utc::now();
        ShipCompliance {
            id: id.to_string(),
            ship_id: "Tanker".to_string(),
            year: 2025,
            actual_ghg_intensity: 90.0,
            energy_used: 41_000.0,
            compliance_balance: balance,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_upsert_keeps_original_id() {
        let repo = setup();
        let first = repo.upsert(&record("c-1", -100.0)).unwrap();
        let second = repo.upsert(&record("c-2", 50.0)).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.compliance_balance, 50.0);
        assert_eq!(repo.find_by_year(2025).unwrap().len(), 1);
    }

    #[test]
    fn test_update_balance_missing_record() {
        let repo = setup();
        let conn = repo.get_conn().unwrap();
        let err = ShipComplianceRepository::update_balance_tx(&conn, "Tanker", 2025, 0.0, Utc::now())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
