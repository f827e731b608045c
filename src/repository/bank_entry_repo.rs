// ==========================================
// FuelEU 合规系统 - 存储条目仓储
// ==========================================
// 红线: 条目不删除; 只更新 applied_amount
// FIFO: ORDER BY created_at, seq（seq 为插入序号）
// 冲突: UNIQUE(ship_id, year) 保证每船每年只能存储一次
// ==========================================

use crate::domain::bank::BankEntry;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_codec::{ts_from_db, ts_to_db};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_ENTRY: &str = r#"
    SELECT id, seq, ship_id, year, amount, original_amount, applied_amount,
           created_at, updated_at
    FROM bank_entry
"#;

// ==========================================
// BankEntryRepository - 存储条目仓储
// ==========================================
pub struct BankEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BankEntryRepository {
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

    // ==========================================
    // 查询
    // ==========================================

    /// 指定船舶年度的条目（至多一条，返回列表以便展示）
    pub fn find_by_ship_year(&self, ship_id: &str, year: i32) -> RepositoryResult<Vec<BankEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE ship_id = ?1 AND year = ?2 ORDER BY created_at, seq",
            SELECT_ENTRY
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![ship_id, year], map_entry_row)?;
        collect(rows)
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<BankEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE id = ?1", SELECT_ENTRY);
        Ok(conn.query_row(&sql, params![id], map_entry_row).optional()?)
    }

    /// 船舶全部条目（任意年度，FIFO 顺序）
    pub fn find_by_ship(&self, ship_id: &str) -> RepositoryResult<Vec<BankEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE ship_id = ?1 ORDER BY created_at, seq", SELECT_ENTRY);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![ship_id], map_entry_row)?;
        collect(rows)
    }

    pub fn find_available_by_ship(&self, ship_id: &str) -> RepositoryResult<Vec<BankEntry>> {
        let conn = self.get_conn()?;
        Self::find_available_by_ship_tx(&conn, ship_id)
    }

    pub fn sum_banked_by_ship(&self, ship_id: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COALESCE(SUM(original_amount), 0.0) FROM bank_entry WHERE ship_id = ?1",
            params![ship_id],
            |row| row.get(0),
        )?)
    }

    pub fn sum_applied_by_ship(&self, ship_id: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        Self::sum_applied_by_ship_tx(&conn, ship_id)
    }

    // ==========================================
    // 写入
    // ==========================================

    pub fn insert(&self, entry: &BankEntry) -> RepositoryResult<BankEntry> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, entry)
    }

    // ==========================================
    // 连接级操作
    // ==========================================

    pub fn exists_for_ship_year_tx(conn: &Connection, ship_id: &str, year: i32) -> RepositoryResult<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM bank_entry WHERE ship_id = ?1 AND year = ?2 LIMIT 1",
                params![ship_id, year],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 可用余额 > 0 的条目，FIFO 顺序
    pub fn find_available_by_ship_tx(conn: &Connection, ship_id: &str) -> RepositoryResult<Vec<BankEntry>> {
        let sql = format!(
            "{} WHERE ship_id = ?1 AND amount > applied_amount ORDER BY created_at, seq",
            SELECT_ENTRY
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![ship_id], map_entry_row)?;
        collect(rows)
    }

    pub fn sum_applied_by_ship_tx(conn: &Connection, ship_id: &str) -> RepositoryResult<f64> {
        Ok(conn.query_row(
            "SELECT COALESCE(SUM(applied_amount), 0.0) FROM bank_entry WHERE ship_id = ?1",
            params![ship_id],
            |row| row.get(0),
        )?)
    }

    /// 插入条目，返回带 seq 的条目
    pub fn insert_tx(conn: &Connection, entry: &BankEntry) -> RepositoryResult<BankEntry> {
        conn.execute(
            r#"
            INSERT INTO bank_entry (
                id, ship_id, year, amount, original_amount, applied_amount,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.id,
                entry.ship_id,
                entry.year,
                entry.amount,
                entry.original_amount,
                entry.applied_amount,
                ts_to_db(&entry.created_at),
                ts_to_db(&entry.updated_at),
            ],
        )?;
        Ok(BankEntry {
            seq: conn.last_insert_rowid(),
            ..entry.clone()
        })
    }

    /// 更新已动用金额
    pub fn update_applied_tx(conn: &Connection, entry: &BankEntry) -> RepositoryResult<()> {
        let affected = conn.execute(
            "UPDATE bank_entry SET applied_amount = ?2, updated_at = ?3 WHERE id = ?1",
            params![entry.id, entry.applied_amount, ts_to_db(&entry.updated_at)],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "BankEntry".to_string(),
                id: entry.id.clone(),
            });
        }
        Ok(())
    }
}

fn collect<I>(rows: I) -> RepositoryResult<Vec<BankEntry>>
where
    I: Iterator<Item = rusqlite::Result<BankEntry>>,
{
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<BankEntry> {
    Ok(BankEntry {
        id: row.get(0)?,
        seq: row.get(1)?,
        ship_id: row.get(2)?,
        year: row.get(3)?,
        amount: row.get(4)?,
        original_amount: row.get(5)?,
        applied_amount: row.get(6)?,
        created_at: ts_from_db(7, &row.get::<_, String>(7)?)?,
        updated_at: ts_from_db(8, &row.get::<_, String>(8)?)?,
    })
}
