// ==========================================
// FuelEU 合规系统 - 航线数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 基线: baseline_marker 单行表，清除与设置在同一事务内完成
// ==========================================

use crate::domain::route::{Route, RouteFilter};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_codec::{enum_from_db, ts_from_db, ts_to_db};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_ROUTE: &str = r#"
    SELECT
        r.id, r.route_code, r.vessel_type, r.fuel_type, r.year,
        r.ghg_intensity, r.fuel_consumption, r.distance, r.total_emissions,
        CASE WHEN bm.route_id IS NULL THEN 0 ELSE 1 END AS is_baseline,
        r.created_at, r.updated_at
    FROM route r
    LEFT JOIN baseline_marker bm ON bm.route_id = r.id
"#;

// ==========================================
// RouteRepository - 航线仓储
// ==========================================
pub struct RouteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RouteRepository {
    /// 创建新的 RouteRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_all(&self) -> RepositoryResult<Vec<Route>> {
        let conn = self.get_conn()?;
        Self::find_by_filter_tx(&conn, &RouteFilter::default())
    }

    /// 按条件查询（条件均为可选）
    pub fn find_by_filter(&self, filter: &RouteFilter) -> RepositoryResult<Vec<Route>> {
        let conn = self.get_conn()?;
        Self::find_by_filter_tx(&conn, filter)
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Route>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, id)
    }

    pub fn find_by_code(&self, route_code: &str) -> RepositoryResult<Option<Route>> {
        let conn = self.get_conn()?;
        Self::find_by_code_tx(&conn, route_code)
    }

    /// 当前基线航线
    pub fn find_baseline(&self) -> RepositoryResult<Option<Route>> {
        let conn = self.get_conn()?;
        Self::find_baseline_tx(&conn)
    }

    // ==========================================
    // 写入
    // ==========================================

    pub fn insert(&self, route: &Route) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, route)
    }

    pub fn update(&self, route: &Route) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::update_tx(&conn, route)
    }

    /// 设置基线（独立事务）
    pub fn set_baseline(&self, route_id: &str, now: DateTime<Utc>) -> RepositoryResult<Route> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let route = Self::set_baseline_tx(&tx, route_id, now)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(route)
    }

    // ==========================================
    // 连接级操作（供 UnitOfWork 组合）
    // ==========================================

    pub fn find_by_filter_tx(conn: &Connection, filter: &RouteFilter) -> RepositoryResult<Vec<Route>> {
        let sql = format!(
            "{} WHERE (?1 IS NULL OR r.vessel_type = ?1)
                 AND (?2 IS NULL OR r.fuel_type = ?2)
                 AND (?3 IS NULL OR r.year = ?3)
               ORDER BY r.route_code",
            SELECT_ROUTE
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                filter.vessel_type.map(|v| v.as_str()),
                filter.fuel_type.map(|f| f.as_str()),
                filter.year,
            ],
            map_route_row,
        )?;
        let mut routes = Vec::new();
        for row in rows {
            routes.push(row?);
        }
        Ok(routes)
    }

    pub fn find_by_id_tx(conn: &Connection, id: &str) -> RepositoryResult<Option<Route>> {
        let sql = format!("{} WHERE r.id = ?1", SELECT_ROUTE);
        Ok(conn.query_row(&sql, params![id], map_route_row).optional()?)
    }

    pub fn find_by_code_tx(conn: &Connection, route_code: &str) -> RepositoryResult<Option<Route>> {
        let sql = format!("{} WHERE r.route_code = ?1", SELECT_ROUTE);
        Ok(conn.query_row(&sql, params![route_code], map_route_row).optional()?)
    }

    pub fn find_baseline_tx(conn: &Connection) -> RepositoryResult<Option<Route>> {
        let sql = format!("{} WHERE bm.slot = 1", SELECT_ROUTE);
        Ok(conn.query_row(&sql, [], map_route_row).optional()?)
    }

    pub fn insert_tx(conn: &Connection, route: &Route) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO route (
                id, route_code, vessel_type, fuel_type, year,
                ghg_intensity, fuel_consumption, distance, total_emissions,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                route.id,
                route.route_code,
                route.vessel_type.as_str(),
                route.fuel_type.as_str(),
                route.year,
                route.ghg_intensity,
                route.fuel_consumption,
                route.distance,
                route.total_emissions,
                ts_to_db(&route.created_at),
                ts_to_db(&route.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn update_tx(conn: &Connection, route: &Route) -> RepositoryResult<()> {
        let affected = conn.execute(
            r#"
            UPDATE route SET
                route_code = ?2, vessel_type = ?3, fuel_type = ?4, year = ?5,
                ghg_intensity = ?6, fuel_consumption = ?7, distance = ?8,
                total_emissions = ?9, updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                route.id,
                route.route_code,
                route.vessel_type.as_str(),
                route.fuel_type.as_str(),
                route.year,
                route.ghg_intensity,
                route.fuel_consumption,
                route.distance,
                route.total_emissions,
                ts_to_db(&route.updated_at),
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Route".to_string(),
                id: route.id.clone(),
            });
        }
        Ok(())
    }

    /// 清除旧基线并设置新基线
    ///
    /// # 返回
    /// - Err(NotFound): 航线不存在（此时不做任何修改）
    pub fn set_baseline_tx(
        conn: &Connection,
        route_id: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Route> {
        if Self::find_by_id_tx(conn, route_id)?.is_none() {
            return Err(RepositoryError::NotFound {
                entity: "Route".to_string(),
                id: route_id.to_string(),
            });
        }

        conn.execute("DELETE FROM baseline_marker", [])?;
        conn.execute(
            "INSERT INTO baseline_marker (slot, route_id, set_at) VALUES (1, ?1, ?2)",
            params![route_id, ts_to_db(&now)],
        )?;
        conn.execute(
            "UPDATE route SET updated_at = ?2 WHERE id = ?1",
            params![route_id, ts_to_db(&now)],
        )?;

        Self::find_by_id_tx(conn, route_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Route".to_string(),
            id: route_id.to_string(),
        })
    }
}

fn map_route_row(row: &Row<'_>) -> rusqlite::Result<Route> {
    Ok(Route {
        id: row.get(0)?,
        route_code: row.get(1)?,
        vessel_type: enum_from_db(2, &row.get::<_, String>(2)?)?,
        fuel_type: enum_from_db(3, &row.get::<_, String>(3)?)?,
        year: row.get(4)?,
        ghg_intensity: row.get(5)?,
        fuel_consumption: row.get(6)?,
        distance: row.get(7)?,
        total_emissions: row.get(8)?,
        is_baseline: row.get::<_, i64>(9)? != 0,
        created_at: ts_from_db(10, &row.get::<_, String>(10)?)?,
        updated_at: ts_from_db(11, &row.get::<_, String>(11)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{FuelType, VesselType};

    fn setup() -> RouteRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        RouteRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn route(id: &str, code: &str, year: i32) -> Route {
        let now = Utc::now();
        Route {
            id: id.to_string(),
            route_code: code.to_string(),
            vessel_type: VesselType::Container,
            fuel_type: FuelType::Hfo,
            year,
            ghg_intensity: 91.0,
            fuel_consumption: 5000.0,
            distance: 12000.0,
            total_emissions: 4500.0,
            is_baseline: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_baseline_marker_moves() {
        let repo = setup();
        repo.insert(&route("r-1", "R001", 2024)).unwrap();
        repo.insert(&route("r-2", "R002", 2025)).unwrap();

        repo.set_baseline("r-1", Utc::now()).unwrap();
        let moved = repo.set_baseline("r-2", Utc::now()).unwrap();
        assert!(moved.is_baseline);

        let baselines: Vec<String> = repo
            .find_all()
            .unwrap()
            .into_iter()
            .filter(|r| r.is_baseline)
            .map(|r| r.id)
            .collect();
        assert_eq!(baselines, vec!["r-2"]);

        let err = repo.set_baseline("missing", Utc::now()).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert_eq!(repo.find_baseline().unwrap().unwrap().id, "r-2");
    }

    #[test]
    fn test_duplicate_route_code() {
        let repo = setup();
        repo.insert(&route("r-1", "R001", 2024)).unwrap();
        let err = repo.insert(&route("r-2", "R001", 2025)).unwrap_err();
        assert!(err.is_unique_violation_on("route"));

        let filter = RouteFilter {
            year: Some(2024),
            ..Default::default()
        };
        assert_eq!(repo.find_by_filter(&filter).unwrap().len(), 1);
    }
}
