// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;

use rusqlite::{params, Connection};
use tempfile::NamedTempFile;

use fueleu_compliance::api::RouteInput;
use fueleu_compliance::app::AppState;
use fueleu_compliance::domain::ids::SequentialIdGenerator;
use fueleu_compliance::domain::types::{FuelType, VesselType};

/// 浮点比较容差（余额量级为 1e8 ~ 1e9）
pub const BALANCE_EPS: f64 = 1e-2;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径非 UTF-8")?
        .to_string();

    let conn = fueleu_compliance::db::open_sqlite_connection(&db_path)?;
    fueleu_compliance::db::ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建测试用 AppState（顺序标识，操作人 tester）
pub fn create_test_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let state = AppState::with_options(
        db_path,
        "tester",
        Arc::new(SequentialIdGenerator::new("id")),
    )?;
    Ok((temp_file, state))
}

/// 写入全局配置
pub fn insert_test_config(db_path: &str, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let conn = Connection::open(db_path)?;
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

/// 构造航线输入（航程与总排放取固定值）
pub fn route_input(
    code: &str,
    vessel_type: VesselType,
    fuel_type: FuelType,
    year: i32,
    ghg_intensity: f64,
    fuel_consumption: f64,
) -> RouteInput {
    RouteInput {
        route_code: code.to_string(),
        vessel_type,
        fuel_type,
        year,
        ghg_intensity,
        fuel_consumption,
        distance: 12_000.0,
        total_emissions: 4_500.0,
    }
}

/// 批量录入航线
pub fn insert_routes(state: &AppState, inputs: Vec<RouteInput>) -> Result<(), Box<dyn Error>> {
    for input in inputs {
        state.route_api.create_route(input)?;
    }
    Ok(())
}

/// 演示航线 R001~R005
pub fn demo_routes() -> Vec<RouteInput> {
    vec![
        route_input("R001", VesselType::Container, FuelType::Hfo, 2024, 91.0, 5000.0),
        route_input("R002", VesselType::BulkCarrier, FuelType::Lng, 2024, 88.0, 4800.0),
        route_input("R003", VesselType::Tanker, FuelType::Mgo, 2024, 93.5, 5100.0),
        route_input("R004", VesselType::RoRo, FuelType::Hfo, 2025, 89.2, 4900.0),
        route_input("R005", VesselType::Container, FuelType::Lng, 2025, 90.5, 4950.0),
    ]
}

/// 读取指定表的行数
pub fn count_rows(db_path: &str, table: &str) -> Result<i64, Box<dyn Error>> {
    let conn = Connection::open(db_path)?;
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < BALANCE_EPS,
        "expected {}, got {}",
        expected,
        actual
    );
}
