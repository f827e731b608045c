// ==========================================
// FuelEU 合规系统 - 演示数据库初始化
// ==========================================
// 用法: seed_demo_db [db_path] [--csv <routes.csv>]
// 行为: 备份并重建数据库 → 录入航线 → 设置基线 → 计算各船舶年度合规余额
// ==========================================

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use serde::Deserialize;

use fueleu_compliance::api::RouteInput;
use fueleu_compliance::app::{get_default_db_path, AppState};
use fueleu_compliance::domain::types::{FuelType, VesselType};
use fueleu_compliance::logging;

/// 备份并重建演示数据库
#[derive(Debug, Parser)]
#[command(name = "seed_demo_db")]
#[command(about = "备份并重建演示数据库，录入航线并计算合规余额", long_about = None)]
struct SeedArgs {
    /// 数据库路径（缺省为应用数据目录）
    #[arg(env = "FUELEU_DB_PATH")]
    db_path: Option<String>,

    /// 航线 CSV 文件（表头为 camelCase，缺省使用内置演示航线）
    #[arg(long)]
    csv: Option<PathBuf>,
}

/// CSV 行（表头为 camelCase）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRouteRow {
    route_code: String,
    vessel_type: VesselType,
    fuel_type: FuelType,
    year: i32,
    ghg_intensity: f64,
    fuel_consumption: f64,
    distance: f64,
    total_emissions: f64,
    #[serde(default)]
    is_baseline: bool,
}

impl CsvRouteRow {
    fn input(&self) -> RouteInput {
        RouteInput {
            route_code: self.route_code.clone(),
            vessel_type: self.vessel_type,
            fuel_type: self.fuel_type,
            year: self.year,
            ghg_intensity: self.ghg_intensity,
            fuel_consumption: self.fuel_consumption,
            distance: self.distance,
            total_emissions: self.total_emissions,
        }
    }
}

fn main() -> Result<()> {
    logging::init();
    let args = SeedArgs::parse();
    let db_path = args.db_path.unwrap_or_else(get_default_db_path);

    let rows = match &args.csv {
        Some(path) => load_csv(path)?,
        None => default_routes(),
    };

    backup_and_reset_db(&db_path)?;

    let state = AppState::new(db_path.clone())
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    seed_routes(&state, &rows)?;
    seed_compliance(&state, &rows)?;

    eprintln!("Seeded {} routes into {}", rows.len(), db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<()> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path).with_context(|| format!("备份失败: {}", db_path))?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn load_csv(path: &Path) -> Result<Vec<CsvRouteRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("无法打开CSV: {}", path.display()))?;
    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<CsvRouteRow>().enumerate() {
        // 表头占第 1 行
        let row = record.with_context(|| format!("CSV 第 {} 行解析失败", idx + 2))?;
        rows.push(row);
    }
    if rows.is_empty() {
        anyhow::bail!("CSV 中没有航线数据: {}", path.display());
    }
    Ok(rows)
}

fn seed_routes(state: &AppState, rows: &[CsvRouteRow]) -> Result<()> {
    for row in rows {
        let route = state.route_api.create_route(row.input())?;
        eprintln!("  + route {} ({} {} {})", route.route_code, route.vessel_type, route.fuel_type, route.year);
    }

    // 多行标记基线时以最后一行为准
    if let Some(baseline) = rows.iter().rev().find(|r| r.is_baseline) {
        state.route_api.set_baseline(&baseline.route_code)?;
        eprintln!("  * baseline {}", baseline.route_code);
    }
    Ok(())
}

fn seed_compliance(state: &AppState, rows: &[CsvRouteRow]) -> Result<()> {
    let scopes: BTreeSet<(String, i32)> = rows
        .iter()
        .map(|r| (r.vessel_type.as_str().to_string(), r.year))
        .collect();

    for (ship_id, year) in scopes {
        let result = state.compliance_api.get_compliance_balance(&ship_id, year)?;
        eprintln!(
            "  = compliance {}/{}: CB {} ({})",
            ship_id,
            year,
            result.compliance_balance,
            if result.is_compliant { "surplus" } else { "deficit" }
        );
    }
    Ok(())
}

/// 内置演示航线
fn default_routes() -> Vec<CsvRouteRow> {
    let row = |code: &str,
               vessel_type: VesselType,
               fuel_type: FuelType,
               year: i32,
               ghg: f64,
               fuel: f64,
               distance: f64,
               emissions: f64,
               is_baseline: bool| CsvRouteRow {
        route_code: code.to_string(),
        vessel_type,
        fuel_type,
        year,
        ghg_intensity: ghg,
        fuel_consumption: fuel,
        distance,
        total_emissions: emissions,
        is_baseline,
    };

    vec![
        row("R001", VesselType::Container, FuelType::Hfo, 2024, 91.0, 5000.0, 12000.0, 4500.0, true),
        row("R002", VesselType::BulkCarrier, FuelType::Lng, 2024, 88.0, 4800.0, 11500.0, 4200.0, false),
        row("R003", VesselType::Tanker, FuelType::Mgo, 2024, 93.5, 5100.0, 12500.0, 4700.0, false),
        row("R004", VesselType::RoRo, FuelType::Hfo, 2025, 89.2, 4900.0, 11800.0, 4300.0, false),
        row("R005", VesselType::Container, FuelType::Lng, 2025, 90.5, 4950.0, 11900.0, 4400.0, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<SeedArgs, clap::Error> {
        SeedArgs::try_parse_from(std::iter::once("seed_demo_db").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_db_and_csv() {
        let args = parse(&["demo.db", "--csv", "demos/demo_routes.csv"]).unwrap();
        assert_eq!(args.db_path.as_deref(), Some("demo.db"));
        assert_eq!(args.csv, Some(PathBuf::from("demos/demo_routes.csv")));

        let args = parse(&["--csv", "routes.csv", "demo.db"]).unwrap();
        assert_eq!(args.db_path.as_deref(), Some("demo.db"));

        assert!(parse(&["demo.db", "--csv"]).is_err());
        assert!(parse(&["a.db", "b.db"]).is_err());
    }

    #[test]
    fn test_load_demo_csv() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/demo_routes.csv");
        let rows = load_csv(&path).unwrap();
        assert_eq!(rows.len(), default_routes().len());
        assert_eq!(rows[0].route_code, "R001");
        assert!(rows[0].is_baseline);
        assert_eq!(rows[1].fuel_type, FuelType::Lng);
    }
}
