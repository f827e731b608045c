// ==========================================
// FuelEU 合规系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::compliance_config_trait::ComplianceConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::compliance_calculator::ENERGY_FACTOR;
use crate::engine::target_schedule::{DEFAULT_BASELINE_INTENSITY, DEFAULT_SCHEDULE};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, "全局配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 读取数值配置；格式错误时告警并回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: std::str::FromStr + Copy + std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(
                        config_key = key,
                        raw_value = %raw,
                        default = %default,
                        "配置格式错误，使用默认值"
                    );
                    Ok(default)
                }
            },
        }
    }
}

/// 默认计划表
fn default_schedule_map() -> BTreeMap<i32, f64> {
    DEFAULT_SCHEDULE.iter().copied().collect()
}

// ==========================================
// ComplianceConfigReader Trait 实现
// ==========================================
impl ComplianceConfigReader for ConfigManager {
    fn get_baseline_intensity(&self) -> Result<f64, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::BASELINE_INTENSITY, DEFAULT_BASELINE_INTENSITY)
    }

    fn get_target_schedule_map(&self) -> Result<BTreeMap<i32, f64>, Box<dyn Error>> {
        let raw = match self.get_config_value(config_keys::TARGET_SCHEDULE)? {
            Some(v) => v,
            None => return Ok(default_schedule_map()),
        };

        // JSON 对象键为字符串: {"2025": 89.3368, ...}
        let parsed: Result<BTreeMap<String, f64>, _> = serde_json::from_str(&raw);
        let map = match parsed {
            Ok(m) => m,
            Err(_) => {
                tracing::warn!(
                    config_key = config_keys::TARGET_SCHEDULE,
                    raw_value = %raw,
                    "目标强度表配置格式错误，使用默认计划表"
                );
                return Ok(default_schedule_map());
            }
        };

        let mut schedule = BTreeMap::new();
        for (year, target) in map {
            match year.trim().parse::<i32>() {
                Ok(y) => {
                    schedule.insert(y, target);
                }
                Err(_) => {
                    tracing::warn!(
                        config_key = config_keys::TARGET_SCHEDULE,
                        year = %year,
                        "目标强度表年度无法解析，使用默认计划表"
                    );
                    return Ok(default_schedule_map());
                }
            }
        }
        Ok(schedule)
    }

    fn get_energy_conversion_factor(&self) -> Result<f64, Box<dyn Error>> {
        let factor = self.get_parsed_or_default(config_keys::ENERGY_CONVERSION_FACTOR, ENERGY_FACTOR)?;
        if !factor.is_finite() || factor <= 0.0 {
            tracing::warn!(
                config_key = config_keys::ENERGY_CONVERSION_FACTOR,
                value = factor,
                "能量换算系数必须为正，使用默认值"
            );
            return Ok(ENERGY_FACTOR);
        }
        Ok(factor)
    }

    fn get_comparison_reference_year(&self) -> Result<i32, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::COMPARISON_REFERENCE_YEAR, 2025)
    }

    fn get_min_compliance_year(&self) -> Result<i32, Box<dyn Error>> {
        self.get_parsed_or_default(
            config_keys::MIN_COMPLIANCE_YEAR,
            crate::domain::route::MIN_COMPLIANCE_YEAR,
        )
    }

    fn get_max_compliance_year(&self) -> Result<i32, Box<dyn Error>> {
        self.get_parsed_or_default(
            config_keys::MAX_COMPLIANCE_YEAR,
            crate::domain::route::MAX_COMPLIANCE_YEAR,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 目标强度
    pub const TARGET_SCHEDULE: &str = "target_schedule"; // JSON: {"2025": 89.3368, ...}
    pub const BASELINE_INTENSITY: &str = "baseline_intensity";

    // 计算参数
    pub const ENERGY_CONVERSION_FACTOR: &str = "energy_conversion_factor";
    pub const COMPARISON_REFERENCE_YEAR: &str = "comparison_reference_year";

    // 输入校验
    pub const MIN_COMPLIANCE_YEAR: &str = "min_compliance_year";
    pub const MAX_COMPLIANCE_YEAR: &str = "max_compliance_year";
}
