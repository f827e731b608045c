// ==========================================
// FuelEU 合规系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 连接: 全部仓储/配置/事务单元共享同一条 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ApiResult, BankingApi, ComplianceApi, PoolApi, RouteApi};
use crate::config::{ComplianceConfigReader, ConfigManager};
use crate::domain::action_log::ActionLog;
use crate::domain::ids::{IdGenerator, UuidIdGenerator};
use crate::repository::{
    ActionLogRepository, BankEntryRepository, PoolRepository, RouteRepository,
    ShipComplianceRepository, UnitOfWork,
};

/// 默认操作人
pub const DEFAULT_ACTOR: &str = "system";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 航线API
    pub route_api: Arc<RouteApi>,

    /// 合规余额API
    pub compliance_api: Arc<ComplianceApi>,

    /// 存储API
    pub banking_api: Arc<BankingApi>,

    /// 联营API
    pub pool_api: Arc<PoolApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例（默认操作人、UUID 标识）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（":memory:" 为内存库）
    ///
    /// # 返回
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_options(db_path, DEFAULT_ACTOR, Arc::new(UuidIdGenerator))
    }

    /// 指定操作人与标识生成器创建AppState
    pub fn with_options(
        db_path: String,
        actor: &str,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::ensure_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let route_repo = Arc::new(RouteRepository::from_connection(conn.clone()));
        let compliance_repo = Arc::new(ShipComplianceRepository::from_connection(conn.clone()));
        let bank_entry_repo = Arc::new(BankEntryRepository::from_connection(conn.clone()));
        let pool_repo = Arc::new(PoolRepository::from_connection(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let unit_of_work = Arc::new(UnitOfWork::new(conn.clone()));

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let config: Arc<dyn ComplianceConfigReader> = config_manager.clone();

        // ==========================================
        // 初始化API层
        // ==========================================
        let route_api = Arc::new(RouteApi::new(
            route_repo,
            config.clone(),
            unit_of_work.clone(),
            ids.clone(),
            actor,
        ));
        let compliance_api = Arc::new(ComplianceApi::new(
            compliance_repo,
            bank_entry_repo.clone(),
            config.clone(),
            unit_of_work.clone(),
            ids.clone(),
            actor,
        ));
        let banking_api = Arc::new(BankingApi::new(
            bank_entry_repo,
            config.clone(),
            unit_of_work.clone(),
            ids.clone(),
            actor,
        ));
        let pool_api = Arc::new(PoolApi::new(pool_repo, config, unit_of_work, ids, actor));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            route_api,
            compliance_api,
            banking_api,
            pool_api,
            config_manager,
            action_log_repo,
        })
    }

    /// 查询船舶的操作日志（最新在前）
    pub fn list_actions_by_ship(&self, ship_id: &str, limit: usize) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_ship(ship_id.trim(), limit)?)
    }

    /// 查询最近的操作日志
    pub fn list_recent_actions(&self, limit: usize) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_recent(limit)?)
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 FUELEU_DB_PATH > 用户本地数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("FUELEU_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./fueleu_compliance.db");

    if let Some(data_dir) = dirs::data_local_dir() {
        let dir = data_dir.join("fueleu-compliance");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("fueleu_compliance.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::SequentialIdGenerator;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_in_memory_state() {
        let state = AppState::with_options(
            ":memory:".to_string(),
            "tester",
            Arc::new(SequentialIdGenerator::new("id")),
        )
        .unwrap();
        assert!(state.route_api.get_routes(&Default::default()).unwrap().is_empty());
        assert!(state.list_actions_by_ship("Tanker", 10).unwrap().is_empty());
    }
}
