// ==========================================
// FuelEU 合规系统 - 合规余额 API
// ==========================================
// 职责: 计算并持久化船舶年度合规余额、调整后余额查询
// 写入: 每次计算都覆写 (ship_id, year) 记录，并在同一事务内写审计日志
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, instrument};

use crate::api::dto::{AdjustedComplianceBalanceResult, ComplianceBalanceResult};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{configured_year_range, validate_ship_id, validate_year};
use crate::config::ComplianceConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::compliance::ShipCompliance;
use crate::domain::ids::IdGenerator;
use crate::domain::route::RouteFilter;
use crate::domain::types::VesselType;
use crate::engine::compliance_calculator::{ComplianceCalculator, ComplianceSnapshot};
use crate::engine::rounding::{round_balance, round_intensity};
use crate::repository::{
    ActionLogRepository, BankEntryRepository, RouteRepository, ShipComplianceRepository,
    UnitOfWork,
};

/// 在事务内按 (船型, 年度) 取航线并计算
///
/// 未知船舶 (`vessel_type == None`) 视为无航线数据
pub(crate) fn compute_scope_tx(
    conn: &Connection,
    calculator: &ComplianceCalculator,
    ship_id: &str,
    vessel_type: Option<VesselType>,
    year: i32,
) -> ApiResult<ComplianceSnapshot> {
    let vessel_type = vessel_type.ok_or_else(|| {
        ApiError::NoData(format!("船舶 {} 在 {} 年没有航线数据", ship_id, year))
    })?;
    let routes = RouteRepository::find_by_filter_tx(conn, &RouteFilter::scope(vessel_type, year))?;
    if routes.is_empty() {
        return Err(ApiError::NoData(format!(
            "船舶 {} 在 {} 年没有航线数据",
            ship_id, year
        )));
    }
    Ok(calculator.compute_balance(&routes, year)?)
}

// ==========================================
// ComplianceApi - 合规余额 API
// ==========================================
pub struct ComplianceApi {
    compliance_repo: Arc<ShipComplianceRepository>,
    bank_entry_repo: Arc<BankEntryRepository>,
    config: Arc<dyn ComplianceConfigReader>,
    unit_of_work: Arc<UnitOfWork>,
    ids: Arc<dyn IdGenerator>,
    actor: String,
}

impl ComplianceApi {
    pub fn new(
        compliance_repo: Arc<ShipComplianceRepository>,
        bank_entry_repo: Arc<BankEntryRepository>,
        config: Arc<dyn ComplianceConfigReader>,
        unit_of_work: Arc<UnitOfWork>,
        ids: Arc<dyn IdGenerator>,
        actor: &str,
    ) -> Self {
        Self {
            compliance_repo,
            bank_entry_repo,
            config,
            unit_of_work,
            ids,
            actor: actor.to_string(),
        }
    }

    /// 计算并保存船舶年度合规余额
    ///
    /// # 参数
    /// - ship_id: 船舶标识（船型）
    /// - year: 合规年度
    ///
    /// # 返回
    /// - Ok(ComplianceBalanceResult): 取整后的结果
    /// - Err(NoData): 范围内无航线
    /// - Err(ValidationError): 输入非法
    #[instrument(skip(self))]
    pub fn get_compliance_balance(&self, ship_id: &str, year: i32) -> ApiResult<ComplianceBalanceResult> {
        let vessel_type = validate_ship_id(ship_id)?;
        let ship_id = ship_id.trim();
        validate_year(year, configured_year_range(self.config.as_ref())?)?;
        let calculator = self.config.load_calculator().map_err(ApiError::from_config)?;

        let snapshot = self.unit_of_work.run(|conn| -> ApiResult<ComplianceSnapshot> {
            let snapshot = compute_scope_tx(conn, &calculator, ship_id, vessel_type, year)?;
            let now = Utc::now();
            let record = ShipCompliance {
                id: self.ids.next_id(),
                ship_id: ship_id.to_string(),
                year,
                actual_ghg_intensity: snapshot.actual_intensity,
                energy_used: snapshot.energy_used,
                compliance_balance: snapshot.compliance_balance,
                created_at: now,
                updated_at: now,
            };
            ShipComplianceRepository::upsert_tx(conn, &record)?;

            let log = ActionLog::new(self.ids.next_id(), ActionType::ComputeBalance, &self.actor)
                .with_scope(ship_id, year)
                .with_payload(&snapshot);
            ActionLogRepository::insert_tx(conn, &log)?;
            Ok(snapshot)
        })?;

        info!(
            ship_id = %ship_id,
            year = year,
            balance = snapshot.compliance_balance,
            "合规余额已计算"
        );
        Ok(ComplianceBalanceResult::from_snapshot(ship_id, &snapshot))
    }

    /// 调整后余额 = 当前计算余额 + 该船舶全部已动用存储
    ///
    /// 只读，不修改合规记录
    #[instrument(skip(self))]
    pub fn get_adjusted_balance(
        &self,
        ship_id: &str,
        year: i32,
    ) -> ApiResult<AdjustedComplianceBalanceResult> {
        let vessel_type = validate_ship_id(ship_id)?;
        let ship_id = ship_id.trim();
        validate_year(year, configured_year_range(self.config.as_ref())?)?;
        let calculator = self.config.load_calculator().map_err(ApiError::from_config)?;

        let snapshot = self.unit_of_work.run(|conn| {
            compute_scope_tx(conn, &calculator, ship_id, vessel_type, year)
        })?;
        let banked_applied = self.bank_entry_repo.sum_applied_by_ship(ship_id)?;
        let adjusted_balance = snapshot.compliance_balance + banked_applied;

        Ok(AdjustedComplianceBalanceResult {
            ship_id: ship_id.to_string(),
            year,
            actual_ghg_intensity: round_intensity(snapshot.actual_intensity),
            target_ghg_intensity: snapshot.target_intensity,
            energy_used: snapshot.energy_used,
            compliance_balance: round_balance(snapshot.compliance_balance),
            banked_applied: round_balance(banked_applied),
            adjusted_balance: round_balance(adjusted_balance),
            is_compliant: adjusted_balance >= 0.0,
        })
    }

    /// 查询年度内全部已保存的合规记录（按船舶排序）
    pub fn list_compliance_by_year(&self, year: i32) -> ApiResult<Vec<ShipCompliance>> {
        validate_year(year, configured_year_range(self.config.as_ref())?)?;
        Ok(self.compliance_repo.find_by_year(year)?)
    }

    /// 查询单条已保存的合规记录
    pub fn get_compliance_record(&self, ship_id: &str, year: i32) -> ApiResult<ShipCompliance> {
        validate_ship_id(ship_id)?;
        let ship_id = ship_id.trim();
        self.compliance_repo
            .find_by_ship_year(ship_id, year)?
            .ok_or_else(|| ApiError::NotFound(format!("合规记录不存在: {}/{}", ship_id, year)))
    }
}
