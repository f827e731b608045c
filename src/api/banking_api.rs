// ==========================================
// FuelEU 合规系统 - 存储 (Banking) API
// ==========================================
// 职责: 存入年度盈余、按 FIFO 动用存储抵扣赤字、存储查询
// 事务: 每个写操作的全部写入（条目/合规记录/审计日志）同进同退
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::api::compliance_api::compute_scope_tx;
use crate::api::dto::{ApplyBankingResult, BankSummary, BankingRecord, BankingResult};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{configured_year_range, validate_amount, validate_ship_id, validate_year};
use crate::config::ComplianceConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::compliance::ShipCompliance;
use crate::domain::ids::IdGenerator;
use crate::engine::bank_ledger::BankLedger;
use crate::engine::rounding::round_balance;
use crate::repository::{
    ActionLogRepository, BankEntryRepository, ShipComplianceRepository, UnitOfWork,
};

// ==========================================
// BankingApi - 存储 API
// ==========================================

/// 存储API
///
/// 职责：
/// 1. 盈余存入（每船每年至多一次）
/// 2. 存储动用（跨年度 FIFO）
/// 3. 存储记录与汇总查询
pub struct BankingApi {
    bank_entry_repo: Arc<BankEntryRepository>,
    config: Arc<dyn ComplianceConfigReader>,
    unit_of_work: Arc<UnitOfWork>,
    ledger: BankLedger,
    ids: Arc<dyn IdGenerator>,
    actor: String,
}

impl BankingApi {
    pub fn new(
        bank_entry_repo: Arc<BankEntryRepository>,
        config: Arc<dyn ComplianceConfigReader>,
        unit_of_work: Arc<UnitOfWork>,
        ids: Arc<dyn IdGenerator>,
        actor: &str,
    ) -> Self {
        Self {
            bank_entry_repo,
            config,
            unit_of_work,
            ledger: BankLedger::new(),
            ids,
            actor: actor.to_string(),
        }
    }

    /// 存入年度盈余
    ///
    /// # 参数
    /// - ship_id: 船舶标识
    /// - year: 合规年度
    ///
    /// # 返回
    /// - Ok(BankingResult): 存入前余额、存入金额、存入后余额 (0)
    /// - Err(AlreadyBanked): 该船该年已存入
    /// - Err(NoData): 无航线数据
    /// - Err(NoSurplus): 当前余额 <= 0
    #[instrument(skip(self))]
    pub fn bank_surplus(&self, ship_id: &str, year: i32) -> ApiResult<BankingResult> {
        let vessel_type = validate_ship_id(ship_id)?;
        let ship_id = ship_id.trim();
        validate_year(year, configured_year_range(self.config.as_ref())?)?;
        let calculator = self.config.load_calculator().map_err(ApiError::from_config)?;

        let result = self.unit_of_work.run(|conn| -> ApiResult<BankingResult> {
            if BankEntryRepository::exists_for_ship_year_tx(conn, ship_id, year)? {
                return Err(ApiError::AlreadyBanked(format!(
                    "船舶 {} 在 {} 年的盈余已存储",
                    ship_id, year
                )));
            }

            let snapshot = compute_scope_tx(conn, &calculator, ship_id, vessel_type, year)?;
            let balance = snapshot.compliance_balance;
            if balance <= 0.0 {
                return Err(ApiError::NoSurplus(format!(
                    "船舶 {} 在 {} 年余额为 {}，无盈余可存储",
                    ship_id,
                    year,
                    round_balance(balance)
                )));
            }

            let now = Utc::now();
            let entry = self
                .ledger
                .open_entry(self.ids.next_id(), ship_id, year, balance, now)?;
            let entry = BankEntryRepository::insert_tx(conn, &entry)?;

            let record = ShipCompliance {
                id: self.ids.next_id(),
                ship_id: ship_id.to_string(),
                year,
                actual_ghg_intensity: snapshot.actual_intensity,
                energy_used: snapshot.energy_used,
                compliance_balance: 0.0,
                created_at: now,
                updated_at: now,
            };
            ShipComplianceRepository::upsert_tx(conn, &record)?;

            let result = BankingResult {
                cb_before: round_balance(balance),
                banked_amount: round_balance(entry.amount),
                cb_after: 0.0,
                bank_entry_id: entry.id.clone(),
            };
            let log = ActionLog::new(self.ids.next_id(), ActionType::BankSurplus, &self.actor)
                .with_scope(ship_id, year)
                .with_payload(&result);
            ActionLogRepository::insert_tx(conn, &log)?;
            Ok(result)
        })?;

        info!(
            ship_id = %ship_id,
            year = year,
            banked = result.banked_amount,
            "盈余已存储"
        );
        Ok(result)
    }

    /// 动用存储抵扣赤字
    ///
    /// # 参数
    /// - ship_id: 船舶标识
    /// - year: 被抵扣的合规年度
    /// - amount: 动用金额 (> 0)
    ///
    /// # 返回
    /// - Err(ValidationError): amount <= 0
    /// - Err(NotFound): 合规记录不存在
    /// - Err(NoDeficit): 当前余额 >= 0
    /// - Err(InsufficientBanked): amount 超过可用合计
    ///
    /// # 说明
    /// 抵扣不做上限截断: 动用超过赤字时余额会变为正数
    #[instrument(skip(self))]
    pub fn apply_banked(&self, ship_id: &str, year: i32, amount: f64) -> ApiResult<ApplyBankingResult> {
        validate_amount(amount)?;
        validate_ship_id(ship_id)?;
        let ship_id = ship_id.trim();
        validate_year(year, configured_year_range(self.config.as_ref())?)?;

        let result = self.unit_of_work.run(|conn| -> ApiResult<ApplyBankingResult> {
            let record = ShipComplianceRepository::find_by_ship_year_tx(conn, ship_id, year)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("合规记录不存在: {}/{}", ship_id, year))
                })?;
            let cb_before = record.compliance_balance;
            if !record.has_deficit() {
                return Err(ApiError::NoDeficit(format!(
                    "船舶 {} 在 {} 年余额为 {}，无需抵扣",
                    ship_id,
                    year,
                    round_balance(cb_before)
                )));
            }

            let now = Utc::now();
            let entries = BankEntryRepository::find_available_by_ship_tx(conn, ship_id)?;
            let plan = self.ledger.plan_draw_down(&entries, amount, now)?;
            for updated in &plan.updated_entries {
                BankEntryRepository::update_applied_tx(conn, updated)?;
            }

            let cb_after = cb_before + amount;
            ShipComplianceRepository::update_balance_tx(conn, ship_id, year, cb_after, now)?;

            let result = ApplyBankingResult {
                cb_before: round_balance(cb_before),
                applied: round_balance(amount),
                cb_after: round_balance(cb_after),
                draws: plan.draws,
            };
            let log = ActionLog::new(self.ids.next_id(), ActionType::ApplyBanked, &self.actor)
                .with_scope(ship_id, year)
                .with_payload(&result);
            ActionLogRepository::insert_tx(conn, &log)?;
            Ok(result)
        })?;

        if result.cb_after > 0.0 {
            warn!(
                ship_id = %ship_id,
                year = year,
                cb_after = result.cb_after,
                "动用金额超过赤字，余额转为盈余"
            );
        }
        info!(
            ship_id = %ship_id,
            year = year,
            applied = amount,
            entries = result.draws.len(),
            "存储已动用"
        );
        Ok(result)
    }

    /// 查询船舶某年度的存储记录
    pub fn get_banking_records(&self, ship_id: &str, year: i32) -> ApiResult<Vec<BankingRecord>> {
        validate_ship_id(ship_id)?;
        validate_year(year, configured_year_range(self.config.as_ref())?)?;
        let entries = self.bank_entry_repo.find_by_ship_year(ship_id.trim(), year)?;
        Ok(entries.into_iter().map(BankingRecord::from).collect())
    }

    /// 查询船舶全部存储记录（FIFO 顺序）
    pub fn list_bank_entries(&self, ship_id: &str) -> ApiResult<Vec<BankingRecord>> {
        validate_ship_id(ship_id)?;
        let entries = self.bank_entry_repo.find_by_ship(ship_id.trim())?;
        Ok(entries.into_iter().map(BankingRecord::from).collect())
    }

    /// 船舶存储汇总（跨全部年度）
    pub fn get_bank_summary(&self, ship_id: &str) -> ApiResult<BankSummary> {
        validate_ship_id(ship_id)?;
        let ship_id = ship_id.trim();
        let total_banked = self.bank_entry_repo.sum_banked_by_ship(ship_id)?;
        let total_applied = self.bank_entry_repo.sum_applied_by_ship(ship_id)?;
        let entry_count = self.bank_entry_repo.find_by_ship(ship_id)?.len();

        Ok(BankSummary {
            ship_id: ship_id.to_string(),
            total_banked,
            total_applied,
            total_available: (total_banked - total_applied).max(0.0),
            entry_count,
        })
    }
}
