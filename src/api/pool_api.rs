// ==========================================
// FuelEU 合规系统 - 联营 (Pooling) API
// ==========================================
// 职责: 创建联营（盈余按比例转移给赤字成员）、联营查询
// 红线: 每船每年至多加入一个联营
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::api::dto::{PoolCreationResult, PoolMemberResult, PoolSummary};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{configured_year_range, validate_pool_members, validate_year};
use crate::config::ComplianceConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::ids::IdGenerator;
use crate::domain::pool::Pool;
use crate::engine::pool_allocator::{Allocation, MemberBalance, PoolAllocator};
use crate::engine::rounding::round_balance;
use crate::repository::{
    ActionLogRepository, PoolRepository, ShipComplianceRepository, UnitOfWork,
};

// ==========================================
// PoolApi - 联营 API
// ==========================================
pub struct PoolApi {
    pool_repo: Arc<PoolRepository>,
    config: Arc<dyn ComplianceConfigReader>,
    unit_of_work: Arc<UnitOfWork>,
    allocator: PoolAllocator,
    ids: Arc<dyn IdGenerator>,
    actor: String,
}

impl PoolApi {
    pub fn new(
        pool_repo: Arc<PoolRepository>,
        config: Arc<dyn ComplianceConfigReader>,
        unit_of_work: Arc<UnitOfWork>,
        ids: Arc<dyn IdGenerator>,
        actor: &str,
    ) -> Self {
        Self {
            pool_repo,
            config,
            unit_of_work,
            allocator: PoolAllocator::new(),
            ids,
            actor: actor.to_string(),
        }
    }

    /// 创建联营
    ///
    /// # 参数
    /// - year: 合规年度
    /// - ship_ids: 成员船舶（>= 2，不重复）
    ///
    /// # 返回
    /// - Ok(PoolCreationResult): 成员分配前后余额、总余额、是否有效
    /// - Err(NotFound): 成员缺少该年度合规记录
    /// - Err(AlreadyPooled): 成员已在该年度的其他联营中
    ///
    /// # 说明
    /// 总余额为负的联营仍会创建，is_valid = false
    #[instrument(skip(self))]
    pub fn create_pool(&self, year: i32, ship_ids: &[String]) -> ApiResult<PoolCreationResult> {
        validate_year(year, configured_year_range(self.config.as_ref())?)?;
        let members = validate_pool_members(ship_ids)?;

        let (pool, allocation, surplus_members) =
            self.unit_of_work.run(|conn| -> ApiResult<(Pool, Allocation, usize)> {
                let mut balances = Vec::with_capacity(members.len());
                let mut surplus_members = 0;
                for ship_id in &members {
                    let record = ShipComplianceRepository::find_by_ship_year_tx(conn, ship_id, year)?
                        .ok_or_else(|| {
                            ApiError::NotFound(format!("合规记录不存在: {}/{}", ship_id, year))
                        })?;
                    if let Some(existing) = PoolRepository::find_by_ship_year_tx(conn, ship_id, year)? {
                        return Err(ApiError::AlreadyPooled(format!(
                            "船舶 {} 已在 {} 年的联营 {} 中",
                            ship_id, year, existing.id
                        )));
                    }
                    if record.has_surplus() {
                        surplus_members += 1;
                    }
                    balances.push(MemberBalance::new(ship_id, record.compliance_balance));
                }

                let allocation = self.allocator.allocate(&balances);
                let now = Utc::now();
                let pool = Pool::create(self.ids.next_id(), year, allocation.members.clone(), now)
                    .map_err(ApiError::ValidationError)?;
                PoolRepository::insert_tx(conn, &pool)?;

                for member in &pool.members {
                    ShipComplianceRepository::update_balance_tx(
                        conn,
                        &member.ship_id,
                        year,
                        member.cb_after,
                        now,
                    )?;
                }

                let log = ActionLog::new(self.ids.next_id(), ActionType::CreatePool, &self.actor)
                    .with_year(year)
                    .with_payload(&serde_json::json!({
                        "poolId": pool.id,
                        "year": year,
                        "members": pool.members,
                        "summary": allocation.summary,
                    }))
                    .with_detail(format!("联营成员: {}", members.join(",")));
                ActionLogRepository::insert_tx(conn, &log)?;
                Ok((pool, allocation, surplus_members))
            })?;

        if !pool.is_valid() {
            warn!(
                pool_id = %pool.id,
                total = pool.total_pool_balance,
                "联营总余额为负，标记为无效"
            );
        }
        info!(
            pool_id = %pool.id,
            year = year,
            member_count = pool.member_count(),
            surplus_members = surplus_members,
            "联营已创建"
        );

        Ok(PoolCreationResult {
            pool_id: pool.id.clone(),
            year,
            members: pool.members.iter().map(PoolMemberResult::from).collect(),
            total_pool_balance: round_balance(pool.total_pool_balance),
            is_valid: pool.is_valid(),
            transfer_applied: allocation.summary.transfer_applied,
        })
    }

    /// 按ID查询联营
    pub fn get_pool(&self, pool_id: &str) -> ApiResult<PoolSummary> {
        if pool_id.trim().is_empty() {
            return Err(ApiError::ValidationError("联营ID不能为空".to_string()));
        }
        let pool = self
            .pool_repo
            .find_by_id(pool_id.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("联营不存在: {}", pool_id)))?;
        Ok(PoolSummary::from(&pool))
    }

    /// 查询年度内全部联营
    pub fn list_pools(&self, year: i32) -> ApiResult<Vec<PoolSummary>> {
        validate_year(year, configured_year_range(self.config.as_ref())?)?;
        let pools = self.pool_repo.find_by_year(year)?;
        Ok(pools.iter().map(PoolSummary::from).collect())
    }
}
