// ==========================================
// FuelEU 合规系统 - API 结果对象
// ==========================================
// 职责: 对外返回的结果结构（camelCase 序列化）
// 约定: 余额类数值在此处取整，存储与计算保持原始精度
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::bank::{BankEntry, BankEntryState};
use crate::domain::pool::{Pool, PoolMember};
use crate::domain::route::Route;
use crate::domain::types::{FuelType, VesselType};
use crate::engine::bank_ledger::EntryDraw;
use crate::engine::compliance_calculator::ComplianceSnapshot;
use crate::engine::rounding::{round_balance, round_intensity};

// ==========================================
// 合规余额
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceBalanceResult {
    pub ship_id: String,
    pub year: i32,
    pub actual_ghg_intensity: f64,
    pub target_ghg_intensity: f64,
    pub energy_used: f64,
    pub compliance_balance: f64,
    pub is_compliant: bool,
}

impl ComplianceBalanceResult {
    pub fn from_snapshot(ship_id: &str, snapshot: &ComplianceSnapshot) -> Self {
        Self {
            ship_id: ship_id.to_string(),
            year: snapshot.year,
            actual_ghg_intensity: round_intensity(snapshot.actual_intensity),
            target_ghg_intensity: snapshot.target_intensity,
            energy_used: snapshot.energy_used,
            compliance_balance: round_balance(snapshot.compliance_balance),
            is_compliant: snapshot.is_compliant(),
        }
    }
}

/// 调整后余额（计入已动用的存储）
///
/// `is_compliant` 以调整后余额判定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustedComplianceBalanceResult {
    pub ship_id: String,
    pub year: i32,
    pub actual_ghg_intensity: f64,
    pub target_ghg_intensity: f64,
    pub energy_used: f64,
    pub compliance_balance: f64,
    pub banked_applied: f64,
    pub adjusted_balance: f64,
    pub is_compliant: bool,
}

// ==========================================
// 存储 (Banking)
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankingResult {
    pub cb_before: f64,
    pub banked_amount: f64,
    pub cb_after: f64,
    pub bank_entry_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyBankingResult {
    pub cb_before: f64,
    pub applied: f64,
    pub cb_after: f64,
    /// 按 FIFO 顺序动用的条目明细
    pub draws: Vec<EntryDraw>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankingRecord {
    pub id: String,
    pub ship_id: String,
    pub year: i32,
    pub amount: f64,
    pub applied_amount: f64,
    pub available_balance: f64,
    pub state: BankEntryState,
    pub created_at: DateTime<Utc>,
}

impl From<BankEntry> for BankingRecord {
    fn from(entry: BankEntry) -> Self {
        let available_balance = entry.available_balance();
        let state = entry.state();
        Self {
            id: entry.id,
            ship_id: entry.ship_id,
            year: entry.year,
            amount: entry.amount,
            applied_amount: entry.applied_amount,
            available_balance,
            state,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSummary {
    pub ship_id: String,
    pub total_banked: f64,
    pub total_applied: f64,
    pub total_available: f64,
    pub entry_count: usize,
}

// ==========================================
// 联营 (Pooling)
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMemberResult {
    pub ship_id: String,
    pub cb_before: f64,
    pub cb_after: f64,
}

impl From<&PoolMember> for PoolMemberResult {
    fn from(member: &PoolMember) -> Self {
        Self {
            ship_id: member.ship_id.clone(),
            cb_before: round_balance(member.cb_before),
            cb_after: round_balance(member.cb_after),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolCreationResult {
    pub pool_id: String,
    pub year: i32,
    pub members: Vec<PoolMemberResult>,
    pub total_pool_balance: f64,
    pub is_valid: bool,
    /// 是否发生了盈余转移（无盈余时为 false）
    pub transfer_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSummary {
    pub pool_id: String,
    pub year: i32,
    pub members: Vec<PoolMemberResult>,
    pub total_pool_balance: f64,
    pub is_valid: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Pool> for PoolSummary {
    fn from(pool: &Pool) -> Self {
        Self {
            pool_id: pool.id.clone(),
            year: pool.year,
            members: pool.members.iter().map(PoolMemberResult::from).collect(),
            total_pool_balance: round_balance(pool.total_pool_balance),
            is_valid: pool.is_valid(),
            created_at: pool.created_at,
        }
    }
}

// ==========================================
// 航线与对比
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRoute {
    pub route: Route,
    pub percent_diff: f64,
    pub compliant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteComparisonResult {
    pub baseline_route: Route,
    pub comparison_routes: Vec<ComparisonRoute>,
    pub target_intensity: f64,
    pub reference_year: i32,
}

/// 新建/修改航线的输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInput {
    pub route_code: String,
    pub vessel_type: VesselType,
    pub fuel_type: FuelType,
    pub year: i32,
    pub ghg_intensity: f64,
    pub fuel_consumption: f64,
    pub distance: f64,
    pub total_emissions: f64,
}

impl RouteInput {
    /// 生成航线记录（不含基线标记）
    pub fn into_route(self, id: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Route {
        Route {
            id,
            route_code: self.route_code.trim().to_string(),
            vessel_type: self.vessel_type,
            fuel_type: self.fuel_type,
            year: self.year,
            ghg_intensity: self.ghg_intensity,
            fuel_consumption: self.fuel_consumption,
            distance: self.distance,
            total_emissions: self.total_emissions,
            is_baseline: false,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ComplianceSnapshot {
        ComplianceSnapshot {
            year: 2025,
            actual_intensity: 88.004,
            target_intensity: 89.3368,
            energy_used: 205_000_000.0,
            total_fuel_consumption: 5000.0,
            compliance_balance: 274_043_999.6,
            route_count: 1,
        }
    }

    #[test]
    fn test_balance_result_rounding() {
        let result = ComplianceBalanceResult::from_snapshot("BulkCarrier", &snapshot());
        assert_eq!(result.actual_ghg_intensity, 88.0);
        assert_eq!(result.target_ghg_intensity, 89.3368);
        assert_eq!(result.compliance_balance, 274_044_000.0);
        assert!(result.is_compliant);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["shipId"], "BulkCarrier");
        assert!(json.get("complianceBalance").is_some());
        assert!(json.get("isCompliant").is_some());
    }

    #[test]
    fn test_banking_record_from_entry() {
        let now = Utc::now();
        let entry = BankEntry::new_banked("b-1".to_string(), "Tanker", 2024, 1000.0, now)
            .unwrap()
            .apply_amount(400.0, now)
            .unwrap();
        let record = BankingRecord::from(entry);
        assert_eq!(record.available_balance, 600.0);
        assert_eq!(record.state, BankEntryState::PartiallyApplied);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["appliedAmount"], 400.0);
    }
}
