// ==========================================
// FuelEU 合规系统 - 合规余额计算引擎
// ==========================================
// 公式:
// - energy(r) = fuel_consumption(r) × ENERGY_FACTOR
// - actual = Σ(ghg(r) × energy(r)) / Σ energy(r)
// - CB = (target(year) - actual) × Σ fuel × ENERGY_FACTOR
// 符号: 正 = 低于目标 = 盈余; 负 = 高于目标 = 赤字
// ==========================================
// 职责: 纯计算，不落库（落库由 api 层 upsert）
// ==========================================

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::route::Route;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::target_schedule::TargetSchedule;

/// 燃料能量换算系数 (MJ/t)
pub const ENERGY_FACTOR: f64 = 41_000.0;

// ==========================================
// ComplianceSnapshot - 计算结果（未取整）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSnapshot {
    pub year: i32,
    pub actual_intensity: f64,
    pub target_intensity: f64,
    pub energy_used: f64,
    pub total_fuel_consumption: f64,
    pub compliance_balance: f64,
    pub route_count: usize,
}

impl ComplianceSnapshot {
    pub fn is_compliant(&self) -> bool {
        self.compliance_balance >= 0.0
    }
}

// ==========================================
// ComplianceCalculator - 合规计算引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct ComplianceCalculator {
    schedule: TargetSchedule,
    energy_factor: f64,
}

impl Default for ComplianceCalculator {
    fn default() -> Self {
        Self::new(TargetSchedule::default(), ENERGY_FACTOR)
    }
}

impl ComplianceCalculator {
    pub fn new(schedule: TargetSchedule, energy_factor: f64) -> Self {
        Self {
            schedule,
            energy_factor,
        }
    }

    pub fn schedule(&self) -> &TargetSchedule {
        &self.schedule
    }

    pub fn energy_factor(&self) -> f64 {
        self.energy_factor
    }

    /// 目标强度查询
    pub fn target_intensity(&self, year: i32) -> f64 {
        self.schedule.target_intensity(year)
    }

    /// 计算合规余额
    ///
    /// # 参数
    /// - `routes`: 计算范围内的航线（调用方已按船舶/年度过滤）
    /// - `year`: 合规年度（决定目标强度）
    ///
    /// # 返回
    /// - Err(NoRoutes): 航线集合为空
    /// - Err(ZeroEnergy): 总能量为零
    #[instrument(skip(self, routes), fields(year = %year, route_count = routes.len()))]
    pub fn compute_balance(&self, routes: &[Route], year: i32) -> EngineResult<ComplianceSnapshot> {
        if routes.is_empty() {
            return Err(EngineError::NoRoutes);
        }

        let mut total_energy = 0.0;
        let mut weighted_intensity = 0.0;
        let mut total_fuel = 0.0;
        for route in routes {
            let energy = route.energy_in_scope(self.energy_factor);
            total_energy += energy;
            weighted_intensity += route.ghg_intensity * energy;
            total_fuel += route.fuel_consumption;
        }

        if total_energy <= 0.0 {
            return Err(EngineError::ZeroEnergy);
        }

        let actual_intensity = weighted_intensity / total_energy;
        let target_intensity = self.target_intensity(year);
        let compliance_balance =
            (target_intensity - actual_intensity) * total_fuel * self.energy_factor;

        Ok(ComplianceSnapshot {
            year,
            actual_intensity,
            target_intensity,
            energy_used: total_energy,
            total_fuel_consumption: total_fuel,
            compliance_balance,
            route_count: routes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{FuelType, VesselType};
    use chrono::Utc;

    fn route(code: &str, ghg: f64, fuel: f64, year: i32) -> Route {
        Route {
            id: code.to_lowercase(),
            route_code: code.to_string(),
            vessel_type: VesselType::BulkCarrier,
            fuel_type: FuelType::Lng,
            year,
            ghg_intensity: ghg,
            fuel_consumption: fuel,
            distance: 10_000.0,
            total_emissions: 1_000.0,
            is_baseline: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_single_route_surplus() {
        let calc = ComplianceCalculator::default();
        let snap = calc.compute_balance(&[route("R1", 88.0, 5000.0, 2025)], 2025).unwrap();
        assert_eq!(snap.actual_intensity, 88.0);
        assert_eq!(snap.target_intensity, 89.3368);
        assert_eq!(snap.energy_used, 205_000_000.0);
        assert!((snap.compliance_balance - 274_044_000.0).abs() < 1e-3);
        assert!(snap.is_compliant());
    }

    #[test]
    fn test_energy_weighted_average() {
        let calc = ComplianceCalculator::default();
        let routes = [route("R1", 90.0, 1000.0, 2025), route("R2", 80.0, 3000.0, 2025)];
        let snap = calc.compute_balance(&routes, 2025).unwrap();
        assert!((snap.actual_intensity - 82.5).abs() < 1e-9);
        assert_eq!(snap.total_fuel_consumption, 4000.0);
        assert_eq!(snap.route_count, 2);
    }

    #[test]
    fn test_sign_convention() {
        let calc = ComplianceCalculator::default();
        let above = calc.compute_balance(&[route("R1", 95.0, 10.0, 2025)], 2025).unwrap();
        assert!(above.compliance_balance < 0.0);
        assert!(!above.is_compliant());

        let exact = calc.compute_balance(&[route("R1", 91.16, 10.0, 2024)], 2024).unwrap();
        assert_eq!(exact.compliance_balance, 0.0);
        assert!(exact.is_compliant());
    }

    #[test]
    fn test_empty_and_zero_energy() {
        let calc = ComplianceCalculator::default();
        assert_eq!(calc.compute_balance(&[], 2025), Err(EngineError::NoRoutes));
        assert_eq!(
            calc.compute_balance(&[route("R1", 90.0, 0.0, 2025)], 2025),
            Err(EngineError::ZeroEnergy)
        );
    }
}
