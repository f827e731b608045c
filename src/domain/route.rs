// ==========================================
// FuelEU 合规系统 - 航线领域模型
// ==========================================
// 用途: 单个航次-年度的事实记录（来源于数据导入）
// 红线: 核心逻辑只读; 唯一允许的变更是基线标记
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{FuelType, VesselType};

/// 默认接受的最早合规年度
pub const MIN_COMPLIANCE_YEAR: i32 = 2020;
/// 默认接受的最晚合规年度
pub const MAX_COMPLIANCE_YEAR: i32 = 2100;

// ==========================================
// Route - 航线记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    // ===== 标识 =====
    pub id: String,         // 内部ID (uuid)
    pub route_code: String, // 业务航线编号 (如 R001)

    // ===== 分类 =====
    pub vessel_type: VesselType, // 船型 (兼作 ship_id)
    pub fuel_type: FuelType,     // 燃料类型
    pub year: i32,               // 合规年度

    // ===== 物理量 =====
    pub ghg_intensity: f64,    // GHG 强度 (gCO2e/MJ)
    pub fuel_consumption: f64, // 燃料消耗 (t)
    pub distance: f64,         // 航程 (km)
    pub total_emissions: f64,  // 总排放 (t)

    // ===== 基线 =====
    pub is_baseline: bool, // 由 baseline_marker 派生，全系统至多一条

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    /// 船舶标识（即船型字符串）
    pub fn ship_id(&self) -> &'static str {
        self.vessel_type.as_str()
    }

    /// 计算能量 (MJ) = 燃料消耗 × 能量换算系数
    pub fn energy_in_scope(&self, energy_factor: f64) -> f64 {
        self.fuel_consumption * energy_factor
    }

    /// 校验航线记录
    ///
    /// # 返回
    /// - Ok(()): 校验通过
    /// - Err(String): 违规原因
    pub fn validate(&self) -> Result<(), String> {
        self.validate_within(MIN_COMPLIANCE_YEAR, MAX_COMPLIANCE_YEAR)
    }

    /// 按给定年度范围校验（范围通常来自配置）
    pub fn validate_within(&self, min_year: i32, max_year: i32) -> Result<(), String> {
        if self.route_code.trim().is_empty() {
            return Err("航线编号不能为空".to_string());
        }
        if !self.ghg_intensity.is_finite() || self.ghg_intensity < 0.0 {
            return Err(format!("GHG 强度不能为负: {}", self.ghg_intensity));
        }
        if !self.fuel_consumption.is_finite() || self.fuel_consumption < 0.0 {
            return Err(format!("燃料消耗不能为负: {}", self.fuel_consumption));
        }
        if !self.distance.is_finite() || self.distance <= 0.0 {
            return Err(format!("航程必须为正: {}", self.distance));
        }
        if !self.total_emissions.is_finite() || self.total_emissions < 0.0 {
            return Err(format!("总排放不能为负: {}", self.total_emissions));
        }
        if self.year < min_year || self.year > max_year {
            return Err(format!(
                "年度必须在 {} 到 {} 之间: {}",
                min_year, max_year, self.year
            ));
        }
        Ok(())
    }
}

// ==========================================
// RouteFilter - 航线查询条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteFilter {
    pub vessel_type: Option<VesselType>,
    pub fuel_type: Option<FuelType>,
    pub year: Option<i32>,
}

impl RouteFilter {
    /// 指定船舶与年度的合规范围
    pub fn scope(vessel_type: VesselType, year: i32) -> Self {
        Self {
            vessel_type: Some(vessel_type),
            fuel_type: None,
            year: Some(year),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vessel_type.is_none() && self.fuel_type.is_none() && self.year.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_route() -> Route {
        Route {
            id: "r-1".to_string(),
            route_code: "R001".to_string(),
            vessel_type: VesselType::Container,
            fuel_type: FuelType::Hfo,
            year: 2025,
            ghg_intensity: 91.0,
            fuel_consumption: 5000.0,
            distance: 12000.0,
            total_emissions: 4500.0,
            is_baseline: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_energy_in_scope() {
        let route = sample_route();
        assert_eq!(route.energy_in_scope(41_000.0), 205_000_000.0);
    }

    #[test]
    fn test_validate_rejects_bad_quantities() {
        assert!(sample_route().validate().is_ok());

        let mut r = sample_route();
        r.ghg_intensity = -1.0;
        assert!(r.validate().is_err());

        let mut r = sample_route();
        r.distance = 0.0;
        assert!(r.validate().is_err());

        let mut r = sample_route();
        r.year = 2019;
        assert!(r.validate().unwrap_err().contains("2019"));

        let mut r = sample_route();
        r.route_code = "  ".to_string();
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_validate_within_configured_years() {
        let mut r = sample_route();
        r.year = 2120;
        assert!(r.validate().is_err());
        assert!(r.validate_within(2020, 2150).is_ok());
        assert!(r.validate_within(2020, 2119).is_err());
    }

    #[test]
    fn test_filter_scope() {
        let f = RouteFilter::scope(VesselType::Tanker, 2030);
        assert!(!f.is_empty());
        assert!(RouteFilter::default().is_empty());
    }
}
