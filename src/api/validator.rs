// ==========================================
// FuelEU 合规系统 - 输入校验器
// ==========================================
// 职责: 在任何写入之前拒绝格式错误的输入
// 年度范围来自配置（min/max_compliance_year）
// ==========================================

use std::collections::HashSet;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ComplianceConfigReader;
use crate::domain::pool::MIN_POOL_MEMBERS;
use crate::domain::types::VesselType;

// ==========================================
// YearRange - 接受的年度范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(
            crate::domain::route::MIN_COMPLIANCE_YEAR,
            crate::domain::route::MAX_COMPLIANCE_YEAR,
        )
    }
}

/// 从配置读取接受的年度范围
pub fn configured_year_range(config: &dyn ComplianceConfigReader) -> ApiResult<YearRange> {
    let min = config.get_min_compliance_year().map_err(ApiError::from_config)?;
    let max = config.get_max_compliance_year().map_err(ApiError::from_config)?;
    if min > max {
        return Err(ApiError::InternalError(format!(
            "年度范围配置无效: {} > {}",
            min, max
        )));
    }
    Ok(YearRange::new(min, max))
}

/// 校验船舶标识（非空）并解析为船型
///
/// # 返回
/// - Ok(Some): 已知船型
/// - Ok(None): 非空但未知（调用方按“无数据”处理）
pub fn validate_ship_id(ship_id: &str) -> ApiResult<Option<VesselType>> {
    let trimmed = ship_id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::ValidationError("船舶标识不能为空".to_string()));
    }
    Ok(trimmed.parse::<VesselType>().ok())
}

/// 校验年度在接受范围内
pub fn validate_year(year: i32, range: YearRange) -> ApiResult<()> {
    if year < range.min || year > range.max {
        return Err(ApiError::ValidationError(format!(
            "年度 {} 超出接受范围 {}..={}",
            year, range.min, range.max
        )));
    }
    Ok(())
}

/// 校验金额为有限正数
pub fn validate_amount(amount: f64) -> ApiResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::ValidationError(format!("金额必须为正数: {}", amount)));
    }
    Ok(())
}

/// 校验联营成员列表
///
/// 规则:
/// 1) 至少 2 个成员
/// 2) 成员标识非空
/// 3) 无重复
///
/// # 返回
/// 去除首尾空白后的成员标识（保持输入顺序）
pub fn validate_pool_members(ship_ids: &[String]) -> ApiResult<Vec<String>> {
    if ship_ids.len() < MIN_POOL_MEMBERS {
        return Err(ApiError::ValidationError(format!(
            "联营至少需要 {} 个成员，实际 {}",
            MIN_POOL_MEMBERS,
            ship_ids.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut members = Vec::with_capacity(ship_ids.len());
    for raw in ship_ids {
        let id = raw.trim();
        if id.is_empty() {
            return Err(ApiError::ValidationError("联营成员标识不能为空".to_string()));
        }
        if !seen.insert(id.to_string()) {
            return Err(ApiError::ValidationError(format!("联营成员重复: {}", id)));
        }
        members.push(id.to_string());
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ship_id() {
        assert!(matches!(validate_ship_id("  "), Err(ApiError::ValidationError(_))));
        assert_eq!(validate_ship_id("Tanker").unwrap(), Some(VesselType::Tanker));
        assert_eq!(validate_ship_id("Unknown").unwrap(), None);
    }

    #[test]
    fn test_year_range() {
        let range = YearRange::default();
        assert!(validate_year(2020, range).is_ok());
        assert!(validate_year(2100, range).is_ok());
        assert!(validate_year(2019, range).is_err());
        assert!(validate_year(2101, range).is_err());
    }

    #[test]
    fn test_amount() {
        assert!(validate_amount(0.5).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-3.0).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_pool_members() {
        let one = vec!["Tanker".to_string()];
        assert!(validate_pool_members(&one).is_err());

        let dup = vec!["Tanker".to_string(), " Tanker ".to_string()];
        let err = validate_pool_members(&dup).unwrap_err();
        assert!(err.to_string().contains("重复"));

        let ok = vec!["Tanker".to_string(), "RoRo".to_string()];
        assert_eq!(validate_pool_members(&ok).unwrap(), ok);
    }
}
