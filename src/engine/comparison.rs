// ==========================================
// FuelEU 合规系统 - 基线对比
// ==========================================
// percent_diff = (other / baseline - 1) × 100，保留两位小数
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::rounding::round_to;

/// 相对基线的百分比差异
pub fn percent_diff(baseline_intensity: f64, other_intensity: f64) -> EngineResult<f64> {
    if baseline_intensity == 0.0 || !baseline_intensity.is_finite() {
        return Err(EngineError::ZeroBaseline);
    }
    Ok(round_to((other_intensity / baseline_intensity - 1.0) * 100.0, 2))
}

/// 是否达标（强度不高于目标）
pub fn meets_target(ghg_intensity: f64, target_intensity: f64) -> bool {
    ghg_intensity <= target_intensity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_diff() {
        assert_eq!(percent_diff(91.0, 88.0).unwrap(), -3.3);
        assert_eq!(percent_diff(91.0, 91.0).unwrap(), 0.0);
        assert_eq!(percent_diff(80.0, 88.0).unwrap(), 10.0);
        assert_eq!(percent_diff(0.0, 88.0), Err(EngineError::ZeroBaseline));
    }

    #[test]
    fn test_meets_target() {
        assert!(meets_target(89.3368, 89.3368));
        assert!(!meets_target(89.34, 89.3368));
    }
}
