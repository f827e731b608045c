// ==========================================
// FuelEU 合规系统 - 目标强度表
// ==========================================
// 规则: 阶梯函数（不插值）
// - year < 首个计划年: 返回法规前基线强度
// - year >= 末个计划年: 返回末个目标（不外推）
// - 其他: 返回 <= year 的最大计划年对应目标
// ==========================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::error::{EngineError, EngineResult};

/// 法规前基线强度 (gCO2e/MJ)
pub const DEFAULT_BASELINE_INTENSITY: f64 = 91.16;

/// 默认计划表 (年度, 目标强度)
pub const DEFAULT_SCHEDULE: [(i32, f64); 6] = [
    (2025, 89.3368),
    (2030, 85.6904),
    (2035, 77.9420),
    (2040, 62.9004),
    (2045, 34.6408),
    (2050, 18.2320),
];

// ==========================================
// TargetSchedule - 目标强度表
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSchedule {
    baseline_intensity: f64,
    // 按年度升序
    steps: Vec<(i32, f64)>,
}

impl Default for TargetSchedule {
    fn default() -> Self {
        Self {
            baseline_intensity: DEFAULT_BASELINE_INTENSITY,
            steps: DEFAULT_SCHEDULE.to_vec(),
        }
    }
}

impl TargetSchedule {
    /// 由配置构建目标强度表
    ///
    /// # 参数
    /// - `baseline_intensity`: 首个计划年之前的基线强度
    /// - `steps`: (年度, 目标) 列表
    ///
    /// # 返回
    /// - Err(InvalidSchedule): 为空 / 年度非严格递增 / 目标上升 / 非正或非有限数
    pub fn new(baseline_intensity: f64, steps: Vec<(i32, f64)>) -> EngineResult<Self> {
        if !baseline_intensity.is_finite() || baseline_intensity <= 0.0 {
            return Err(EngineError::InvalidSchedule(format!(
                "基线强度必须为正: {}",
                baseline_intensity
            )));
        }
        if steps.is_empty() {
            return Err(EngineError::InvalidSchedule("计划表为空".to_string()));
        }

        for (year, target) in &steps {
            if !target.is_finite() || *target <= 0.0 {
                return Err(EngineError::InvalidSchedule(format!(
                    "{} 年目标强度必须为正: {}",
                    year, target
                )));
            }
        }

        for pair in steps.windows(2) {
            let (y0, t0) = pair[0];
            let (y1, t1) = pair[1];
            if y1 <= y0 {
                return Err(EngineError::InvalidSchedule(format!(
                    "年度必须严格递增: {} -> {}",
                    y0, y1
                )));
            }
            if t1 > t0 {
                return Err(EngineError::InvalidSchedule(format!(
                    "目标强度不得上升: {}={} -> {}={}",
                    y0, t0, y1, t1
                )));
            }
        }

        Ok(Self {
            baseline_intensity,
            steps,
        })
    }

    /// 由年度映射构建（配置中 JSON 对象的形态）
    pub fn from_map(baseline_intensity: f64, map: &BTreeMap<i32, f64>) -> EngineResult<Self> {
        Self::new(baseline_intensity, map.iter().map(|(y, t)| (*y, *t)).collect())
    }

    /// 查询年度目标强度
    pub fn target_intensity(&self, year: i32) -> f64 {
        self.steps
            .iter()
            .rev()
            .find(|(y, _)| *y <= year)
            .map(|(_, t)| *t)
            .unwrap_or(self.baseline_intensity)
    }

    pub fn baseline_intensity(&self) -> f64 {
        self.baseline_intensity
    }

    pub fn first_scheduled_year(&self) -> i32 {
        self.steps[0].0
    }

    pub fn last_scheduled_year(&self) -> i32 {
        self.steps[self.steps.len() - 1].0
    }

    pub fn steps(&self) -> &[(i32, f64)] {
        &self.steps
    }
}
