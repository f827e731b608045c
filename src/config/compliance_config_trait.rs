// ==========================================
// FuelEU 合规系统 - 合规配置读取 Trait
// ==========================================
// 职责: 定义合规计算所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use std::collections::BTreeMap;
use std::error::Error;

use crate::engine::compliance_calculator::ComplianceCalculator;
use crate::engine::target_schedule::TargetSchedule;

// ==========================================
// ComplianceConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ComplianceConfigReader: Send + Sync {
    // ===== 目标强度 =====

    /// 法规前基线强度
    ///
    /// # 默认值
    /// - 91.16
    fn get_baseline_intensity(&self) -> Result<f64, Box<dyn Error>>;

    /// 目标强度计划表（年度 → 目标）
    ///
    /// # 默认值
    /// - 2025..2050 每五年一档
    fn get_target_schedule_map(&self) -> Result<BTreeMap<i32, f64>, Box<dyn Error>>;

    // ===== 计算参数 =====

    /// 燃料能量换算系数 (MJ/t)
    ///
    /// # 默认值
    /// - 41000
    fn get_energy_conversion_factor(&self) -> Result<f64, Box<dyn Error>>;

    /// 对比视图使用的目标年度
    ///
    /// # 默认值
    /// - 2025
    fn get_comparison_reference_year(&self) -> Result<i32, Box<dyn Error>>;

    // ===== 输入校验 =====

    /// 接受的最早年度（默认 2020）
    fn get_min_compliance_year(&self) -> Result<i32, Box<dyn Error>>;

    /// 接受的最晚年度（默认 2100）
    fn get_max_compliance_year(&self) -> Result<i32, Box<dyn Error>>;

    // ===== 组合 =====

    /// 构建并校验目标强度表
    ///
    /// # 返回
    /// - Err: 配置的计划表未通过校验 (InvalidSchedule)
    fn load_target_schedule(&self) -> Result<TargetSchedule, Box<dyn Error>> {
        let baseline = self.get_baseline_intensity()?;
        let map = self.get_target_schedule_map()?;
        Ok(TargetSchedule::from_map(baseline, &map)?)
    }

    /// 按当前配置构建合规计算引擎
    fn load_calculator(&self) -> Result<ComplianceCalculator, Box<dyn Error>> {
        let schedule = self.load_target_schedule()?;
        let factor = self.get_energy_conversion_factor()?;
        Ok(ComplianceCalculator::new(schedule, factor))
    }
}
