// ==========================================
// FuelEU 合规系统 - 配置层
// ==========================================
// 职责: 合规计算参数管理（目标强度表、换算系数、年度范围）
// 存储: config_kv 表
// ==========================================

pub mod compliance_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use compliance_config_trait::ComplianceConfigReader;
pub use config_manager::{config_keys, ConfigManager};
