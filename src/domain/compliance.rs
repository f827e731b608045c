// ==========================================
// FuelEU 合规系统 - 船舶合规记录领域模型
// ==========================================
// 主键: (ship_id, year) 唯一
// 写入方: 合规计算 (upsert)、Banking (清零/增加)、Pooling (替换为 cb_after)
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::ComplianceStatus;

// ==========================================
// ShipCompliance - 船舶年度合规记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipCompliance {
    pub id: String,
    pub ship_id: String,
    pub year: i32,

    // ===== 计算结果 =====
    pub actual_ghg_intensity: f64, // 能量加权实际强度 (gCO2e/MJ)
    pub energy_used: f64,          // 总能量 (MJ)
    pub compliance_balance: f64,   // 合规余额 (gCO2eq)，正=盈余，负=赤字

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShipCompliance {
    /// CB >= 0 视为合规
    pub fn is_compliant(&self) -> bool {
        self.compliance_balance >= 0.0
    }

    pub fn has_surplus(&self) -> bool {
        self.compliance_balance > 0.0
    }

    pub fn has_deficit(&self) -> bool {
        self.compliance_balance < 0.0
    }

    pub fn status(&self) -> ComplianceStatus {
        ComplianceStatus::from_balance(self.compliance_balance)
    }
}
