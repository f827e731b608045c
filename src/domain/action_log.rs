// ==========================================
// FuelEU 合规系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录（与业务写入处于同一事务）
// 用途: 审计追踪
// 对齐: v0.1_init.sql action_log 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String,        // 操作类型 (存储为字符串)
    pub action_ts: DateTime<Utc>,   // 操作时间戳
    pub actor: String,              // 操作人
    pub ship_id: Option<String>,    // 关联船舶（设置基线等操作可为None）
    pub year: Option<i32>,          // 关联年度
    pub payload_json: Option<JsonValue>, // 操作参数/结果 (JSON)
    pub detail: Option<String>,     // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    ComputeBalance, // 计算合规余额
    BankSurplus,    // 存储盈余
    ApplyBanked,    // 动用存储
    CreatePool,     // 创建联营
    SetBaseline,    // 设置基线航线
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::ComputeBalance => "ComputeBalance",
            ActionType::BankSurplus => "BankSurplus",
            ActionType::ApplyBanked => "ApplyBanked",
            ActionType::CreatePool => "CreatePool",
            ActionType::SetBaseline => "SetBaseline",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ComputeBalance" => Some(ActionType::ComputeBalance),
            "BankSurplus" => Some(ActionType::BankSurplus),
            "ApplyBanked" => Some(ActionType::ApplyBanked),
            "CreatePool" => Some(ActionType::CreatePool),
            "SetBaseline" => Some(ActionType::SetBaseline),
            _ => None,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// ActionLog 辅助方法
// ==========================================
impl ActionLog {
    /// 创建新的操作日志
    ///
    /// # 参数
    /// - `action_id`: 日志ID (通常使用UUID)
    /// - `action_type`: 操作类型
    /// - `actor`: 操作人
    pub fn new(action_id: String, action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id,
            action_type: action_type.as_str().to_string(),
            action_ts: Utc::now(),
            actor: actor.to_string(),
            ship_id: None,
            year: None,
            payload_json: None,
            detail: None,
        }
    }

    /// 设置关联船舶与年度
    pub fn with_scope(mut self, ship_id: &str, year: i32) -> Self {
        self.ship_id = Some(ship_id.to_string());
        self.year = Some(year);
        self
    }

    /// 只设置年度（联营等跨船舶操作）
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn action_type(&self) -> Option<ActionType> {
        ActionType::from_str(&self.action_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_roundtrip() {
        for t in [
            ActionType::ComputeBalance,
            ActionType::BankSurplus,
            ActionType::ApplyBanked,
            ActionType::CreatePool,
            ActionType::SetBaseline,
        ] {
            assert_eq!(ActionType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(ActionType::from_str("Recalc"), None);
    }

    #[test]
    fn test_builder() {
        let log = ActionLog::new("a-1".to_string(), ActionType::BankSurplus, "system")
            .with_scope("Tanker", 2025)
            .with_payload(&serde_json::json!({"amount": 10.0}))
            .with_detail("banked");
        assert_eq!(log.action_type(), Some(ActionType::BankSurplus));
        assert_eq!(log.ship_id.as_deref(), Some("Tanker"));
        assert_eq!(log.year, Some(2025));
        assert_eq!(log.payload_json.unwrap()["amount"], 10.0);
    }
}
