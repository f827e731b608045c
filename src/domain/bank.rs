// ==========================================
// FuelEU 合规系统 - 盈余存储条目 (Article 20 Banking)
// ==========================================
// 状态机: 不存在 → Open(applied=0) → PartiallyApplied → FullyApplied
// 红线: 0 <= applied_amount <= original_amount, amount >= 0
// 红线: 条目永不删除、永不重开、永不增加
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// BankEntryState - 条目状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankEntryState {
    Open,             // 未动用
    PartiallyApplied, // 部分动用
    FullyApplied,     // 全部动用（终态）
}

impl fmt::Display for BankEntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankEntryState::Open => write!(f, "OPEN"),
            BankEntryState::PartiallyApplied => write!(f, "PARTIALLY_APPLIED"),
            BankEntryState::FullyApplied => write!(f, "FULLY_APPLIED"),
        }
    }
}

// ==========================================
// BankEntry - 存储条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankEntry {
    pub id: String,
    /// 插入序号（数据库自增），同一时间戳下作为 FIFO 次序；未落库前为 0
    pub seq: i64,
    pub ship_id: String,
    pub year: i32,

    // ===== 金额 (gCO2eq) =====
    pub amount: f64,          // 存储金额（创建时固定）
    pub original_amount: f64, // 创建时金额的不变副本
    pub applied_amount: f64,  // 累计已动用（单调不减）

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BankEntry {
    /// 新建存储条目（applied = 0）
    ///
    /// # 返回
    /// - Err: amount 非正或非有限数
    pub fn new_banked(
        id: String,
        ship_id: &str,
        year: i32,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(format!("存储金额必须为正: {}", amount));
        }
        Ok(Self {
            id,
            seq: 0,
            ship_id: ship_id.to_string(),
            year,
            amount,
            original_amount: amount,
            applied_amount: 0.0,
            created_at: now,
            updated_at: now,
        })
    }

    /// 校验金额不变量
    pub fn validate(&self) -> Result<(), String> {
        if self.amount < 0.0 {
            return Err("存储金额不能为负".to_string());
        }
        if self.applied_amount < 0.0 {
            return Err("已动用金额不能为负".to_string());
        }
        if self.applied_amount > self.original_amount {
            return Err(format!(
                "已动用金额 {} 超过原始金额 {}",
                self.applied_amount, self.original_amount
            ));
        }
        Ok(())
    }

    /// 可用余额 = amount - applied_amount
    pub fn available_balance(&self) -> f64 {
        self.amount - self.applied_amount
    }

    pub fn has_available_balance(&self) -> bool {
        self.available_balance() > 0.0
    }

    pub fn state(&self) -> BankEntryState {
        if self.applied_amount <= 0.0 {
            BankEntryState::Open
        } else if self.available_balance() > 0.0 {
            BankEntryState::PartiallyApplied
        } else {
            BankEntryState::FullyApplied
        }
    }

    /// 动用部分金额，返回新的条目
    ///
    /// # 返回
    /// - Err: 金额非正，或超过可用余额
    pub fn apply_amount(&self, amount: f64, now: DateTime<Utc>) -> Result<Self, String> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(format!("动用金额必须为正: {}", amount));
        }
        if amount > self.available_balance() {
            return Err(format!(
                "动用金额 {} 超过条目可用余额 {}",
                amount,
                self.available_balance()
            ));
        }
        // 动用到底时钳制为 amount，避免浮点累加越过上限
        let next = Self {
            applied_amount: (self.applied_amount + amount).min(self.amount),
            updated_at: now,
            ..self.clone()
        };
        next.validate()?;
        Ok(next)
    }
}
