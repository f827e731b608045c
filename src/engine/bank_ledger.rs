// ==========================================
// FuelEU 合规系统 - 存储台账引擎 (Article 20)
// ==========================================
// 职责: 开立条目 + FIFO 动用规划（纯逻辑，不落库）
// 规则:
// - 同一船舶所有年度的条目组成一条队列，按 (created_at, seq) 最早优先
// - 依次动用 min(条目可用, 剩余待动用)，剩余为零即停止
// - 内部运算不取整
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::bank::BankEntry;
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// EntryDraw - 单条目动用明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraw {
    pub entry_id: String,
    pub year: i32,
    pub drawn: f64,
    pub remaining_in_entry: f64,
}

// ==========================================
// DrawDownPlan - 动用规划
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct DrawDownPlan {
    pub requested: f64,
    pub total_available: f64,
    pub draws: Vec<EntryDraw>,
    /// 动用后的条目（仅包含被动用的条目，顺序同 draws）
    pub updated_entries: Vec<BankEntry>,
}

impl DrawDownPlan {
    pub fn total_drawn(&self) -> f64 {
        self.draws.iter().map(|d| d.drawn).sum()
    }
}

// ==========================================
// BankLedger - 存储台账
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct BankLedger;

impl BankLedger {
    pub fn new() -> Self {
        Self
    }

    /// 由正余额开立新条目
    ///
    /// # 返回
    /// - Err(NoSurplus): 余额 <= 0
    pub fn open_entry(
        &self,
        id: String,
        ship_id: &str,
        year: i32,
        balance: f64,
        now: DateTime<Utc>,
    ) -> EngineResult<BankEntry> {
        if balance.is_nan() || balance <= 0.0 {
            return Err(EngineError::NoSurplus(balance));
        }
        BankEntry::new_banked(id, ship_id, year, balance, now).map_err(EngineError::Invalid)
    }

    /// 可用余额合计
    pub fn total_available(entries: &[BankEntry]) -> f64 {
        entries
            .iter()
            .filter(|e| e.has_available_balance())
            .map(|e| e.available_balance())
            .sum()
    }

    /// FIFO 动用规划
    ///
    /// # 参数
    /// - `entries`: 船舶的存储条目（任意顺序，内部重排）
    /// - `amount`: 请求动用金额
    /// - `now`: 更新时间戳
    ///
    /// # 返回
    /// - Err(NonPositiveAmount): amount <= 0
    /// - Err(InsufficientBanked): amount > Σ 可用
    #[instrument(skip(self, entries, now), fields(entry_count = entries.len(), amount = %amount))]
    pub fn plan_draw_down(
        &self,
        entries: &[BankEntry],
        amount: f64,
        now: DateTime<Utc>,
    ) -> EngineResult<DrawDownPlan> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(EngineError::NonPositiveAmount(amount));
        }

        let mut queue: Vec<&BankEntry> =
            entries.iter().filter(|e| e.has_available_balance()).collect();
        queue.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.seq.cmp(&b.seq)));

        let total_available: f64 = queue.iter().map(|e| e.available_balance()).sum();
        if amount > total_available {
            return Err(EngineError::InsufficientBanked {
                requested: amount,
                available: total_available,
            });
        }

        let mut remaining = amount;
        let mut draws = Vec::new();
        let mut updated_entries = Vec::new();

        for entry in queue {
            if remaining <= 0.0 {
                break;
            }
            let available = entry.available_balance();
            let draw = available.min(remaining);
            let updated = entry.apply_amount(draw, now).map_err(EngineError::Invalid)?;

            debug!(
                entry_id = %entry.id,
                year = entry.year,
                drawn = draw,
                remaining_in_entry = updated.available_balance(),
                "FIFO 动用条目"
            );

            draws.push(EntryDraw {
                entry_id: entry.id.clone(),
                year: entry.year,
                drawn: draw,
                remaining_in_entry: updated.available_balance(),
            });
            updated_entries.push(updated);
            remaining -= draw;
        }

        Ok(DrawDownPlan {
            requested: amount,
            total_available,
            draws,
            updated_entries,
        })
    }
}
