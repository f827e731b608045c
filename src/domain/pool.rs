// ==========================================
// FuelEU 合规系统 - 联营领域模型 (Article 21 Pooling)
// ==========================================
// 红线: 联营创建后不可变（无增删成员）
// 红线: 同一船舶同一年度至多属于一个联营
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 联营最少成员数
pub const MIN_POOL_MEMBERS: usize = 2;

// ==========================================
// PoolMember - 联营成员
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMember {
    pub ship_id: String,
    pub cb_before: f64, // 分配前余额
    pub cb_after: f64,  // 分配后余额
}

// ==========================================
// Pool - 联营
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub year: i32,
    pub members: Vec<PoolMember>,
    /// 创建时 Σ cb_before，之后冻结
    pub total_pool_balance: f64,
    pub created_at: DateTime<Utc>,
}

impl Pool {
    /// 由已分配成员构建联营
    ///
    /// # 返回
    /// - Err: 成员数不足
    pub fn create(
        id: String,
        year: i32,
        members: Vec<PoolMember>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        if members.len() < MIN_POOL_MEMBERS {
            return Err(format!(
                "联营至少需要 {} 个成员，实际 {}",
                MIN_POOL_MEMBERS,
                members.len()
            ));
        }
        let total_pool_balance = members.iter().map(|m| m.cb_before).sum();
        Ok(Self {
            id,
            year,
            members,
            total_pool_balance,
            created_at,
        })
    }

    /// 联营有效性: Σ cb_before >= 0
    ///
    /// 注意: 无效联营仍允许创建，仅作标记
    pub fn is_valid(&self) -> bool {
        self.total_pool_balance >= 0.0
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(ship: &str, before: f64, after: f64) -> PoolMember {
        PoolMember {
            ship_id: ship.to_string(),
            cb_before: before,
            cb_after: after,
        }
    }

    #[test]
    fn test_total_balance_and_validity() {
        let pool = Pool::create(
            "p-1".to_string(),
            2025,
            vec![member("S1", 100.0, 60.0), member("S2", -40.0, 0.0)],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(pool.total_pool_balance, 60.0);
        assert!(pool.is_valid());
        assert_eq!(pool.member_count(), 2);
    }

    #[test]
    fn test_negative_pool_is_flagged_invalid() {
        let pool = Pool::create(
            "p-2".to_string(),
            2025,
            vec![member("S1", 10.0, 0.0), member("S2", -40.0, -30.0)],
            Utc::now(),
        )
        .unwrap();
        assert!(!pool.is_valid());
    }

    #[test]
    fn test_single_member_rejected() {
        let err = Pool::create("p".to_string(), 2025, vec![member("S1", 1.0, 1.0)], Utc::now())
            .unwrap_err();
        assert!(err.contains("至少"));
    }
}
