// ==========================================
// FuelEU 合规系统 - 联营分配引擎 (Article 21)
// ==========================================
// 算法（确定性、贪心、按比例）:
// 1. 按 cb_before 降序稳定排序
// 2. S = Σ max(cb, 0); D = Σ max(-cb, 0)
// 3. D == 0: 不转移
// 4. S == 0 且 D > 0: 不转移（记录告警）
// 5. ratio = min(D / S, 1)
// 6. 盈余成员: cb × (1 - ratio)
// 7. 赤字成员: cb + min(S, D) × |cb| / D
// 8. 零余额成员: 不变
// 红线: Σ cb_after == Σ cb_before（守恒）
// ==========================================
// 前置条件（由 api 层校验）: 成员 >= 2, 无重复, 未入其他联营
// ==========================================

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::domain::pool::PoolMember;

// ==========================================
// MemberBalance - 分配输入
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBalance {
    pub ship_id: String,
    pub cb_before: f64,
}

impl MemberBalance {
    pub fn new(ship_id: &str, cb_before: f64) -> Self {
        Self {
            ship_id: ship_id.to_string(),
            cb_before,
        }
    }
}

// ==========================================
// AllocationSummary - 分配汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSummary {
    pub total_surplus: f64,
    pub total_deficit: f64,
    pub transfer_ratio: f64,
    pub transfer_applied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// 按降序排序后的成员
    pub members: Vec<PoolMember>,
    pub summary: AllocationSummary,
}

// ==========================================
// PoolAllocator - 联营分配引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolAllocator;

impl PoolAllocator {
    pub fn new() -> Self {
        Self
    }

    /// 执行分配
    ///
    /// # 参数
    /// - `members`: 各船舶分配前余额
    ///
    /// # 返回
    /// 排序后的成员（含 cb_after）与汇总
    #[instrument(skip(self, members), fields(member_count = members.len()))]
    pub fn allocate(&self, members: &[MemberBalance]) -> Allocation {
        let mut sorted: Vec<&MemberBalance> = members.iter().collect();
        // sort_by 为稳定排序，相等时保持输入顺序
        sorted.sort_by(|a, b| b.cb_before.total_cmp(&a.cb_before));

        let total_surplus: f64 = sorted.iter().map(|m| m.cb_before.max(0.0)).sum();
        let total_deficit: f64 = sorted.iter().map(|m| (-m.cb_before).max(0.0)).sum();

        let unchanged = |sorted: &[&MemberBalance]| -> Vec<PoolMember> {
            sorted
                .iter()
                .map(|m| PoolMember {
                    ship_id: m.ship_id.clone(),
                    cb_before: m.cb_before,
                    cb_after: m.cb_before,
                })
                .collect()
        };

        if total_deficit == 0.0 {
            return Allocation {
                members: unchanged(&sorted),
                summary: AllocationSummary {
                    total_surplus,
                    total_deficit,
                    transfer_ratio: 0.0,
                    transfer_applied: false,
                },
            };
        }

        if total_surplus == 0.0 {
            warn!(
                total_deficit = total_deficit,
                "联营内无盈余成员，跳过余额转移"
            );
            return Allocation {
                members: unchanged(&sorted),
                summary: AllocationSummary {
                    total_surplus,
                    total_deficit,
                    transfer_ratio: 0.0,
                    transfer_applied: false,
                },
            };
        }

        let transfer_ratio = (total_deficit / total_surplus).min(1.0);
        let transferable = total_surplus.min(total_deficit);

        let allocated = sorted
            .iter()
            .map(|m| {
                let cb = m.cb_before;
                let cb_after = if cb > 0.0 {
                    cb - cb * transfer_ratio
                } else if cb < 0.0 {
                    cb + transferable * (cb.abs() / total_deficit)
                } else {
                    cb
                };
                PoolMember {
                    ship_id: m.ship_id.clone(),
                    cb_before: cb,
                    cb_after,
                }
            })
            .collect();

        Allocation {
            members: allocated,
            summary: AllocationSummary {
                total_surplus,
                total_deficit,
                transfer_ratio,
                transfer_applied: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn after(alloc: &Allocation, ship: &str) -> f64 {
        alloc
            .members
            .iter()
            .find(|m| m.ship_id == ship)
            .map(|m| m.cb_after)
            .unwrap()
    }

    #[test]
    fn test_full_coverage() {
        let alloc = PoolAllocator::new().allocate(&[
            MemberBalance::new("S1", 1_000_000.0),
            MemberBalance::new("S2", -400_000.0),
        ]);
        assert_eq!(after(&alloc, "S2"), 0.0);
        assert_eq!(after(&alloc, "S1"), 600_000.0);
        assert!((alloc.summary.transfer_ratio - 0.4).abs() < 1e-12);
        assert!(alloc.summary.transfer_applied);
    }

    #[test]
    fn test_single_surplus_source_half() {
        let alloc = PoolAllocator::new().allocate(&[
            MemberBalance::new("S2", -500_000.0),
            MemberBalance::new("S1", 1_000_000.0),
        ]);
        assert_eq!(alloc.members[0].ship_id, "S1");
        assert_eq!(after(&alloc, "S1"), 500_000.0);
        assert_eq!(after(&alloc, "S2"), 0.0);
    }

    #[test]
    fn test_deficit_exceeds_surplus_is_proportional() {
        let alloc = PoolAllocator::new().allocate(&[
            MemberBalance::new("A", 300.0),
            MemberBalance::new("B", -400.0),
            MemberBalance::new("C", -200.0),
        ]);
        assert_eq!(alloc.summary.transfer_ratio, 1.0);
        assert_eq!(after(&alloc, "A"), 0.0);
        assert!((after(&alloc, "B") - (-200.0)).abs() < 1e-9);
        assert!((after(&alloc, "C") - (-100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_no_deficit_means_no_transfer() {
        let alloc = PoolAllocator::new().allocate(&[
            MemberBalance::new("A", 10.0),
            MemberBalance::new("B", 0.0),
        ]);
        assert!(!alloc.summary.transfer_applied);
        assert_eq!(after(&alloc, "A"), 10.0);
        assert_eq!(after(&alloc, "B"), 0.0);
    }

    #[test]
    fn test_all_deficit_skips_transfer() {
        let alloc = PoolAllocator::new().allocate(&[
            MemberBalance::new("A", -10.0),
            MemberBalance::new("B", -30.0),
            MemberBalance::new("Z", 0.0),
        ]);
        assert!(!alloc.summary.transfer_applied);
        assert_eq!(alloc.summary.total_surplus, 0.0);
        assert_eq!(alloc.summary.total_deficit, 40.0);
        assert_eq!(after(&alloc, "A"), -10.0);
        assert_eq!(after(&alloc, "B"), -30.0);
        // 降序: Z(0) > A(-10) > B(-30)
        let order: Vec<&str> = alloc.members.iter().map(|m| m.ship_id.as_str()).collect();
        assert_eq!(order, vec!["Z", "A", "B"]);
    }

    #[test]
    fn test_stable_sort_on_ties() {
        let alloc = PoolAllocator::new().allocate(&[
            MemberBalance::new("first", 5.0),
            MemberBalance::new("second", 5.0),
            MemberBalance::new("third", -1.0),
        ]);
        assert_eq!(alloc.members[0].ship_id, "first");
        assert_eq!(alloc.members[1].ship_id, "second");
    }

    proptest! {
        #[test]
        fn prop_conservation(balances in proptest::collection::vec(-1e9f64..1e9, 2..10)) {
            let members: Vec<MemberBalance> = balances
                .iter()
                .enumerate()
                .map(|(i, b)| MemberBalance::new(&format!("S{}", i), *b))
                .collect();
            let alloc = PoolAllocator::new().allocate(&members);

            let before: f64 = balances.iter().sum();
            let after: f64 = alloc.members.iter().map(|m| m.cb_after).sum();
            let scale: f64 = balances.iter().map(|b| b.abs()).sum::<f64>().max(1.0);
            prop_assert!((before - after).abs() <= 1e-6 * scale);
            prop_assert_eq!(alloc.members.len(), members.len());
        }

        #[test]
        fn prop_deficits_never_overshoot(balances in proptest::collection::vec(-1e6f64..1e6, 2..10)) {
            let members: Vec<MemberBalance> = balances
                .iter()
                .enumerate()
                .map(|(i, b)| MemberBalance::new(&format!("S{}", i), *b))
                .collect();
            let alloc = PoolAllocator::new().allocate(&members);
            for m in &alloc.members {
                if m.cb_before < 0.0 {
                    prop_assert!(m.cb_after <= 1e-6);
                    prop_assert!(m.cb_after >= m.cb_before);
                }
                if m.cb_before > 0.0 {
                    prop_assert!(m.cb_after >= -1e-6);
                }
            }
        }
    }
}
