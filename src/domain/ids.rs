// ==========================================
// FuelEU 合规系统 - 标识生成
// ==========================================
// 新记录的唯一标识由边界注入，测试中可替换为确定性实现
// ==========================================

use std::sync::atomic::{AtomicU64, Ordering};

/// 唯一标识生成能力
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// 默认实现: uuid v4
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// 顺序标识（前缀 + 递增序号）
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{:04}", self.prefix, n)
    }
}
