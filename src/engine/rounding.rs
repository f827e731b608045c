// ==========================================
// FuelEU 合规系统 - 展示层取整
// ==========================================
// 红线: 仅在输出边界取整，台账内部运算保持原值
// ==========================================

/// 余额取整到最近整数
pub fn round_balance(value: f64) -> f64 {
    value.round()
}

/// 强度保留两位小数
pub fn round_intensity(value: f64) -> f64 {
    round_to(value, 2)
}

/// 保留 `decimals` 位小数
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_balance() {
        assert_eq!(round_balance(274_043_999.6), 274_044_000.0);
        assert_eq!(round_balance(-236_071_440.4), -236_071_440.0);
    }

    #[test]
    fn test_round_intensity() {
        assert_eq!(round_intensity(89.3368), 89.34);
        assert_eq!(round_intensity(-3.2967), -3.3);
        assert_eq!(round_to(1.23456, 3), 1.235);
    }
}
